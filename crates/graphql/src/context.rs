//! Per-field resolver context: parent value, coerced arguments and the store.

use {
    async_graphql_value::{ConstValue, Name},
    indexmap::IndexMap,
    quill_store::{DataStore, Profile, User},
    serde::de::DeserializeOwned,
};

use crate::{
    error::{ExecutionError, Result},
    resolved::Resolved,
};

/// Handed to every resolver call.
///
/// Carries only references. A resolver that needs data beyond its parent
/// asks the store for it.
#[derive(Clone, Copy)]
pub struct ResolverContext<'a> {
    pub parent: &'a Resolved,
    pub args: &'a Arguments,
    pub store: &'a dyn DataStore,
}

impl<'a> ResolverContext<'a> {
    /// The parent record of a `User` field.
    pub fn parent_user(&self) -> Result<&'a User> {
        self.parent
            .as_entity()
            .and_then(|entity| entity.as_user())
            .ok_or_else(|| unexpected_parent("User"))
    }

    /// The parent record of a `Profile` field.
    pub fn parent_profile(&self) -> Result<&'a Profile> {
        self.parent
            .as_entity()
            .and_then(|entity| entity.as_profile())
            .ok_or_else(|| unexpected_parent("Profile"))
    }

    /// Bind an argument to a typed value.
    pub fn arg<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        self.args.get(name)
    }
}

fn unexpected_parent(expected: &str) -> ExecutionError {
    ExecutionError::internal(format!("resolver expected a {expected} parent"))
}

/// Field arguments after coercion against their declared types.
///
/// Arguments that were not supplied and have no default are absent, so a
/// nullable argument binds to `None` either way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments(IndexMap<Name, ConstValue>);

impl Arguments {
    #[must_use]
    pub fn new(values: IndexMap<Name, ConstValue>) -> Self {
        Self(values)
    }

    /// Deserialize one argument into `T`. Coercion already checked the value,
    /// so a failure here means the resolver asked for the wrong shape.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let value = self.0.get(name).cloned().unwrap_or(ConstValue::Null);
        let json = value
            .into_json()
            .map_err(|e| ExecutionError::internal(format!("argument \"{name}\": {e}")))?;
        serde_json::from_value(json)
            .map_err(|e| ExecutionError::internal(format!("argument \"{name}\": {e}")))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use {
        super::*,
        quill_store::{MemberTierId, NewProfile, UserPatch},
    };

    fn args(pairs: &[(&str, ConstValue)]) -> Arguments {
        Arguments::new(
            pairs
                .iter()
                .map(|(name, value)| (Name::new(name), value.clone()))
                .collect(),
        )
    }

    #[test]
    fn binds_input_objects_to_store_dtos() {
        let mut dto = IndexMap::new();
        dto.insert(Name::new("userId"), ConstValue::String("u1".into()));
        dto.insert(Name::new("isMale"), ConstValue::Boolean(true));
        dto.insert(Name::new("yearOfBirth"), ConstValue::Number(1990.into()));
        dto.insert(
            Name::new("memberTierId"),
            ConstValue::Enum(Name::new("business")),
        );
        let args = args(&[("dto", ConstValue::Object(dto))]);

        let profile: NewProfile = args.get("dto").unwrap();
        assert_eq!(profile.user_id, "u1");
        assert_eq!(profile.member_tier_id, MemberTierId::Business);
        assert_eq!(profile.year_of_birth, 1990);
    }

    #[test]
    fn absent_arguments_bind_to_none() {
        let empty = args(&[]);
        let id: Option<String> = empty.get("id").unwrap();
        assert!(id.is_none());

        let patch: UserPatch = args(&[("dto", ConstValue::Object(IndexMap::new()))])
            .get("dto")
            .unwrap();
        assert!(patch.name.is_none());
    }

    #[test]
    fn wrong_shape_is_internal() {
        let args = args(&[("id", ConstValue::Boolean(true))]);
        let err = args.get::<String>("id").unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::Internal);
    }
}
