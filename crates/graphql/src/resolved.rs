//! Values produced by resolvers before result completion.

use {
    async_graphql_value::ConstValue,
    quill_store::{MemberTier, Post, Profile, User},
};

use crate::types::{MEMBER_TIER, POST, PROFILE, USER};

/// A store record standing in for an object-typed field.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    User(User),
    Post(Post),
    Profile(Profile),
    MemberTier(MemberTier),
}

impl Entity {
    /// The object type this record completes as.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::User(_) => USER,
            Self::Post(_) => POST,
            Self::Profile(_) => PROFILE,
            Self::MemberTier(_) => MEMBER_TIER,
        }
    }

    #[must_use]
    pub fn as_user(&self) -> Option<&User> {
        match self {
            Self::User(user) => Some(user),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_post(&self) -> Option<&Post> {
        match self {
            Self::Post(post) => Some(post),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_profile(&self) -> Option<&Profile> {
        match self {
            Self::Profile(profile) => Some(profile),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_member_tier(&self) -> Option<&MemberTier> {
        match self {
            Self::MemberTier(tier) => Some(tier),
            _ => None,
        }
    }
}

impl From<User> for Entity {
    fn from(user: User) -> Self {
        Self::User(user)
    }
}

impl From<Post> for Entity {
    fn from(post: Post) -> Self {
        Self::Post(post)
    }
}

impl From<Profile> for Entity {
    fn from(profile: Profile) -> Self {
        Self::Profile(profile)
    }
}

impl From<MemberTier> for Entity {
    fn from(tier: MemberTier) -> Self {
        Self::MemberTier(tier)
    }
}

/// Raw resolver output, completed against the field's declared type.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    Null,
    Leaf(ConstValue),
    Object(Entity),
    List(Vec<Resolved>),
}

impl Resolved {
    /// A `String` leaf, as returned by the delete and unsubscribe mutations.
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::Leaf(ConstValue::String(value.into()))
    }

    #[must_use]
    pub fn object(entity: impl Into<Entity>) -> Self {
        Self::Object(entity.into())
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null | Self::Leaf(ConstValue::Null))
    }

    #[must_use]
    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            Self::Object(entity) => Some(entity),
            _ => None,
        }
    }
}

impl<T: Into<Entity>> From<Option<T>> for Resolved {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Self::object)
    }
}

impl<T: Into<Entity>> From<Vec<T>> for Resolved {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Self::object).collect())
    }
}
