//! The process-wide registry.

use std::sync::LazyLock;

use crate::{
    mutations::{MUTATION, mutation_root},
    queries::{QUERY, query_root},
    registry::{MetaType, Registry},
    types,
};

static SCHEMA: LazyLock<Registry> = LazyLock::new(build_registry);

/// The registry every engine shares. Built on first use.
pub fn schema() -> &'static Registry {
    &SCHEMA
}

/// Build a fresh registry: scalars, entity types, inputs and both roots.
#[must_use]
pub fn build_registry() -> Registry {
    let mut registry = Registry::new(QUERY, Some(MUTATION));
    types::register(&mut registry);
    registry.register(MetaType::Object(query_root()));
    registry.register(MetaType::Object(mutation_root()));
    registry
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn every_field_type_is_registered() {
        let registry = schema();
        for ty in registry.types() {
            let MetaType::Object(object) = ty else {
                continue;
            };
            for field in object.fields.values() {
                assert!(
                    registry.get(field.ty.type_name()).is_some(),
                    "{}.{} has unknown type {}",
                    object.name,
                    field.name,
                    field.ty
                );
                for arg in field.args.values() {
                    assert!(registry.get(arg.ty.type_name()).is_some_and(MetaType::is_input));
                }
            }
        }
    }

    #[test]
    fn roots_are_wired() {
        let registry = schema();
        assert_eq!(registry.query_root().unwrap().name, "Query");
        assert_eq!(registry.mutation_root().unwrap().name, "Mutation");
        assert!(registry.field("Query", "memberTiers").is_some());
        assert!(registry.field("Mutation", "unsubscribeFrom").is_some());
        assert!(registry.field("Query", "subscribeTo").is_none());
    }

    #[test]
    fn input_fields_are_input_types() {
        let registry = schema();
        for ty in registry.types() {
            if let MetaType::InputObject(input) = ty {
                for field in input.fields.values() {
                    assert!(registry.get(field.ty.type_name()).is_some_and(MetaType::is_input));
                }
            }
        }
    }
}
