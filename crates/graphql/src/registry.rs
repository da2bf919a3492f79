//! Type registry: the closed set of named types a schema exposes.
//!
//! Object fields carry their resolver, so `(type name, field name)` lookups
//! through [`Registry::field`] are the single dispatch table the executor
//! uses. The registry is built once and never mutated afterwards.

use std::fmt;

use {
    async_graphql_parser::types::{BaseType, Type},
    async_graphql_value::ConstValue,
    futures::future::BoxFuture,
    indexmap::IndexMap,
};

use crate::{
    context::ResolverContext,
    error::Result,
    resolved::{Entity, Resolved},
    scalars::ScalarKind,
};

/// Reads a field straight off the parent's resolved value.
///
/// Returns `None` when the parent is not the entity the field belongs to.
pub type PropertyFn = fn(&Entity) -> Option<ConstValue>;

/// Computes a field from its parent, arguments and the request context.
pub type ResolverFn = for<'a> fn(ResolverContext<'a>) -> BoxFuture<'a, Result<Resolved>>;

// ── Type references ─────────────────────────────────────────────────────────

/// A possibly wrapped reference to a named type.
///
/// List and element nullability are declared independently, so `[Post!]!`
/// is `NonNull(List(NonNull(Named("Post"))))`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Named(&'static str),
    List(Box<TypeRef>),
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    /// `T`
    #[must_use]
    pub fn named(name: &'static str) -> Self {
        Self::Named(name)
    }

    /// `T!`
    #[must_use]
    pub fn named_nn(name: &'static str) -> Self {
        Self::NonNull(Box::new(Self::Named(name)))
    }

    /// `[T!]`
    #[must_use]
    pub fn named_nn_list(name: &'static str) -> Self {
        Self::List(Box::new(Self::named_nn(name)))
    }

    /// `[T!]!`
    #[must_use]
    pub fn named_nn_list_nn(name: &'static str) -> Self {
        Self::NonNull(Box::new(Self::named_nn_list(name)))
    }

    #[must_use]
    pub fn is_non_null(&self) -> bool {
        matches!(self, Self::NonNull(_))
    }

    /// Name of the innermost named type.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Named(name) => *name,
            Self::List(inner) | Self::NonNull(inner) => inner.type_name(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::List(inner) => write!(f, "[{inner}]"),
            Self::NonNull(inner) => write!(f, "{inner}!"),
        }
    }
}

// ── Definitions ─────────────────────────────────────────────────────────────

/// An argument or input object field.
#[derive(Debug, Clone)]
pub struct InputValueDef {
    pub name: &'static str,
    pub ty: TypeRef,
    pub description: Option<&'static str>,
}

impl InputValueDef {
    #[must_use]
    pub fn new(name: &'static str, ty: TypeRef) -> Self {
        Self {
            name,
            ty,
            description: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }
}

#[derive(Clone, Copy)]
pub enum FieldResolver {
    Property(PropertyFn),
    Resolver(ResolverFn),
}

impl fmt::Debug for FieldResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Property(_) => f.write_str("Property"),
            Self::Resolver(_) => f.write_str("Resolver"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: &'static str,
    pub ty: TypeRef,
    pub args: IndexMap<&'static str, InputValueDef>,
    pub resolver: FieldResolver,
    pub description: Option<&'static str>,
}

impl FieldDef {
    /// A field read off the parent value.
    #[must_use]
    pub fn property(name: &'static str, ty: TypeRef, read: PropertyFn) -> Self {
        Self::with_resolver(name, ty, FieldResolver::Property(read))
    }

    /// A field computed by an async resolver.
    #[must_use]
    pub fn resolve(name: &'static str, ty: TypeRef, resolve: ResolverFn) -> Self {
        Self::with_resolver(name, ty, FieldResolver::Resolver(resolve))
    }

    fn with_resolver(name: &'static str, ty: TypeRef, resolver: FieldResolver) -> Self {
        Self {
            name,
            ty,
            args: IndexMap::new(),
            resolver,
            description: None,
        }
    }

    #[must_use]
    pub fn argument(mut self, arg: InputValueDef) -> Self {
        self.args.insert(arg.name, arg);
        self
    }

    #[must_use]
    pub fn description(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }
}

#[derive(Debug, Clone)]
pub struct ObjectType {
    pub name: &'static str,
    pub description: Option<&'static str>,
    pub fields: IndexMap<&'static str, FieldDef>,
}

impl ObjectType {
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            description: None,
            fields: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn description(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    #[must_use]
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.insert(field.name, field);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldDef> {
        self.fields.get(name)
    }
}

#[derive(Debug, Clone)]
pub struct EnumType {
    pub name: &'static str,
    pub description: Option<&'static str>,
    pub values: Vec<&'static str>,
}

impl EnumType {
    #[must_use]
    pub fn new(name: &'static str, values: impl IntoIterator<Item = &'static str>) -> Self {
        Self {
            name,
            description: None,
            values: values.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn description(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        self.values.iter().any(|known| *known == value)
    }
}

#[derive(Debug, Clone)]
pub struct InputObjectType {
    pub name: &'static str,
    pub description: Option<&'static str>,
    pub fields: IndexMap<&'static str, InputValueDef>,
}

impl InputObjectType {
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            description: None,
            fields: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn description(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    #[must_use]
    pub fn field(mut self, field: InputValueDef) -> Self {
        self.fields.insert(field.name, field);
        self
    }
}

#[derive(Debug, Clone)]
pub enum MetaType {
    Scalar(ScalarKind),
    Enum(EnumType),
    Object(ObjectType),
    InputObject(InputObjectType),
}

impl MetaType {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Scalar(kind) => kind.name(),
            Self::Enum(ty) => ty.name,
            Self::Object(ty) => ty.name,
            Self::InputObject(ty) => ty.name,
        }
    }

    /// Scalars and enums: types with no sub-selection.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Scalar(_) | Self::Enum(_))
    }

    /// Types allowed for arguments and variables.
    #[must_use]
    pub fn is_input(&self) -> bool {
        !matches!(self, Self::Object(_))
    }
}

// ── Registry ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Registry {
    types: IndexMap<&'static str, MetaType>,
    query_type: &'static str,
    mutation_type: Option<&'static str>,
}

impl Registry {
    #[must_use]
    pub fn new(query_type: &'static str, mutation_type: Option<&'static str>) -> Self {
        Self {
            types: IndexMap::new(),
            query_type,
            mutation_type,
        }
    }

    /// Add a type. A later registration under the same name replaces the
    /// earlier one.
    pub fn register(&mut self, ty: MetaType) {
        self.types.insert(ty.name(), ty);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&MetaType> {
        self.types.get(name)
    }

    pub fn types(&self) -> impl Iterator<Item = &MetaType> {
        self.types.values()
    }

    #[must_use]
    pub fn object(&self, name: &str) -> Option<&ObjectType> {
        match self.get(name) {
            Some(MetaType::Object(object)) => Some(object),
            _ => None,
        }
    }

    #[must_use]
    pub fn input_object(&self, name: &str) -> Option<&InputObjectType> {
        match self.get(name) {
            Some(MetaType::InputObject(input)) => Some(input),
            _ => None,
        }
    }

    #[must_use]
    pub fn enum_type(&self, name: &str) -> Option<&EnumType> {
        match self.get(name) {
            Some(MetaType::Enum(ty)) => Some(ty),
            _ => None,
        }
    }

    /// Whether `name` is a registered scalar or enum.
    #[must_use]
    pub fn is_leaf(&self, name: &str) -> bool {
        self.get(name).is_some_and(MetaType::is_leaf)
    }

    /// The field dispatch table.
    #[must_use]
    pub fn field(&self, type_name: &str, field_name: &str) -> Option<&FieldDef> {
        self.object(type_name)?.get(field_name)
    }

    #[must_use]
    pub fn query_type(&self) -> &'static str {
        self.query_type
    }

    #[must_use]
    pub fn mutation_type(&self) -> Option<&'static str> {
        self.mutation_type
    }

    #[must_use]
    pub fn query_root(&self) -> Option<&ObjectType> {
        self.object(self.query_type)
    }

    #[must_use]
    pub fn mutation_root(&self) -> Option<&ObjectType> {
        self.object(self.mutation_type?)
    }

    /// Resolve a type written in a document (e.g. a variable declaration)
    /// against the registered names.
    #[must_use]
    pub fn resolve_ast_type(&self, ty: &Type) -> Option<TypeRef> {
        let inner = match &ty.base {
            BaseType::Named(name) => TypeRef::Named(*self.types.get_key_value(name.as_str())?.0),
            BaseType::List(item) => TypeRef::List(Box::new(self.resolve_ast_type(item)?)),
        };
        Some(if ty.nullable {
            inner
        } else {
            TypeRef::NonNull(Box::new(inner))
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use {super::*, async_graphql_value::Name};

    #[test]
    fn type_refs_print_like_sdl() {
        assert_eq!(TypeRef::named("User").to_string(), "User");
        assert_eq!(TypeRef::named_nn("UUID").to_string(), "UUID!");
        assert_eq!(TypeRef::named_nn_list("Post").to_string(), "[Post!]");
        assert_eq!(TypeRef::named_nn_list_nn("Post").to_string(), "[Post!]!");
        assert_eq!(TypeRef::named_nn_list_nn("Post").type_name(), "Post");
    }

    #[test]
    fn resolves_document_types_against_registered_names() {
        let mut registry = Registry::new("Query", None);
        registry.register(MetaType::Scalar(ScalarKind::Int));

        let ty = Type {
            base: BaseType::List(Box::new(Type {
                base: BaseType::Named(Name::new("Int")),
                nullable: false,
            })),
            nullable: true,
        };
        assert_eq!(
            registry.resolve_ast_type(&ty),
            Some(TypeRef::List(Box::new(TypeRef::named_nn("Int"))))
        );

        let unknown = Type {
            base: BaseType::Named(Name::new("Nope")),
            nullable: true,
        };
        assert_eq!(registry.resolve_ast_type(&unknown), None);
    }

    #[test]
    fn leaf_and_input_classification() {
        let scalar = MetaType::Scalar(ScalarKind::Uuid);
        let object = MetaType::Object(ObjectType::new("User"));
        let input = MetaType::InputObject(InputObjectType::new("CreateUserInput"));
        assert!(scalar.is_leaf() && scalar.is_input());
        assert!(!object.is_leaf() && !object.is_input());
        assert!(!input.is_leaf() && input.is_input());
    }
}
