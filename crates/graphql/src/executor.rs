//! Resolver dispatch: walks the selection set of a validated operation,
//! invokes the resolver registered for each `(type, field)` pair and
//! completes the results against their declared types.
//!
//! Errors are field-scoped. A failing field is recorded and becomes `null`.
//! When the field is non-null, the `null` moves up to the nearest nullable
//! ancestor.

use std::{collections::HashSet, future::Future, sync::Mutex};

use {
    async_graphql_parser::{
        Pos, Positioned,
        types::{
            Directive, ExecutableDocument, Field, OperationDefinition, OperationType, Selection,
            SelectionSet,
        },
    },
    async_graphql_value::{ConstValue, Name, Value},
    futures::{
        FutureExt,
        future::{BoxFuture, join_all},
    },
    indexmap::IndexMap,
    quill_store::DataStore,
    tracing::trace,
};

use crate::{
    coerce::{self, Variables},
    context::ResolverContext,
    error::{ExecutionError, GraphQlError, PathSegment},
    registry::{FieldResolver, MetaType, ObjectType, Registry, TypeRef},
    resolved::Resolved,
    types::read_property,
};

/// A `null` reached a non-null position. The error is already recorded; the
/// enclosing nullable position turns this into `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NullPropagation;

type Completion = Result<ConstValue, NullPropagation>;

/// Fields of one object grouped by response key, in selection order.
type FieldGroups<'d> = IndexMap<&'d str, Vec<&'d Positioned<Field>>>;

/// What completion needs to know about the field being completed.
struct FieldInfo<'d> {
    parent_type: &'static str,
    name: &'d str,
    pos: Pos,
    /// Sub-selections of every merged occurrence of the field.
    selection_sets: Vec<&'d SelectionSet>,
}

fn child_path(path: &[PathSegment], segment: PathSegment) -> Vec<PathSegment> {
    let mut child = Vec::with_capacity(path.len() + 1);
    child.extend_from_slice(path);
    child.push(segment);
    child
}

/// Executes one operation of a validated document.
pub struct Executor<'a> {
    registry: &'a Registry,
    document: &'a ExecutableDocument,
    variables: &'a Variables,
    store: &'a dyn DataStore,
    concurrent: bool,
    errors: Mutex<Vec<GraphQlError>>,
}

impl<'a> Executor<'a> {
    #[must_use]
    pub fn new(
        registry: &'a Registry,
        document: &'a ExecutableDocument,
        variables: &'a Variables,
        store: &'a dyn DataStore,
    ) -> Self {
        Self {
            registry,
            document,
            variables,
            store,
            concurrent: true,
            errors: Mutex::new(Vec::new()),
        }
    }

    /// Whether sibling fields and list items resolve concurrently. Mutation
    /// root fields always run in order.
    #[must_use]
    pub fn concurrent(mut self, concurrent: bool) -> Self {
        self.concurrent = concurrent;
        self
    }

    /// Run the operation. `data` is `None` only when a non-null root field
    /// propagated `null` all the way up.
    pub async fn execute(
        self,
        operation: &'a OperationDefinition,
    ) -> (Option<ConstValue>, Vec<GraphQlError>) {
        let root = match operation.ty {
            OperationType::Query => self.registry.query_root(),
            OperationType::Mutation => self.registry.mutation_root(),
            OperationType::Subscription => None,
        };
        let Some(root) = root else {
            let error =
                ExecutionError::validation("Operation type is not supported by the schema.");
            return (None, vec![error.into_graphql()]);
        };

        let serial = operation.ty == OperationType::Mutation;
        let parent = Resolved::Null;
        let data = self
            .execute_selection_set(
                root,
                &parent,
                vec![&operation.selection_set.node],
                Vec::new(),
                serial,
            )
            .await;
        let errors = self.errors.into_inner().unwrap_or_else(|e| e.into_inner());
        (data.ok(), errors)
    }

    fn record(&self, error: GraphQlError) {
        self.errors
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(error);
    }

    /// Await `futures` all at once, or one after another.
    async fn drive<F: Future>(&self, futures: impl IntoIterator<Item = F>) -> Vec<F::Output> {
        if self.concurrent {
            join_all(futures).await
        } else {
            let mut outputs = Vec::new();
            for future in futures {
                outputs.push(future.await);
            }
            outputs
        }
    }

    // ── Field collection ────────────────────────────────────────────────────

    fn collect_fields(
        &self,
        object: &ObjectType,
        selection_set: &'a SelectionSet,
        groups: &mut FieldGroups<'a>,
        visited: &mut HashSet<&'a str>,
    ) {
        for selection in &selection_set.items {
            match &selection.node {
                Selection::Field(field) => {
                    if !self.should_include(&field.node.directives) {
                        continue;
                    }
                    let key = field.node.alias.as_ref().unwrap_or(&field.node.name);
                    groups.entry(key.node.as_str()).or_default().push(field);
                },
                Selection::FragmentSpread(spread) => {
                    if !self.should_include(&spread.node.directives) {
                        continue;
                    }
                    let name = spread.node.fragment_name.node.as_str();
                    if !visited.insert(name) {
                        continue;
                    }
                    let Some(fragment) = self.document.fragments.get(name) else {
                        continue;
                    };
                    if fragment.node.type_condition.node.on.node.as_str() != object.name {
                        continue;
                    }
                    self.collect_fields(object, &fragment.node.selection_set.node, groups, visited);
                },
                Selection::InlineFragment(inline) => {
                    if !self.should_include(&inline.node.directives) {
                        continue;
                    }
                    if let Some(condition) = &inline.node.type_condition
                        && condition.node.on.node.as_str() != object.name
                    {
                        continue;
                    }
                    self.collect_fields(object, &inline.node.selection_set.node, groups, visited);
                },
            }
        }
    }

    /// Evaluate `@skip(if:)` and `@include(if:)`.
    fn should_include(&self, directives: &[Positioned<Directive>]) -> bool {
        directives.iter().all(|directive| {
            let condition = directive
                .node
                .get_argument("if")
                .map(|value| self.condition(&value.node));
            match directive.node.name.node.as_str() {
                "skip" => condition != Some(true),
                "include" => condition != Some(false),
                _ => true,
            }
        })
    }

    fn condition(&self, value: &Value) -> bool {
        match value {
            Value::Boolean(b) => *b,
            Value::Variable(name) => {
                matches!(self.variables.get(name.as_str()), Some(ConstValue::Boolean(true)))
            },
            _ => false,
        }
    }

    // ── Execution ───────────────────────────────────────────────────────────

    fn execute_selection_set<'b>(
        &'b self,
        object: &'b ObjectType,
        parent: &'b Resolved,
        selection_sets: Vec<&'a SelectionSet>,
        path: Vec<PathSegment>,
        serial: bool,
    ) -> BoxFuture<'b, Completion> {
        async move {
            let mut groups = FieldGroups::new();
            let mut visited = HashSet::new();
            for selection_set in selection_sets {
                self.collect_fields(object, selection_set, &mut groups, &mut visited);
            }

            let mut output = IndexMap::with_capacity(groups.len());
            if serial {
                // Later mutations do not run once a non-null one has failed.
                for (key, fields) in &groups {
                    let path = child_path(&path, PathSegment::Field((*key).to_string()));
                    let value = self.execute_field(object, parent, fields, path).await?;
                    output.insert(Name::new(key), value);
                }
            } else {
                let futures: Vec<_> = groups
                    .iter()
                    .map(|(key, fields)| {
                        let path = child_path(&path, PathSegment::Field((*key).to_string()));
                        self.execute_field(object, parent, fields, path)
                    })
                    .collect();
                let values = self.drive(futures).await;
                for ((key, _), value) in groups.iter().zip(values) {
                    output.insert(Name::new(key), value?);
                }
            }
            Ok(ConstValue::Object(output))
        }
        .boxed()
    }

    fn execute_field<'b>(
        &'b self,
        object: &'b ObjectType,
        parent: &'b Resolved,
        fields: &'b [&'a Positioned<Field>],
        path: Vec<PathSegment>,
    ) -> BoxFuture<'b, Completion> {
        async move {
            let Some(&field) = fields.first() else {
                return Ok(ConstValue::Null);
            };
            let name = field.node.name.node.as_str();
            if name == "__typename" {
                return Ok(ConstValue::String(object.name.to_string()));
            }
            let Some(def) = object.get(name) else {
                let error = ExecutionError::validation(format!(
                    "Cannot query field \"{name}\" on type \"{}\".",
                    object.name
                ));
                self.record(error.at(field.pos).with_path(path));
                return Ok(ConstValue::Null);
            };

            let resolved = match coerce::coerce_arguments(
                self.registry,
                &def.args,
                &field.node.arguments,
                self.variables,
            ) {
                Ok(args) => match def.resolver {
                    FieldResolver::Property(read) => {
                        read_property(object.name, name, read, parent).map(Resolved::Leaf)
                    },
                    FieldResolver::Resolver(resolve) => {
                        trace!(type_name = object.name, field = name, "resolving");
                        resolve(ResolverContext {
                            parent,
                            args: &args,
                            store: self.store,
                        })
                        .await
                    },
                },
                Err(err) => Err(err),
            };
            let resolved = match resolved {
                Ok(resolved) => resolved,
                Err(err) => {
                    self.record(err.at(field.pos).with_path(path));
                    return if def.ty.is_non_null() {
                        Err(NullPropagation)
                    } else {
                        Ok(ConstValue::Null)
                    };
                },
            };

            let info = FieldInfo {
                parent_type: object.name,
                name,
                pos: field.pos,
                selection_sets: fields
                    .iter()
                    .map(|&field| &field.node.selection_set.node)
                    .collect(),
            };
            self.complete_value(&def.ty, &info, resolved, path).await
        }
        .boxed()
    }

    // ── Completion ──────────────────────────────────────────────────────────

    fn complete_value<'b>(
        &'b self,
        ty: &'b TypeRef,
        info: &'b FieldInfo<'a>,
        resolved: Resolved,
        path: Vec<PathSegment>,
    ) -> BoxFuture<'b, Completion> {
        async move {
            let TypeRef::NonNull(inner) = ty else {
                // Nullable position: a propagated null stops here.
                return Ok(self
                    .complete_nullable(ty, info, resolved, path)
                    .await
                    .unwrap_or(ConstValue::Null));
            };
            let value = self.complete_nullable(inner, info, resolved, path.clone()).await?;
            if value == ConstValue::Null {
                let error = ExecutionError::NullabilityViolation {
                    type_name: info.parent_type,
                    field: info.name.to_string(),
                };
                self.record(error.at(info.pos).with_path(path));
                return Err(NullPropagation);
            }
            Ok(value)
        }
        .boxed()
    }

    /// Complete against a type that is not itself `NonNull`.
    fn complete_nullable<'b>(
        &'b self,
        ty: &'b TypeRef,
        info: &'b FieldInfo<'a>,
        resolved: Resolved,
        path: Vec<PathSegment>,
    ) -> BoxFuture<'b, Completion> {
        async move {
            if resolved.is_null() {
                return Ok(ConstValue::Null);
            }
            match (ty, resolved) {
                (TypeRef::NonNull(_), resolved) => {
                    self.complete_value(ty, info, resolved, path).await
                },
                (TypeRef::List(item), Resolved::List(items)) => {
                    let futures: Vec<_> = items
                        .into_iter()
                        .enumerate()
                        .map(|(index, item_value)| {
                            let path = child_path(&path, PathSegment::Index(index));
                            self.complete_value(item, info, item_value, path)
                        })
                        .collect();
                    self.drive(futures)
                        .await
                        .into_iter()
                        .collect::<Result<Vec<_>, _>>()
                        .map(ConstValue::List)
                },
                (TypeRef::List(_), _) => {
                    self.internal(info, &path, format!("expected a list for {ty}"));
                    Err(NullPropagation)
                },
                (TypeRef::Named(name), resolved) => {
                    self.complete_named(name, info, resolved, path).await
                },
            }
        }
        .boxed()
    }

    async fn complete_named(
        &self,
        type_name: &str,
        info: &FieldInfo<'a>,
        resolved: Resolved,
        path: Vec<PathSegment>,
    ) -> Completion {
        match (self.registry.get(type_name), resolved) {
            (Some(MetaType::Scalar(kind)), Resolved::Leaf(value)) => {
                kind.serialize(value).map_err(|err| {
                    self.record(ExecutionError::from(err).at(info.pos).with_path(path));
                    NullPropagation
                })
            },
            (Some(MetaType::Enum(ty)), Resolved::Leaf(value)) => match &value {
                ConstValue::Enum(v) if ty.contains(v.as_str()) => Ok(value),
                ConstValue::String(v) if ty.contains(v) => Ok(ConstValue::Enum(Name::new(v))),
                other => {
                    self.internal(info, &path, format!("{other} is not a {} value", ty.name));
                    Err(NullPropagation)
                },
            },
            (Some(MetaType::Object(object)), Resolved::Object(entity)) => {
                if entity.type_name() != object.name {
                    self.internal(
                        info,
                        &path,
                        format!("expected {}, resolved {}", object.name, entity.type_name()),
                    );
                    return Err(NullPropagation);
                }
                let parent = Resolved::Object(entity);
                self.execute_selection_set(
                    object,
                    &parent,
                    info.selection_sets.clone(),
                    path,
                    false,
                )
                .await
            },
            (_, other) => {
                self.internal(info, &path, format!("cannot complete {other:?} as {type_name}"));
                Err(NullPropagation)
            },
        }
    }

    fn internal(&self, info: &FieldInfo<'_>, path: &[PathSegment], message: String) {
        let error = ExecutionError::internal(format!(
            "{}.{}: {message}",
            info.parent_type, info.name
        ));
        self.record(error.at(info.pos).with_path(path.to_vec()));
    }
}
