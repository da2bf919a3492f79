//! Static document validation against the registry.
//!
//! All rules run in a single pass and every violation is reported; a
//! document with any violation is not executed.

use std::collections::HashSet;

use {
    async_graphql_parser::{
        Pos, Positioned,
        types::{
            BaseType, Directive, DocumentOperations, ExecutableDocument, Field, FragmentDefinition,
            OperationDefinition, OperationType, Selection, SelectionSet, Type, VariableDefinition,
        },
    },
    async_graphql_value::{Name, Value},
    indexmap::IndexMap,
};

use crate::{
    error::{ExecutionError, GraphQlError},
    registry::{MetaType, ObjectType, Registry},
};

/// Operations of a document in source order, with their names.
pub(crate) fn operations(
    document: &ExecutableDocument,
) -> Vec<(Option<&Name>, &Positioned<OperationDefinition>)> {
    let mut operations: Vec<_> = match &document.operations {
        DocumentOperations::Single(operation) => vec![(None, operation)],
        DocumentOperations::Multiple(operations) => operations
            .iter()
            .map(|(name, operation)| (Some(name), operation))
            .collect(),
    };
    operations.sort_by_key(|(_, operation)| (operation.pos.line, operation.pos.column));
    operations
}

/// Pick the operation a request asks for.
pub fn select_operation<'d>(
    document: &'d ExecutableDocument,
    operation_name: Option<&str>,
) -> Result<(Option<&'d Name>, &'d Positioned<OperationDefinition>), ExecutionError> {
    match (&document.operations, operation_name) {
        (DocumentOperations::Single(operation), None) => Ok((None, operation)),
        (DocumentOperations::Multiple(operations), Some(name)) => operations
            .get_key_value(name)
            .map(|(name, operation)| (Some(name), operation))
            .ok_or_else(|| unknown_operation(name)),
        (DocumentOperations::Single(_), Some(name)) => Err(unknown_operation(name)),
        (DocumentOperations::Multiple(operations), None) => {
            let mut iter = operations.iter();
            match (iter.next(), iter.next()) {
                (Some((name, operation)), None) => Ok((Some(name), operation)),
                _ => Err(ExecutionError::validation(
                    "Must provide operation name if query contains multiple operations.",
                )),
            }
        },
    }
}

fn unknown_operation(name: &str) -> ExecutionError {
    ExecutionError::validation(format!("Unknown operation named \"{name}\"."))
}

/// Check every operation and fragment of the document.
#[must_use]
pub fn validate(registry: &Registry, document: &ExecutableDocument) -> Vec<GraphQlError> {
    let mut validator = Validator {
        registry,
        document,
        errors: Vec::new(),
    };
    for (name, operation) in operations(document) {
        validator.operation(name, operation);
    }
    let mut fragments: Vec<_> = document.fragments.iter().collect();
    fragments.sort_by_key(|(_, fragment)| (fragment.pos.line, fragment.pos.column));
    for (name, fragment) in fragments {
        validator.fragment(name, fragment);
    }
    validator.errors
}

struct Validator<'a> {
    registry: &'a Registry,
    document: &'a ExecutableDocument,
    errors: Vec<GraphQlError>,
}

impl<'a> Validator<'a> {
    fn report(&mut self, pos: Pos, message: String) {
        self.errors.push(ExecutionError::validation(message).at(pos));
    }

    // ── Operations ──────────────────────────────────────────────────────────

    fn operation(&mut self, name: Option<&Name>, operation: &'a Positioned<OperationDefinition>) {
        let definition = &operation.node;
        let root = match definition.ty {
            OperationType::Query => self.registry.query_root(),
            OperationType::Mutation => self.registry.mutation_root(),
            OperationType::Subscription => None,
        };
        let Some(root) = root else {
            let kind = match definition.ty {
                OperationType::Query => "query",
                OperationType::Mutation => "mutation",
                OperationType::Subscription => "subscription",
            };
            self.report(
                operation.pos,
                format!("Schema is not configured to execute {kind} operation."),
            );
            return;
        };

        for variable in &definition.variable_definitions {
            self.variable_definition(variable);
        }
        self.selection_set(root, &definition.selection_set.node);
        self.merged_fields(root, &[&definition.selection_set.node]);

        let defined: HashSet<&str> = definition
            .variable_definitions
            .iter()
            .map(|variable| variable.node.name.node.as_str())
            .collect();
        let mut used = Vec::new();
        let mut visited = HashSet::new();
        self.used_variables(&definition.selection_set.node, &mut used, &mut visited);
        let mut reported = HashSet::new();
        for (variable, pos) in used {
            if defined.contains(variable) || !reported.insert(variable) {
                continue;
            }
            let message = match name {
                Some(name) => {
                    format!("Variable \"${variable}\" is not defined by operation \"{name}\".")
                },
                None => format!("Variable \"${variable}\" is not defined."),
            };
            self.report(pos, message);
        }
    }

    fn variable_definition(&mut self, variable: &Positioned<VariableDefinition>) {
        let type_name = base_type_name(&variable.node.var_type.node);
        match self.registry.get(type_name) {
            None => self.report(variable.pos, format!("Unknown type \"{type_name}\".")),
            Some(ty) if !ty.is_input() => self.report(
                variable.pos,
                format!(
                    "Variable \"${}\" cannot be non-input type \"{type_name}\".",
                    variable.node.name.node
                ),
            ),
            Some(_) => {},
        }
    }

    // ── Fragments ───────────────────────────────────────────────────────────

    fn fragment(&mut self, name: &Name, fragment: &'a Positioned<FragmentDefinition>) {
        let condition = &fragment.node.type_condition;
        if let Some(object) = self.condition_type(condition.pos, condition.node.on.node.as_str()) {
            self.selection_set(object, &fragment.node.selection_set.node);
        }

        let mut visited = HashSet::new();
        if self.spreads_into(name.as_str(), &fragment.node.selection_set.node, &mut visited) {
            self.report(
                fragment.pos,
                format!("Cannot spread fragment \"{name}\" within itself."),
            );
        }
    }

    /// The object type a fragment condition names, reporting unknown and
    /// non-object types.
    fn condition_type(&mut self, pos: Pos, type_name: &str) -> Option<&'a ObjectType> {
        match self.registry.get(type_name) {
            Some(MetaType::Object(object)) => Some(object),
            Some(_) => {
                self.report(
                    pos,
                    format!("Fragment cannot condition on non composite type \"{type_name}\"."),
                );
                None
            },
            None => {
                self.report(pos, format!("Unknown type \"{type_name}\"."));
                None
            },
        }
    }

    /// Whether `target` is reachable through the spreads below `selection_set`.
    fn spreads_into(
        &self,
        target: &str,
        selection_set: &'a SelectionSet,
        visited: &mut HashSet<&'a str>,
    ) -> bool {
        selection_set.items.iter().any(|selection| match &selection.node {
            Selection::Field(field) => {
                self.spreads_into(target, &field.node.selection_set.node, visited)
            },
            Selection::InlineFragment(inline) => {
                self.spreads_into(target, &inline.node.selection_set.node, visited)
            },
            Selection::FragmentSpread(spread) => {
                let name = spread.node.fragment_name.node.as_str();
                if name == target {
                    return true;
                }
                if !visited.insert(name) {
                    return false;
                }
                self.document
                    .fragments
                    .get(name)
                    .is_some_and(|fragment| {
                        self.spreads_into(target, &fragment.node.selection_set.node, visited)
                    })
            },
        })
    }

    // ── Selections ──────────────────────────────────────────────────────────

    fn selection_set(&mut self, parent: &'a ObjectType, selection_set: &'a SelectionSet) {
        for selection in &selection_set.items {
            match &selection.node {
                Selection::Field(field) => self.field(parent, field),
                Selection::FragmentSpread(spread) => {
                    let name = &spread.node.fragment_name.node;
                    let Some(fragment) = self.document.fragments.get(name.as_str()) else {
                        self.report(spread.pos, format!("Unknown fragment \"{name}\"."));
                        continue;
                    };
                    let condition = fragment.node.type_condition.node.on.node.as_str();
                    if matches!(self.registry.get(condition), Some(MetaType::Object(_)))
                        && condition != parent.name
                    {
                        self.report(
                            spread.pos,
                            format!(
                                "Fragment \"{name}\" cannot be spread here as objects of type \
                                 \"{}\" can never be of type \"{condition}\".",
                                parent.name
                            ),
                        );
                    }
                },
                Selection::InlineFragment(inline) => {
                    let Some(condition) = &inline.node.type_condition else {
                        self.selection_set(parent, &inline.node.selection_set.node);
                        continue;
                    };
                    let Some(object) =
                        self.condition_type(condition.pos, condition.node.on.node.as_str())
                    else {
                        continue;
                    };
                    if object.name == parent.name {
                        self.selection_set(object, &inline.node.selection_set.node);
                    } else {
                        self.report(
                            inline.pos,
                            format!(
                                "Fragment cannot be spread here as objects of type \"{}\" can \
                                 never be of type \"{}\".",
                                parent.name, object.name
                            ),
                        );
                    }
                },
            }
        }
    }

    fn field(&mut self, parent: &'a ObjectType, field: &'a Positioned<Field>) {
        let name = field.node.name.node.as_str();
        let sub_selection = &field.node.selection_set.node;
        if name == "__typename" {
            if !sub_selection.items.is_empty() {
                self.report(
                    field.pos,
                    "Field \"__typename\" must not have a selection since type \"String!\" has \
                     no subfields."
                        .to_string(),
                );
            }
            return;
        }
        let Some(def) = parent.get(name) else {
            self.report(
                field.pos,
                format!("Cannot query field \"{name}\" on type \"{}\".", parent.name),
            );
            return;
        };

        for (arg, _) in &field.node.arguments {
            if !def.args.contains_key(arg.node.as_str()) {
                self.report(
                    arg.pos,
                    format!(
                        "Unknown argument \"{}\" on field \"{}.{name}\".",
                        arg.node, parent.name
                    ),
                );
            }
        }
        for (arg_name, arg) in &def.args {
            let provided = field
                .node
                .arguments
                .iter()
                .any(|(given, _)| given.node.as_str() == *arg_name);
            if arg.ty.is_non_null() && !provided {
                self.report(
                    field.pos,
                    format!(
                        "Field \"{name}\" argument \"{arg_name}\" of type \"{}\" is required, but \
                         it was not provided.",
                        arg.ty
                    ),
                );
            }
        }

        match self.registry.get(def.ty.type_name()) {
            Some(MetaType::Object(_)) if sub_selection.items.is_empty() => self.report(
                field.pos,
                format!(
                    "Field \"{name}\" of type \"{}\" must have a selection of subfields. Did you \
                     mean \"{name} {{ ... }}\"?",
                    def.ty
                ),
            ),
            Some(MetaType::Object(object)) => self.selection_set(object, sub_selection),
            _ if !sub_selection.items.is_empty() => self.report(
                field.pos,
                format!(
                    "Field \"{name}\" must not have a selection since type \"{}\" has no \
                     subfields.",
                    def.ty
                ),
            ),
            _ => {},
        }
    }

    // ── Overlapping fields ──────────────────────────────────────────────────

    /// Fields sharing a response key must name the same field with the same
    /// arguments, down through their merged sub-selections.
    fn merged_fields(&mut self, parent: &'a ObjectType, selection_sets: &[&'a SelectionSet]) {
        let mut groups: IndexMap<&'a str, Vec<&'a Positioned<Field>>> = IndexMap::new();
        let mut visited = HashSet::new();
        for selection_set in selection_sets {
            self.group_fields(parent, selection_set, &mut groups, &mut visited);
        }

        for (key, fields) in &groups {
            let Some((first, rest)) = fields.split_first() else {
                continue;
            };
            if let Some(other) = rest.iter().find(|field| !same_field(&first.node, &field.node)) {
                self.report(
                    other.pos,
                    format!(
                        "Fields \"{key}\" conflict because they differ in name or arguments. Use \
                         different aliases on the fields to fetch both if this was intentional."
                    ),
                );
                continue;
            }
            let child = self
                .registry
                .field(parent.name, first.node.name.node.as_str())
                .and_then(|def| self.registry.object(def.ty.type_name()));
            if let Some(child) = child {
                let sub_selections: Vec<&'a SelectionSet> =
                    fields.iter().map(|&field| &field.node.selection_set.node).collect();
                self.merged_fields(child, &sub_selections);
            }
        }
    }

    /// Fields of `selection_set` by response key, with fragments applying to
    /// `parent` flattened in.
    fn group_fields(
        &self,
        parent: &ObjectType,
        selection_set: &'a SelectionSet,
        groups: &mut IndexMap<&'a str, Vec<&'a Positioned<Field>>>,
        visited: &mut HashSet<&'a str>,
    ) {
        for selection in &selection_set.items {
            match &selection.node {
                Selection::Field(field) => {
                    let key = field.node.alias.as_ref().unwrap_or(&field.node.name);
                    groups.entry(key.node.as_str()).or_default().push(field);
                },
                Selection::FragmentSpread(spread) => {
                    let name = spread.node.fragment_name.node.as_str();
                    if !visited.insert(name) {
                        continue;
                    }
                    if let Some(fragment) = self.document.fragments.get(name)
                        && fragment.node.type_condition.node.on.node.as_str() == parent.name
                    {
                        let selection_set = &fragment.node.selection_set.node;
                        self.group_fields(parent, selection_set, groups, visited);
                    }
                },
                Selection::InlineFragment(inline) => {
                    let applies = inline
                        .node
                        .type_condition
                        .as_ref()
                        .is_none_or(|condition| condition.node.on.node.as_str() == parent.name);
                    if applies {
                        self.group_fields(parent, &inline.node.selection_set.node, groups, visited);
                    }
                },
            }
        }
    }

    // ── Variables ───────────────────────────────────────────────────────────

    /// Variables referenced below `selection_set`, following fragment spreads.
    fn used_variables(
        &self,
        selection_set: &'a SelectionSet,
        used: &mut Vec<(&'a str, Pos)>,
        visited: &mut HashSet<&'a str>,
    ) {
        for selection in &selection_set.items {
            match &selection.node {
                Selection::Field(field) => {
                    for (_, value) in &field.node.arguments {
                        value_variables(&value.node, value.pos, used);
                    }
                    directive_variables(&field.node.directives, used);
                    self.used_variables(&field.node.selection_set.node, used, visited);
                },
                Selection::FragmentSpread(spread) => {
                    directive_variables(&spread.node.directives, used);
                    let name = spread.node.fragment_name.node.as_str();
                    if !visited.insert(name) {
                        continue;
                    }
                    if let Some(fragment) = self.document.fragments.get(name) {
                        self.used_variables(&fragment.node.selection_set.node, used, visited);
                    }
                },
                Selection::InlineFragment(inline) => {
                    directive_variables(&inline.node.directives, used);
                    self.used_variables(&inline.node.selection_set.node, used, visited);
                },
            }
        }
    }
}

/// Same field name and the same arguments in any order.
fn same_field(a: &Field, b: &Field) -> bool {
    a.name.node == b.name.node
        && a.arguments.len() == b.arguments.len()
        && a.arguments.iter().all(|(name, value)| {
            b.arguments.iter().any(|(other, other_value)| {
                other.node == name.node && other_value.node == value.node
            })
        })
}

fn directive_variables<'a>(
    directives: &'a [Positioned<Directive>],
    used: &mut Vec<(&'a str, Pos)>,
) {
    for directive in directives {
        for (_, value) in &directive.node.arguments {
            value_variables(&value.node, value.pos, used);
        }
    }
}

fn value_variables<'a>(value: &'a Value, pos: Pos, used: &mut Vec<(&'a str, Pos)>) {
    match value {
        Value::Variable(name) => used.push((name.as_str(), pos)),
        Value::List(items) => {
            for item in items {
                value_variables(item, pos, used);
            }
        },
        Value::Object(fields) => {
            for item in fields.values() {
                value_variables(item, pos, used);
            }
        },
        _ => {},
    }
}

fn base_type_name(ty: &Type) -> &str {
    match &ty.base {
        BaseType::Named(name) => name.as_str(),
        BaseType::List(item) => base_type_name(item),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use {
        super::*,
        crate::{error::ErrorCode, schema::schema},
        async_graphql_parser::parse_query,
    };

    const ID: &str = "1b9d6bcd-bbfd-4b2d-9b5d-ab8dfbbd4bed";

    fn messages(query: &str) -> Vec<String> {
        let doc = parse_query(query).unwrap();
        let errors = validate(schema(), &doc);
        assert!(errors
            .iter()
            .all(|e| e.code() == ErrorCode::GraphqlValidationFailed));
        errors.into_iter().map(|e| e.message).collect()
    }

    #[test]
    fn accepts_valid_documents() {
        let query = format!(
            r#"
            query Q($id: UUID!, $skip: Boolean = false) {{
                user(id: $id) {{ ...U posts @skip(if: $skip) {{ id }} }}
                memberTier(id: basic) {{ discount }}
            }}
            fragment U on User {{ id name profile {{ memberTier {{ id }} }} }}
            mutation M {{ deletePost(id: "{ID}") }}
            "#
        );
        assert_eq!(messages(&query), Vec::<String>::new());
    }

    #[test]
    fn same_response_key_must_name_the_same_field() {
        assert_eq!(messages("{ x: users { id } x: users { name } }"), Vec::<String>::new());
        assert_eq!(
            messages(&format!(
                r#"{{ u: user(id: "{ID}") {{ id }} ...F }}
                fragment F on Query {{ u: user(id: "{ID}") {{ name }} }}"#
            )),
            Vec::<String>::new()
        );

        let conflict = "Fields \"x\" conflict because they differ in name or arguments. Use \
                        different aliases on the fields to fetch both if this was intentional.";
        assert_eq!(messages("{ x: users { id } x: posts { title } }"), vec![conflict]);
        assert_eq!(
            messages(r#"{ users { x: posts { id } ... on User { x: profile { id } } } }"#),
            vec![conflict]
        );
        assert_eq!(
            messages(&format!(
                r#"{{ x: user(id: "{ID}") {{ id }} x: user(id: "{MISSING}") {{ id }} }}"#,
                MISSING = "00000000-0000-4000-8000-000000000000"
            )),
            vec![conflict]
        );
        assert_eq!(
            messages("{ memberTiers { a: id } memberTiers { a: discount } }"),
            vec!["Fields \"a\" conflict because they differ in name or arguments. Use \
                  different aliases on the fields to fetch both if this was intentional."]
        );
    }

    #[test]
    fn reports_unknown_fields_and_arguments() {
        let errors = messages(r#"{ users { nope } user(id: "x", extra: 1) { id } }"#);
        assert!(errors.contains(&"Cannot query field \"nope\" on type \"User\".".to_string()));
        assert!(
            errors.contains(&"Unknown argument \"extra\" on field \"Query.user\".".to_string())
        );
    }

    #[test]
    fn reports_missing_required_argument() {
        let errors = messages("{ post { id } }");
        assert_eq!(
            errors,
            vec![
                "Field \"post\" argument \"id\" of type \"UUID!\" is required, but it was not \
                 provided."
            ]
        );
    }

    #[test]
    fn checks_sub_selections_against_leaf_types() {
        let errors = messages("{ users posts { id { x } } }");
        assert!(
            errors[0].starts_with("Field \"users\" of type \"[User!]!\" must have a selection")
        );
        assert!(errors[1].starts_with("Field \"id\" must not have a selection"));
    }

    #[test]
    fn reports_fragment_problems() {
        let errors = messages(
            r"
            { users { ...Missing ...P ... on Nope { id } } }
            fragment P on Post { id }
            fragment A on User { ...B }
            fragment B on User { ...A }
            ",
        );
        assert!(errors.contains(&"Unknown fragment \"Missing\".".to_string()));
        assert!(errors.iter().any(|e| e.starts_with("Fragment \"P\" cannot be spread here")));
        assert!(errors.contains(&"Unknown type \"Nope\".".to_string()));
        assert!(errors.contains(&"Cannot spread fragment \"A\" within itself.".to_string()));
    }

    #[test]
    fn reports_undefined_variables() {
        let errors = messages("query Q { user(id: $id) { id } }");
        assert_eq!(errors, vec!["Variable \"$id\" is not defined by operation \"Q\"."]);
    }

    #[test]
    fn subscriptions_have_no_root() {
        let errors = messages("subscription { users { id } }");
        assert_eq!(
            errors,
            vec!["Schema is not configured to execute subscription operation."]
        );
    }

    #[test]
    fn selects_operations_by_name() {
        let doc = parse_query("query A { users { id } } query B { posts { id } }").unwrap();
        let (name, _) = select_operation(&doc, Some("B")).unwrap();
        assert_eq!(name.map(Name::as_str), Some("B"));
        assert!(select_operation(&doc, None).is_err());
        assert!(select_operation(&doc, Some("C")).is_err());

        let single = parse_query("{ users { id } }").unwrap();
        assert!(select_operation(&single, None).unwrap().0.is_none());
    }
}
