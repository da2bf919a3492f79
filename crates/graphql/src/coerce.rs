//! Input coercion for variables and field arguments.
//!
//! Variables arrive as JSON and follow `parseValue` rules. Arguments are
//! literals written in the document, possibly referencing variables, and
//! follow `parseLiteral` rules. Both end up as [`ConstValue`]s shaped by the
//! declared input type.

use std::fmt;

use {
    async_graphql_parser::{
        Positioned,
        types::{BaseType, Type, VariableDefinition},
    },
    async_graphql_value::{ConstValue, Name, Value},
    indexmap::IndexMap,
    serde_json::{Map, Value as Json},
};

use crate::{
    context::Arguments,
    error::{ExecutionError, GraphQlError},
    registry::{InputObjectType, InputValueDef, MetaType, Registry, TypeRef},
    scalars::ScalarCoercionError,
};

/// Coerced variable values, keyed by name without the `$`.
pub type Variables = IndexMap<Name, ConstValue>;

// ── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputErrorKind {
    /// A scalar or enum rejected the value.
    Scalar(ScalarCoercionError),
    /// The value does not fit the declared shape.
    Invalid(String),
}

/// Why an input value was rejected, and where inside the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputError {
    pub kind: InputErrorKind,
    /// Input field names and `[index]` steps from the outermost value.
    pub path: Vec<String>,
}

impl InputError {
    fn invalid(message: impl Into<String>) -> Self {
        Self {
            kind: InputErrorKind::Invalid(message.into()),
            path: Vec::new(),
        }
    }

    /// Whether a scalar or enum codec raised this error.
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        matches!(self.kind, InputErrorKind::Scalar(_))
    }

    fn nested(mut self, segment: impl Into<String>) -> Self {
        self.path.insert(0, segment.into());
        self
    }
}

impl From<ScalarCoercionError> for InputError {
    fn from(err: ScalarCoercionError) -> Self {
        Self {
            kind: InputErrorKind::Scalar(err),
            path: Vec::new(),
        }
    }
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.path.is_empty() {
            write!(f, "at \"{}\": ", self.path.join("."))?;
        }
        match &self.kind {
            InputErrorKind::Scalar(err) => write!(f, "{err}"),
            InputErrorKind::Invalid(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for InputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            InputErrorKind::Scalar(err) => Some(err),
            InputErrorKind::Invalid(_) => None,
        }
    }
}

type InputResult<T> = Result<T, InputError>;

fn enum_error(name: &'static str, reason: impl Into<String>) -> InputError {
    ScalarCoercionError::new(name, reason).into()
}

fn unknown_type(name: &str) -> InputError {
    InputError::invalid(format!("\"{name}\" is not an input type"))
}

// ── JSON values (variables) ─────────────────────────────────────────────────

/// Coerce a JSON value against an input type.
pub fn from_json(registry: &Registry, ty: &TypeRef, value: &Json) -> InputResult<ConstValue> {
    match (ty, value) {
        (TypeRef::NonNull(_), Json::Null) => Err(InputError::invalid(format!(
            "expected non-nullable type \"{ty}\" not to be null"
        ))),
        (TypeRef::NonNull(inner), value) => from_json(registry, inner, value),
        (_, Json::Null) => Ok(ConstValue::Null),
        (TypeRef::List(item), Json::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, value)| {
                from_json(registry, item, value).map_err(|e| e.nested(format!("[{i}]")))
            })
            .collect::<InputResult<Vec<_>>>()
            .map(ConstValue::List),
        (TypeRef::List(item), value) => {
            from_json(registry, item, value).map(|value| ConstValue::List(vec![value]))
        },
        (TypeRef::Named(name), value) => match registry.get(name) {
            Some(MetaType::Scalar(kind)) => Ok(kind.parse_value(value)?),
            Some(MetaType::Enum(ty)) => match value {
                Json::String(s) if ty.contains(s) => Ok(ConstValue::Enum(Name::new(s))),
                Json::String(s) => Err(enum_error(ty.name, format!("value: \"{s}\""))),
                other => Err(enum_error(ty.name, format!("non-string value: {other}"))),
            },
            Some(MetaType::InputObject(input)) => match value {
                Json::Object(fields) => json_object(registry, input, fields),
                other => Err(InputError::invalid(format!(
                    "expected type \"{}\" to be an object, found {other}",
                    input.name
                ))),
            },
            _ => Err(unknown_type(name)),
        },
    }
}

fn json_object(
    registry: &Registry,
    input: &InputObjectType,
    fields: &Map<String, Json>,
) -> InputResult<ConstValue> {
    if let Some(unknown) = fields.keys().find(|key| !input.fields.contains_key(key.as_str())) {
        return Err(InputError::invalid(format!(
            "field \"{unknown}\" is not defined by type \"{}\"",
            input.name
        )));
    }
    let mut output = IndexMap::new();
    for (name, def) in &input.fields {
        match fields.get(*name) {
            Some(value) => {
                let value = from_json(registry, &def.ty, value).map_err(|e| e.nested(*name))?;
                output.insert(Name::new(name), value);
            },
            None => missing_field(input, def)?,
        }
    }
    Ok(ConstValue::Object(output))
}

fn missing_field(input: &InputObjectType, def: &InputValueDef) -> InputResult<()> {
    if def.ty.is_non_null() {
        Err(InputError::invalid(format!(
            "field \"{}.{}\" of required type \"{}\" was not provided",
            input.name, def.name, def.ty
        )))
    } else {
        Ok(())
    }
}

// ── Literals (arguments) ────────────────────────────────────────────────────

/// Coerce a document literal against an input type. Variable references are
/// replaced by their already coerced values and re-checked against `ty`.
pub fn from_literal(
    registry: &Registry,
    ty: &TypeRef,
    value: &Value,
    variables: &Variables,
) -> InputResult<ConstValue> {
    match (ty, value) {
        (_, Value::Variable(name)) => match variables.get(name.as_str()) {
            Some(value) => from_literal(registry, ty, &to_literal(value), variables),
            None if ty.is_non_null() => Err(InputError::invalid(format!(
                "variable \"${name}\" of required type \"{ty}\" was not provided"
            ))),
            None => Ok(ConstValue::Null),
        },
        (TypeRef::NonNull(_), Value::Null) => Err(InputError::invalid(format!(
            "expected non-nullable type \"{ty}\" not to be null"
        ))),
        (TypeRef::NonNull(inner), value) => from_literal(registry, inner, value, variables),
        (_, Value::Null) => Ok(ConstValue::Null),
        (TypeRef::List(item), Value::List(items)) => items
            .iter()
            .enumerate()
            .map(|(i, value)| {
                from_literal(registry, item, value, variables)
                    .map_err(|e| e.nested(format!("[{i}]")))
            })
            .collect::<InputResult<Vec<_>>>()
            .map(ConstValue::List),
        (TypeRef::List(item), value) => from_literal(registry, item, value, variables)
            .map(|value| ConstValue::List(vec![value])),
        (TypeRef::Named(name), value) => match registry.get(name) {
            Some(MetaType::Scalar(kind)) => Ok(kind.parse_literal(value)?),
            Some(MetaType::Enum(ty)) => match value {
                Value::Enum(v) if ty.contains(v.as_str()) => Ok(ConstValue::Enum(v.clone())),
                Value::Enum(v) => Err(enum_error(ty.name, format!("value: {v}"))),
                other => Err(enum_error(ty.name, format!("non-enum value: {other}"))),
            },
            Some(MetaType::InputObject(input)) => match value {
                Value::Object(fields) => literal_object(registry, input, fields, variables),
                other => Err(InputError::invalid(format!(
                    "expected type \"{}\" to be an object, found {other}",
                    input.name
                ))),
            },
            _ => Err(unknown_type(name)),
        },
    }
}

fn literal_object(
    registry: &Registry,
    input: &InputObjectType,
    fields: &IndexMap<Name, Value>,
    variables: &Variables,
) -> InputResult<ConstValue> {
    if let Some(unknown) = fields.keys().find(|key| !input.fields.contains_key(key.as_str())) {
        return Err(InputError::invalid(format!(
            "field \"{unknown}\" is not defined by type \"{}\"",
            input.name
        )));
    }
    let mut output = IndexMap::new();
    for (name, def) in &input.fields {
        let value = fields.get(*name).filter(|value| match value {
            // An unset variable counts as an absent field.
            Value::Variable(var) => variables.contains_key(var.as_str()),
            _ => true,
        });
        match value {
            Some(value) => {
                let value =
                    from_literal(registry, &def.ty, value, variables).map_err(|e| e.nested(*name))?;
                output.insert(Name::new(name), value);
            },
            None => missing_field(input, def)?,
        }
    }
    Ok(ConstValue::Object(output))
}

/// Turn a coerced value back into a literal so it can be checked against
/// the type of the position it is used in.
fn to_literal(value: &ConstValue) -> Value {
    match value {
        ConstValue::Null => Value::Null,
        ConstValue::Number(n) => Value::Number(n.clone()),
        ConstValue::String(s) => Value::String(s.clone()),
        ConstValue::Boolean(b) => Value::Boolean(*b),
        ConstValue::Enum(name) => Value::Enum(name.clone()),
        ConstValue::List(items) => Value::List(items.iter().map(to_literal).collect()),
        ConstValue::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(name, value)| (name.clone(), to_literal(value)))
                .collect(),
        ),
        _ => Value::Null,
    }
}

// ── Operation level ─────────────────────────────────────────────────────────

/// Coerce the request's raw variables against the operation's variable
/// definitions. Every failing variable is reported.
pub fn coerce_variables(
    registry: &Registry,
    definitions: &[Positioned<VariableDefinition>],
    input: Option<&Map<String, Json>>,
) -> Result<Variables, Vec<GraphQlError>> {
    let mut variables = Variables::new();
    let mut errors = Vec::new();

    for definition in definitions {
        let name = &definition.node.name.node;
        let declared = &definition.node.var_type.node;
        let Some(ty) = registry.resolve_ast_type(declared) else {
            errors.push(
                ExecutionError::validation(format!(
                    "Unknown type \"{}\".",
                    base_type_name(declared)
                ))
                .at(definition.pos),
            );
            continue;
        };
        let coerced = match input.and_then(|values| values.get(name.as_str())) {
            Some(value) => from_json(registry, &ty, value).map(Some),
            None => match &definition.node.default_value {
                Some(default) => {
                    from_literal(registry, &ty, &to_literal(&default.node), &variables).map(Some)
                },
                None if ty.is_non_null() => Err(InputError::invalid(format!(
                    "variable of required type \"{ty}\" was not provided"
                ))),
                None => Ok(None),
            },
        };
        match coerced {
            Ok(Some(value)) => {
                variables.insert(name.clone(), value);
            },
            Ok(None) => {},
            Err(source) => errors.push(
                ExecutionError::VariableCoercion {
                    variable: name.to_string(),
                    source,
                }
                .at(definition.pos),
            ),
        }
    }

    if errors.is_empty() {
        Ok(variables)
    } else {
        Err(errors)
    }
}

fn base_type_name(ty: &Type) -> &str {
    match &ty.base {
        BaseType::Named(name) => name.as_str(),
        BaseType::List(item) => base_type_name(item),
    }
}

/// Coerce a field's arguments. The first failing argument aborts the field.
pub fn coerce_arguments(
    registry: &Registry,
    definitions: &IndexMap<&'static str, InputValueDef>,
    provided: &[(Positioned<Name>, Positioned<Value>)],
    variables: &Variables,
) -> Result<Arguments, ExecutionError> {
    let mut arguments = IndexMap::new();
    for (name, def) in definitions {
        let given = provided
            .iter()
            .find(|(arg, _)| arg.node.as_str() == *name)
            .map(|(_, value)| &value.node);
        match given {
            Some(value) => {
                let value = from_literal(registry, &def.ty, value, variables).map_err(|source| {
                    ExecutionError::ArgumentCoercion {
                        argument: name.to_string(),
                        source,
                    }
                })?;
                arguments.insert(Name::new(name), value);
            },
            None if def.ty.is_non_null() => {
                return Err(ExecutionError::ArgumentCoercion {
                    argument: name.to_string(),
                    source: InputError::invalid(format!(
                        "argument of required type \"{}\" was not provided",
                        def.ty
                    )),
                });
            },
            None => {},
        }
    }
    Ok(Arguments::new(arguments))
}
