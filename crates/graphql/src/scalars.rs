//! Scalar codecs: the custom `UUID` identifier plus the built-in scalars.
//!
//! Each codec exposes the three GraphQL coercion contracts. `parse_value`
//! handles variable values arriving as JSON, `parse_literal` handles values
//! written inline in the document, and `serialize` turns an internal value
//! into its response form.

use {
    async_graphql_value::{ConstValue, Name, Number, Value},
    serde_json::Value as Json,
};

/// A value could not be coerced into (or out of) a scalar type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{scalar} cannot represent {reason}")]
pub struct ScalarCoercionError {
    pub scalar: &'static str,
    pub reason: String,
}

impl ScalarCoercionError {
    pub(crate) fn new(scalar: &'static str, reason: impl Into<String>) -> Self {
        Self {
            scalar,
            reason: reason.into(),
        }
    }
}

/// Parse/serialize contract of a leaf type.
pub trait ScalarCodec {
    const NAME: &'static str;
    type Internal;

    fn serialize(value: &Self::Internal) -> ConstValue;
    fn parse_value(value: &Json) -> Result<Self::Internal, ScalarCoercionError>;
    fn parse_literal(value: &Value) -> Result<Self::Internal, ScalarCoercionError>;
}

fn describe_json(value: &Json) -> String {
    match value {
        Json::String(s) => format!("string value: \"{s}\""),
        other => format!("non-string value: {other}"),
    }
}

fn describe_literal(value: &Value) -> String {
    match value {
        Value::Variable(name) => format!("variable ${name}"),
        Value::Null => "null".into(),
        Value::Number(n) => format!("number literal: {n}"),
        Value::String(s) => format!("string literal: \"{s}\""),
        Value::Boolean(b) => format!("boolean literal: {b}"),
        Value::Enum(name) => format!("enum literal: {name}"),
        Value::List(_) => "list literal".into(),
        Value::Object(_) => "object literal".into(),
        _ => "binary literal".into(),
    }
}

// ── UUID ────────────────────────────────────────────────────────────────────

/// Universally-unique identifier kept as the string it was written as.
///
/// Validation uses the `uuid` parser; the accepted string is returned as-is,
/// without case or hyphen normalization.
pub struct UuidScalar;

impl UuidScalar {
    fn check(value: &str) -> Result<String, ScalarCoercionError> {
        uuid::Uuid::try_parse(value)
            .map(|_| value.to_string())
            .map_err(|e| Self::invalid(value, e))
    }

    fn invalid(value: &str, err: uuid::Error) -> ScalarCoercionError {
        ScalarCoercionError::new(Self::NAME, format!("\"{value}\": {err}"))
    }
}

impl ScalarCodec for UuidScalar {
    type Internal = String;

    const NAME: &'static str = "UUID";

    fn serialize(value: &String) -> ConstValue {
        ConstValue::String(value.clone())
    }

    fn parse_value(value: &Json) -> Result<String, ScalarCoercionError> {
        match value {
            Json::String(s) => Self::check(s),
            other => Err(ScalarCoercionError::new(Self::NAME, describe_json(other))),
        }
    }

    fn parse_literal(value: &Value) -> Result<String, ScalarCoercionError> {
        match value {
            Value::String(s) => Self::check(s),
            other => Err(ScalarCoercionError::new(
                Self::NAME,
                describe_literal(other),
            )),
        }
    }
}

// ── Built-ins ───────────────────────────────────────────────────────────────

pub struct IntScalar;

impl IntScalar {
    fn from_number(n: &Number) -> Result<i32, ScalarCoercionError> {
        n.as_i64()
            .and_then(|i| i32::try_from(i).ok())
            .ok_or_else(|| {
                ScalarCoercionError::new(Self::NAME, format!("non 32-bit integer value: {n}"))
            })
    }
}

impl ScalarCodec for IntScalar {
    type Internal = i32;

    const NAME: &'static str = "Int";

    fn serialize(value: &i32) -> ConstValue {
        ConstValue::Number((*value).into())
    }

    fn parse_value(value: &Json) -> Result<i32, ScalarCoercionError> {
        match value {
            Json::Number(n) => Self::from_number(n),
            other => Err(ScalarCoercionError::new(Self::NAME, describe_json(other))),
        }
    }

    fn parse_literal(value: &Value) -> Result<i32, ScalarCoercionError> {
        match value {
            Value::Number(n) => Self::from_number(n),
            other => Err(ScalarCoercionError::new(Self::NAME, describe_literal(other))),
        }
    }
}

pub struct FloatScalar;

impl FloatScalar {
    fn from_number(n: &Number) -> Result<f64, ScalarCoercionError> {
        n.as_f64()
            .filter(|f| f.is_finite())
            .ok_or_else(|| ScalarCoercionError::new(Self::NAME, format!("non numeric value: {n}")))
    }
}

impl ScalarCodec for FloatScalar {
    type Internal = f64;

    const NAME: &'static str = "Float";

    fn serialize(value: &f64) -> ConstValue {
        Number::from_f64(*value).map_or(ConstValue::Null, ConstValue::Number)
    }

    fn parse_value(value: &Json) -> Result<f64, ScalarCoercionError> {
        match value {
            Json::Number(n) => Self::from_number(n),
            other => Err(ScalarCoercionError::new(Self::NAME, describe_json(other))),
        }
    }

    fn parse_literal(value: &Value) -> Result<f64, ScalarCoercionError> {
        match value {
            Value::Number(n) => Self::from_number(n),
            other => Err(ScalarCoercionError::new(Self::NAME, describe_literal(other))),
        }
    }
}

pub struct StringScalar;

impl ScalarCodec for StringScalar {
    type Internal = String;

    const NAME: &'static str = "String";

    fn serialize(value: &String) -> ConstValue {
        ConstValue::String(value.clone())
    }

    fn parse_value(value: &Json) -> Result<String, ScalarCoercionError> {
        match value {
            Json::String(s) => Ok(s.clone()),
            other => Err(ScalarCoercionError::new(Self::NAME, describe_json(other))),
        }
    }

    fn parse_literal(value: &Value) -> Result<String, ScalarCoercionError> {
        match value {
            Value::String(s) => Ok(s.clone()),
            other => Err(ScalarCoercionError::new(Self::NAME, describe_literal(other))),
        }
    }
}

pub struct BooleanScalar;

impl ScalarCodec for BooleanScalar {
    type Internal = bool;

    const NAME: &'static str = "Boolean";

    fn serialize(value: &bool) -> ConstValue {
        ConstValue::Boolean(*value)
    }

    fn parse_value(value: &Json) -> Result<bool, ScalarCoercionError> {
        match value {
            Json::Bool(b) => Ok(*b),
            other => Err(ScalarCoercionError::new(Self::NAME, describe_json(other))),
        }
    }

    fn parse_literal(value: &Value) -> Result<bool, ScalarCoercionError> {
        match value {
            Value::Boolean(b) => Ok(*b),
            other => Err(ScalarCoercionError::new(Self::NAME, describe_literal(other))),
        }
    }
}

/// `ID` accepts strings and integers; integers become strings.
pub struct IdScalar;

impl ScalarCodec for IdScalar {
    type Internal = String;

    const NAME: &'static str = "ID";

    fn serialize(value: &String) -> ConstValue {
        ConstValue::String(value.clone())
    }

    fn parse_value(value: &Json) -> Result<String, ScalarCoercionError> {
        match value {
            Json::String(s) => Ok(s.clone()),
            Json::Number(n) if n.is_i64() || n.is_u64() => Ok(n.to_string()),
            other => Err(ScalarCoercionError::new(Self::NAME, describe_json(other))),
        }
    }

    fn parse_literal(value: &Value) -> Result<String, ScalarCoercionError> {
        match value {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) if n.is_i64() || n.is_u64() => Ok(n.to_string()),
            other => Err(ScalarCoercionError::new(Self::NAME, describe_literal(other))),
        }
    }
}

// ── Registry-facing dispatch ────────────────────────────────────────────────

/// The scalar types a registry can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Int,
    Float,
    String,
    Boolean,
    Id,
    Uuid,
}

impl ScalarKind {
    pub const ALL: [Self; 6] = [
        Self::Int,
        Self::Float,
        Self::String,
        Self::Boolean,
        Self::Id,
        Self::Uuid,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Int => IntScalar::NAME,
            Self::Float => FloatScalar::NAME,
            Self::String => StringScalar::NAME,
            Self::Boolean => BooleanScalar::NAME,
            Self::Id => IdScalar::NAME,
            Self::Uuid => UuidScalar::NAME,
        }
    }

    /// Built-in scalars are implied by every schema and left out of SDL.
    #[must_use]
    pub fn is_builtin(self) -> bool {
        !matches!(self, Self::Uuid)
    }

    /// Coerce a JSON variable value.
    pub fn parse_value(self, value: &Json) -> Result<ConstValue, ScalarCoercionError> {
        match self {
            Self::Int => IntScalar::parse_value(value).map(|v| IntScalar::serialize(&v)),
            Self::Float => FloatScalar::parse_value(value).map(|v| FloatScalar::serialize(&v)),
            Self::String => StringScalar::parse_value(value).map(|v| StringScalar::serialize(&v)),
            Self::Boolean => {
                BooleanScalar::parse_value(value).map(|v| BooleanScalar::serialize(&v))
            },
            Self::Id => IdScalar::parse_value(value).map(|v| IdScalar::serialize(&v)),
            Self::Uuid => UuidScalar::parse_value(value).map(|v| UuidScalar::serialize(&v)),
        }
    }

    /// Coerce an inline literal.
    pub fn parse_literal(self, value: &Value) -> Result<ConstValue, ScalarCoercionError> {
        match self {
            Self::Int => IntScalar::parse_literal(value).map(|v| IntScalar::serialize(&v)),
            Self::Float => FloatScalar::parse_literal(value).map(|v| FloatScalar::serialize(&v)),
            Self::String => StringScalar::parse_literal(value).map(|v| StringScalar::serialize(&v)),
            Self::Boolean => {
                BooleanScalar::parse_literal(value).map(|v| BooleanScalar::serialize(&v))
            },
            Self::Id => IdScalar::parse_literal(value).map(|v| IdScalar::serialize(&v)),
            Self::Uuid => UuidScalar::parse_literal(value).map(|v| UuidScalar::serialize(&v)),
        }
    }

    /// Check a resolved value against the scalar before it enters the
    /// response.
    pub fn serialize(self, value: ConstValue) -> Result<ConstValue, ScalarCoercionError> {
        match (self, value) {
            (Self::Int, ConstValue::Number(n)) => {
                IntScalar::from_number(&n).map(|v| IntScalar::serialize(&v))
            },
            (Self::Float, ConstValue::Number(n)) => {
                FloatScalar::from_number(&n).map(|v| FloatScalar::serialize(&v))
            },
            (Self::String, value @ ConstValue::String(_))
            | (Self::Boolean, value @ ConstValue::Boolean(_)) => Ok(value),
            (Self::Id, ConstValue::String(s)) => Ok(IdScalar::serialize(&s)),
            (Self::Id, ConstValue::Number(n)) if n.is_i64() || n.is_u64() => {
                Ok(IdScalar::serialize(&n.to_string()))
            },
            (Self::Uuid, ConstValue::String(s)) => {
                UuidScalar::check(&s).map(|v| UuidScalar::serialize(&v))
            },
            (_, other) => Err(ScalarCoercionError::new(
                self.name(),
                format!("value: {other}"),
            )),
        }
    }
}

/// Wrap a name for use as an enum value.
#[must_use]
pub fn enum_value(name: &str) -> ConstValue {
    ConstValue::Enum(Name::new(name))
}
