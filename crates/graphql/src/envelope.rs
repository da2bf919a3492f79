//! Request and response envelopes.

use {
    serde::{Deserialize, Serialize},
    serde_json::{Map, Value},
};

use crate::error::GraphQlError;

/// `{ query, variables?, operationName? }`. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GraphQlRequest {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
}

impl GraphQlRequest {
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    /// Attach variables. Anything but a JSON object counts as no variables.
    #[must_use]
    pub fn variables(mut self, variables: Value) -> Self {
        self.variables = match variables {
            Value::Object(map) => Some(map),
            _ => None,
        };
        self
    }

    #[must_use]
    pub fn operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }
}

/// `{ data?, errors? }`.
///
/// `data` is absent when the document never reached execution, and `null`
/// when a non-null root field failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphQlResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphQlError>,
}

impl GraphQlResponse {
    /// A response for a request rejected before execution.
    #[must_use]
    pub fn from_errors(errors: Vec<GraphQlError>) -> Self {
        Self { data: None, errors }
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// `data` as JSON, `null` when absent.
    #[must_use]
    pub fn data(&self) -> &Value {
        static NULL: Value = Value::Null;
        self.data.as_ref().unwrap_or(&NULL)
    }
}
