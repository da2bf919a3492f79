//! Error kinds raised while validating and executing a document, and the
//! serializable error entries returned in a response.

use {
    async_graphql_parser::Pos,
    quill_store::StoreError,
    serde::{Deserialize, Serialize},
};

use crate::{coerce::InputError, scalars::ScalarCoercionError};

/// Machine-readable `extensions.code` of an error entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ScalarCoercion,
    DepthLimitExceeded,
    ArgumentCoercion,
    NotFound,
    ConstraintViolation,
    NullabilityViolation,
    GraphqlParseFailed,
    GraphqlValidationFailed,
    Internal,
}

/// Everything that can go wrong between receiving a document and returning
/// its data. Each variant maps onto one [`ErrorCode`].
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error(transparent)]
    ScalarCoercion(#[from] ScalarCoercionError),

    #[error("'{operation}' exceeds maximum operation depth of {limit}")]
    DepthLimitExceeded { operation: String, limit: usize },

    #[error("Argument \"{argument}\" has invalid value: {source}")]
    ArgumentCoercion {
        argument: String,
        #[source]
        source: InputError,
    },

    #[error("Variable \"${variable}\" got invalid value: {source}")]
    VariableCoercion {
        variable: String,
        #[source]
        source: InputError,
    },

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    ConstraintViolation(String),

    #[error("Cannot return null for non-nullable field {type_name}.{field}.")]
    NullabilityViolation {
        type_name: &'static str,
        field: String,
    },

    #[error("{0}")]
    Syntax(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Internal(String),
}

impl ExecutionError {
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::ScalarCoercion(_) => ErrorCode::ScalarCoercion,
            Self::DepthLimitExceeded { .. } => ErrorCode::DepthLimitExceeded,
            Self::ArgumentCoercion { source, .. } | Self::VariableCoercion { source, .. } => {
                if source.is_scalar() {
                    ErrorCode::ScalarCoercion
                } else {
                    ErrorCode::ArgumentCoercion
                }
            },
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::ConstraintViolation(_) => ErrorCode::ConstraintViolation,
            Self::NullabilityViolation { .. } => ErrorCode::NullabilityViolation,
            Self::Syntax(_) => ErrorCode::GraphqlParseFailed,
            Self::Validation(_) => ErrorCode::GraphqlValidationFailed,
            Self::Internal(_) => ErrorCode::Internal,
        }
    }

    /// Convert into a response entry without location or path.
    #[must_use]
    pub fn into_graphql(self) -> GraphQlError {
        GraphQlError {
            message: self.to_string(),
            locations: Vec::new(),
            path: Vec::new(),
            extensions: ErrorExtensions { code: self.code() },
        }
    }

    /// Convert into a response entry pointing at `pos` in the document.
    #[must_use]
    pub fn at(self, pos: Pos) -> GraphQlError {
        self.into_graphql().with_location(pos)
    }
}

impl From<StoreError> for ExecutionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => Self::NotFound(err.to_string()),
            StoreError::ConstraintViolation(message) => Self::ConstraintViolation(message),
            other => Self::Internal(other.to_string()),
        }
    }
}

pub type Result<T, E = ExecutionError> = std::result::Result<T, E>;

// ── Response entries ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl From<Pos> for Location {
    fn from(pos: Pos) -> Self {
        Self {
            line: pos.line,
            column: pos.column,
        }
    }
}

/// One step of the response path: an output key or a list index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorExtensions {
    pub code: ErrorCode,
}

/// An entry of the response `errors` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQlError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<Location>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<PathSegment>,
    pub extensions: ErrorExtensions,
}

impl GraphQlError {
    #[must_use]
    pub fn with_location(mut self, pos: Pos) -> Self {
        self.locations.push(pos.into());
        self
    }

    #[must_use]
    pub fn with_path(mut self, path: Vec<PathSegment>) -> Self {
        self.path = path;
        self
    }

    #[must_use]
    pub fn code(&self) -> ErrorCode {
        self.extensions.code
    }
}
