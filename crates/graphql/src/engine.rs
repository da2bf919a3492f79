//! Request pipeline: parse, depth guard and validation, operation
//! selection, variable coercion, execution.

use std::sync::Arc;

use {
    async_graphql_parser::{parse_query, types::ExecutableDocument},
    async_graphql_value::Name,
    quill_store::DataStore,
    serde_json::Value,
    tracing::{debug, warn},
};

use crate::{
    coerce::coerce_variables,
    depth::{DEFAULT_MAX_DEPTH, check_depth, measure},
    envelope::{GraphQlRequest, GraphQlResponse},
    error::{ExecutionError, GraphQlError},
    executor::Executor,
    registry::Registry,
    schema::schema,
    validation::{operations, select_operation, validate},
};

/// Tunables of the request pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub max_depth: usize,
    pub concurrent_fields: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            concurrent_fields: true,
        }
    }
}

/// Per-operation summary of a document that passed [`Engine::check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationSummary {
    pub name: Option<String>,
    pub depth: usize,
}

/// Executes requests against the static registry and a store.
#[derive(Clone)]
pub struct Engine {
    registry: &'static Registry,
    store: Arc<dyn DataStore>,
    options: EngineOptions,
}

impl Engine {
    #[must_use]
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self::with_options(store, EngineOptions::default())
    }

    #[must_use]
    pub fn with_options(store: Arc<dyn DataStore>, options: EngineOptions) -> Self {
        Self {
            registry: schema(),
            store,
            options,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &'static Registry {
        self.registry
    }

    #[must_use]
    pub fn options(&self) -> EngineOptions {
        self.options
    }

    /// Parse the document and run the depth guard and validation rules.
    /// Errors from both are reported together.
    pub fn check(&self, query: &str) -> Result<ExecutableDocument, Vec<GraphQlError>> {
        let document = parse_query(query).map_err(|err| {
            let mut error = ExecutionError::Syntax(err.to_string()).into_graphql();
            error.locations = err.positions().map(Into::into).collect();
            vec![error]
        })?;

        let mut errors = check_depth(&document, self.options.max_depth);
        errors.extend(validate(self.registry, &document));
        if errors.is_empty() {
            Ok(document)
        } else {
            Err(errors)
        }
    }

    /// Depth of every operation in a checked document, in source order.
    #[must_use]
    pub fn summarize(&self, document: &ExecutableDocument) -> Vec<OperationSummary> {
        operations(document)
            .into_iter()
            .map(|(name, operation)| OperationSummary {
                name: name.map(ToString::to_string),
                depth: measure(&operation.node.selection_set.node, &document.fragments)
                    .map_or(0, |deepest| deepest.depth),
            })
            .collect()
    }

    /// Run one request to completion. Never fails: every problem ends up in
    /// the response's `errors`.
    pub async fn execute(&self, request: GraphQlRequest) -> GraphQlResponse {
        let document = match self.check(&request.query) {
            Ok(document) => document,
            Err(errors) => {
                warn!(errors = errors.len(), "rejected document");
                return GraphQlResponse::from_errors(errors);
            },
        };

        let (name, operation) =
            match select_operation(&document, request.operation_name.as_deref()) {
                Ok(selected) => selected,
                Err(err) => return GraphQlResponse::from_errors(vec![err.into_graphql()]),
            };
        let operation_name = name.map_or("anonymous", Name::as_str);

        let variables = match coerce_variables(
            self.registry,
            &operation.node.variable_definitions,
            request.variables.as_ref(),
        ) {
            Ok(variables) => variables,
            Err(errors) => {
                warn!(operation = operation_name, errors = errors.len(), "rejected variables");
                return GraphQlResponse::from_errors(errors);
            },
        };

        debug!(operation = operation_name, ty = ?operation.node.ty, "executing operation");
        let (data, mut errors) =
            Executor::new(self.registry, &document, &variables, self.store.as_ref())
                .concurrent(self.options.concurrent_fields)
                .execute(&operation.node)
                .await;

        let data = match data.map(|value| value.into_json()).transpose() {
            Ok(data) => data.unwrap_or(Value::Null),
            Err(err) => {
                errors.push(ExecutionError::internal(err.to_string()).into_graphql());
                Value::Null
            },
        };
        debug!(
            operation = operation_name,
            errors = errors.len(),
            "operation finished"
        );
        GraphQlResponse {
            data: Some(data),
            errors,
        }
    }
}
