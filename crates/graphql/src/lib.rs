//! GraphQL execution for Quill.
//!
//! Exposes typed queries and mutations over users, profiles, posts and member
//! tiers. A request goes through parsing, the depth guard and validation,
//! then variable coercion, and finally the dispatch engine, which calls the
//! resolver registered for each `(type, field)` pair with an explicit
//! [`ResolverContext`].
//!
//! Transport is out of scope: callers hand a [`GraphQlRequest`] to
//! [`Engine::execute`] and serialize the returned [`GraphQlResponse`].

pub mod coerce;
pub mod context;
pub mod depth;
pub mod engine;
pub mod envelope;
pub mod error;
pub mod executor;
pub mod mutations;
pub mod queries;
pub mod registry;
pub mod resolved;
pub mod scalars;
pub mod schema;
pub mod sdl;
pub mod types;
pub mod validation;

pub use {
    context::{Arguments, ResolverContext},
    depth::DEFAULT_MAX_DEPTH,
    engine::{Engine, EngineOptions, OperationSummary},
    envelope::{GraphQlRequest, GraphQlResponse},
    error::{ErrorCode, ExecutionError, GraphQlError, Location, PathSegment},
    registry::Registry,
    resolved::{Entity, Resolved},
    scalars::{ScalarCoercionError, UuidScalar},
    schema::{build_registry, schema},
};
