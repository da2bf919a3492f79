//! Config schema types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default depth guard threshold.
pub const DEFAULT_MAX_DEPTH: usize = 5;

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuillConfig {
    pub engine: EngineConfig,
    pub store: StoreConfig,
}

/// Request pipeline tunables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Deepest accepted selection nesting. Top-level fields are depth 0.
    pub max_depth: usize,
    /// Resolve sibling query fields concurrently. Mutation fields always run
    /// in document order.
    pub concurrent_fields: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            concurrent_fields: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON snapshot loaded into the in-memory store at startup. Relative
    /// paths resolve against the config file's directory.
    pub seed: Option<PathBuf>,
}

impl QuillConfig {
    /// Resolve relative paths against `base`, normally the directory the
    /// config file was loaded from.
    #[must_use]
    pub fn resolve_paths(mut self, base: &std::path::Path) -> Self {
        if let Some(seed) = self.store.seed.take() {
            self.store.seed = Some(if seed.is_relative() {
                base.join(seed)
            } else {
                seed
            });
        }
        self
    }
}
