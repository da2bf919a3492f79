//! Configuration validation.
//!
//! Checks a `quill.toml` for syntax, unknown or misspelled keys, type errors
//! and values the engine cannot run with.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use crate::schema::QuillConfig;

/// Depth above which the guard no longer protects much.
const DEEP_LIMIT_WARNING: usize = 20;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "syntax", "unknown-field", "type-error", "value", "file-ref"
    pub category: &'static str,
    /// Dotted path, e.g. "engine.max_depth"
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    fn new(
        severity: Severity,
        category: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "{} [{}]: {}", self.severity, self.category, self.message)
        } else {
            write!(
                f,
                "{} [{}] {}: {}",
                self.severity, self.category, self.path, self.message
            )
        }
    }
}

/// Result of validating a configuration file.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

// ── Known keys ──────────────────────────────────────────────────────────────

enum KnownKeys {
    Table(HashMap<&'static str, KnownKeys>),
    Leaf,
}

/// Mirrors every field in `schema.rs`.
fn build_schema_map() -> KnownKeys {
    use KnownKeys::{Leaf, Table};

    Table(HashMap::from([
        (
            "engine",
            Table(HashMap::from([
                ("max_depth", Leaf),
                ("concurrent_fields", Leaf),
            ])),
        ),
        ("store", Table(HashMap::from([("seed", Leaf)]))),
    ]))
}

// ── Suggestions ─────────────────────────────────────────────────────────────

/// Levenshtein edit distance, counted in chars.
fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.chars().enumerate() {
        let mut curr = Vec::with_capacity(b.len() + 1);
        curr.push(i + 1);
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != *cb);
            curr.push(substitution.min(prev[j + 1] + 1).min(curr[j] + 1));
        }
        prev = curr;
    }
    prev[b.len()]
}

/// Closest candidate within `max_distance`, if any.
fn suggest<'a>(needle: &str, candidates: &[&'a str], max_distance: usize) -> Option<&'a str> {
    candidates
        .iter()
        .map(|candidate| (*candidate, levenshtein(needle, candidate)))
        .filter(|(_, d)| *d > 0 && *d <= max_distance)
        .min_by_key(|(candidate, d)| (*d, *candidate))
        .map(|(candidate, _)| candidate)
}

// ── Core validation ─────────────────────────────────────────────────────────

/// Validate a config file at the given path, or the discovered one if
/// `path` is `None`.
#[must_use]
pub fn validate(path: Option<&Path>) -> ValidationResult {
    let config_path = path
        .map(Path::to_path_buf)
        .or_else(crate::loader::find_config_file);

    let Some(actual_path) = config_path else {
        return ValidationResult {
            diagnostics: vec![Diagnostic::new(
                Severity::Info,
                "file-ref",
                "",
                "no config file found; using defaults",
            )],
            config_path: None,
        };
    };

    match std::fs::read_to_string(&actual_path) {
        Ok(content) => {
            let content = crate::env_subst::substitute_env(&content);
            let mut result = validate_toml_str(&content);
            let base = actual_path.parent().unwrap_or_else(|| Path::new("."));
            check_file_references(&content, base, &mut result.diagnostics);
            result.config_path = Some(actual_path);
            result
        },
        Err(e) => ValidationResult {
            diagnostics: vec![Diagnostic::new(
                Severity::Error,
                "syntax",
                "",
                format!("failed to read config file: {e}"),
            )],
            config_path: Some(actual_path),
        },
    }
}

/// Validate a TOML string without touching the file system.
#[must_use]
pub fn validate_toml_str(toml_str: &str) -> ValidationResult {
    let mut diagnostics = Vec::new();

    let toml_value: toml::Value = match toml::from_str(toml_str) {
        Ok(v) => v,
        Err(e) => {
            diagnostics.push(Diagnostic::new(
                Severity::Error,
                "syntax",
                "",
                format!("TOML syntax error: {e}"),
            ));
            return ValidationResult {
                diagnostics,
                config_path: None,
            };
        },
    };

    check_unknown_fields(&toml_value, &build_schema_map(), "", &mut diagnostics);

    match toml::from_str::<QuillConfig>(toml_str) {
        Ok(config) => check_values(&config, &mut diagnostics),
        Err(e) => diagnostics.push(Diagnostic::new(
            Severity::Error,
            "type-error",
            "",
            format!("type error: {e}"),
        )),
    }

    ValidationResult {
        diagnostics,
        config_path: None,
    }
}

fn check_unknown_fields(
    value: &toml::Value,
    schema: &KnownKeys,
    prefix: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let (toml::Value::Table(table), KnownKeys::Table(fields)) = (value, schema) else {
        return;
    };
    let known: Vec<&str> = fields.keys().copied().collect();

    for (key, child) in table {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        if let Some(child_schema) = fields.get(key.as_str()) {
            check_unknown_fields(child, child_schema, &path, diagnostics);
            continue;
        }
        let level = if prefix.is_empty() {
            " at top level"
        } else {
            ""
        };
        let message = match suggest(key, &known, 3) {
            Some(s) => format!("unknown field{level} (did you mean \"{s}\"?)"),
            None => format!("unknown field{level}"),
        };
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "unknown-field",
            path,
            message,
        ));
    }
}

fn check_values(config: &QuillConfig, diagnostics: &mut Vec<Diagnostic>) {
    let depth = config.engine.max_depth;
    if depth == 0 {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "value",
            "engine.max_depth",
            "max_depth must be at least 1",
        ));
    } else if depth > DEEP_LIMIT_WARNING {
        diagnostics.push(Diagnostic::new(
            Severity::Warning,
            "value",
            "engine.max_depth",
            format!("max_depth {depth} allows very expensive nested queries"),
        ));
    }
}

/// Check that the seed snapshot exists, relative to `base`.
fn check_file_references(toml_str: &str, base: &Path, diagnostics: &mut Vec<Diagnostic>) {
    let Ok(config) = toml::from_str::<QuillConfig>(toml_str) else {
        return;
    };
    let Some(seed) = config.resolve_paths(base).store.seed else {
        return;
    };
    if !seed.is_file() {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "file-ref",
            "store.seed",
            format!("file not found: {}", seed.display()),
        ));
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    fn find<'a>(result: &'a ValidationResult, category: &str, path: &str) -> &'a Diagnostic {
        result
            .diagnostics
            .iter()
            .find(|d| d.category == category && d.path == path)
            .unwrap_or_else(|| panic!("no {category} diagnostic at {path}: {result:?}"))
    }

    #[test]
    fn levenshtein_distances() {
        assert_eq!(levenshtein("engine", "engine"), 0);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
        assert_eq!(levenshtein("max_depth", "max_dept"), 1);
        assert_eq!(levenshtein("seed", "sede"), 2);
    }

    #[test]
    fn empty_config_is_valid() {
        let result = validate_toml_str("");
        assert!(result.diagnostics.is_empty(), "{result:?}");
    }

    #[test]
    fn full_valid_config_no_diagnostics() {
        let result = validate_toml_str(
            "[engine]\nmax_depth = 6\nconcurrent_fields = false\n\n[store]\nseed = \"seed.json\"\n",
        );
        assert!(result.diagnostics.is_empty(), "{result:?}");
    }

    #[test]
    fn syntax_error_detected() {
        let result = validate_toml_str("[engine\nmax_depth = 5");
        assert!(result.has_errors());
        assert_eq!(result.diagnostics[0].category, "syntax");
    }

    #[test]
    fn unknown_top_level_key_with_suggestion() {
        let result = validate_toml_str("[engin]\nmax_depth = 5\n");
        let d = find(&result, "unknown-field", "engin");
        assert_eq!(d.severity, Severity::Error);
        assert!(d.message.contains("at top level"));
        assert!(d.message.contains("\"engine\""), "{}", d.message);
    }

    #[test]
    fn unknown_nested_key_with_suggestion() {
        let result = validate_toml_str("[engine]\nmax_dept = 5\n");
        let d = find(&result, "unknown-field", "engine.max_dept");
        assert!(d.message.contains("\"max_depth\""), "{}", d.message);
    }

    #[test]
    fn zero_depth_is_an_error() {
        let result = validate_toml_str("[engine]\nmax_depth = 0\n");
        assert!(result.has_errors());
        find(&result, "value", "engine.max_depth");
    }

    #[test]
    fn very_deep_limit_is_a_warning() {
        let result = validate_toml_str("[engine]\nmax_depth = 50\n");
        assert!(!result.has_errors());
        assert_eq!(result.count(Severity::Warning), 1);
    }

    #[test]
    fn negative_depth_is_a_type_error() {
        let result = validate_toml_str("[engine]\nmax_depth = -1\n");
        find(&result, "type-error", "");
    }

    #[test]
    fn missing_seed_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quill.toml");
        std::fs::write(&path, "[store]\nseed = \"absent.json\"\n").unwrap();

        let result = validate(Some(&path));
        assert_eq!(result.config_path.as_deref(), Some(path.as_path()));
        let d = find(&result, "file-ref", "store.seed");
        assert!(d.message.contains("absent.json"));

        std::fs::write(dir.path().join("absent.json"), "{}").unwrap();
        assert!(!validate(Some(&path)).has_errors());
    }

    #[test]
    fn unreadable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = validate(Some(&dir.path().join("nope.toml")));
        assert!(result.has_errors());
    }

    #[test]
    fn diagnostic_display_includes_path() {
        let d = Diagnostic::new(Severity::Warning, "value", "engine.max_depth", "deep");
        assert_eq!(d.to_string(), "warning [value] engine.max_depth: deep");
    }
}
