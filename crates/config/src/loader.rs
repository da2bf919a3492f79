use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{
    env_subst::substitute_env,
    error::{ConfigError, Result},
    schema::QuillConfig,
};

/// Standard config file name.
const CONFIG_FILENAME: &str = "quill.toml";

/// Load config from the given path, resolving relative paths inside it
/// against the file's directory.
pub fn load_config(path: &Path) -> Result<QuillConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config(&substitute_env(&raw), path)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    Ok(config.resolve_paths(base))
}

/// Parse an already substituted config body. `path` picks the format and
/// labels errors.
pub fn parse_config(raw: &str, path: &Path) -> Result<QuillConfig> {
    match path.extension().and_then(|e| e.to_str()).unwrap_or("toml") {
        "toml" => toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        }),
        _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./quill.toml` (project-local)
/// 2. `<user config dir>/quill.toml` (user-global)
///
/// Returns `QuillConfig::default()` if no config file is found or the one
/// found fails to load.
pub fn discover_and_load() -> QuillConfig {
    let Some(path) = find_config_file() else {
        debug!("no config file found, using defaults");
        return QuillConfig::default();
    };
    debug!(path = %path.display(), "loading config");
    load_config(&path).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
        QuillConfig::default()
    })
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    let mut dirs = vec![PathBuf::from(".")];
    dirs.extend(config_dir());
    find_in(&dirs)
}

fn find_in(dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter()
        .map(|dir| dir.join(CONFIG_FILENAME))
        .find(|path| path.is_file())
}

/// Returns the user-global config directory.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "quill").map(|d| d.config_dir().to_path_buf())
}
