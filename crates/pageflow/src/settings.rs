use std::path::{Path, PathBuf};

use pageflow_core::config::PaginationConfig;

use crate::prelude::*;

/// `config.toml` under the platform config directory, if one is known.
pub fn default_config_path() -> Option<PathBuf> {
    Some(dirs_next::config_dir()?.join("pageflow").join("config.toml"))
}

/// Load pagination settings from a TOML file.
///
/// An explicit `path` must exist. Without one, the default location is tried
/// and a missing file falls back to the built-in defaults.
pub fn load_config(path: Option<&Path>) -> Result<PaginationConfig> {
    let (path, allow_missing) = match path {
        Some(path) => (path.to_path_buf(), false),
        None => match default_config_path() {
            Some(path) => (path, true),
            None => return Ok(PaginationConfig::default()),
        },
    };

    let config = match std::fs::read_to_string(&path) {
        Ok(contents) => toml::from_str::<PaginationConfig>(&contents)
            .map_err(|e| eyre!("failed to parse config '{}': {e}", path.display()))?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && allow_missing => {
            PaginationConfig::default()
        }
        Err(e) => {
            return Err(e).context(f!("failed to read config '{}'", path.display()));
        }
    };

    config.validate().map_err(|e| eyre!(e))?;
    Ok(config)
}
