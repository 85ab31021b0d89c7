use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::Config;

pub const CONFIG_FILE: &str = "grove.toml";

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Load `grove.toml` from the corpus root. A missing file yields the
/// default configuration; a present-but-broken one is an error, not a
/// silent fallback.
pub fn load_config(root: &Path) -> Result<Config, ConfigError> {
    let path = root.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(Config::default());
    }
    let text = fs::read_to_string(&path).map_err(|e| ConfigError::Read {
        path: path.clone(),
        source: e,
    })?;
    toml::from_str(&text).map_err(|e| ConfigError::Parse { path, source: e })
}
