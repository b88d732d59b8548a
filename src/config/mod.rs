//! Configuration for gitwalk
//!
//! Settings are read from `gitwalk.toml` in the working directory, or from
//! the file named by `--config`. Command-line flags override file values.
//!
//! # Configuration Format
//!
//! ```toml
//! # gitwalk.toml
//!
//! [store]
//! backend = "redb"   # or "memory"
//! path = "gitwalk.db"
//!
//! [walk]
//! workers = 4
//! keep_going = true
//! ```

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

use crate::walker::WalkOptions;

/// File looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "gitwalk.toml";

/// Database file used by the durable backend unless configured otherwise
pub const DEFAULT_DB_PATH: &str = "gitwalk.db";

/// Upper bound on extraction workers, shared with the `--workers` flag
pub const MAX_WORKERS: usize = 64;

/// Fact Store backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Durable redb database file
    #[default]
    Redb,
    /// In-memory graph, discarded on exit
    Memory,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Redb => "redb",
            Backend::Memory => "memory",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "redb" => Ok(Backend::Redb),
            "memory" => Ok(Backend::Memory),
            other => Err(format!("unknown store backend '{}' (expected redb or memory)", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: Backend,
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            path: PathBuf::from(DEFAULT_DB_PATH),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WalkConfig {
    pub workers: usize,
    pub keep_going: bool,
}

impl Default for WalkConfig {
    fn default() -> Self {
        let options = WalkOptions::default();
        Self {
            workers: options.workers,
            keep_going: options.keep_going,
        }
    }
}

impl From<&WalkConfig> for WalkOptions {
    fn from(config: &WalkConfig) -> Self {
        let workers = config.workers.clamp(1, MAX_WORKERS);
        if workers != config.workers {
            warn!(
                "workers = {} is outside 1-{}, using {}",
                config.workers, MAX_WORKERS, workers
            );
        }
        WalkOptions {
            workers,
            keep_going: config.keep_going,
        }
    }
}

/// Contents of `gitwalk.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GitwalkConfig {
    pub store: StoreConfig,
    pub walk: WalkConfig,
}

impl GitwalkConfig {
    pub fn walk_options(&self) -> WalkOptions {
        WalkOptions::from(&self.walk)
    }
}

/// Load configuration, falling back to defaults.
///
/// With an explicit `path` that file is read; otherwise `gitwalk.toml` in the
/// working directory is used if present. A file that cannot be read or parsed
/// is logged and ignored.
pub fn load_config(path: Option<&Path>) -> GitwalkConfig {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !default.exists() {
                return GitwalkConfig::default();
            }
            default
        }
    };

    match load_toml_config(&path) {
        Ok(config) => {
            debug!("Loaded config from {}", path.display());
            config
        }
        Err(e) => {
            warn!("Failed to load {}: {}", path.display(), e);
            GitwalkConfig::default()
        }
    }
}

fn load_toml_config(path: &Path) -> anyhow::Result<GitwalkConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: GitwalkConfig = toml::from_str(&content)?;
    Ok(config)
}
