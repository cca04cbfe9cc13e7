//! Workspace configuration
//!
//! Resolves the data/db/refresh paths the tracing agent writes to. Values can
//! be overridden from a `tracescope.toml` at the workspace root; everything
//! else falls back to the agent's conventional layout under `data_dir`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, TraceScopeError};

/// Default database file name written by the tracing agent
pub const DEFAULT_DB_NAME: &str = "call_trace.db";

/// Relative path (under the data dir) the agent touches to request a refresh
pub const REFRESH_PATH: &str = "tmp/refresh";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Workspace root the trace paths are resolved against
    pub root_dir: PathBuf,
    /// Data directory, relative to `root_dir` unless absolute
    pub data_dir: PathBuf,
    /// File name of the default trace database
    pub db_name: String,
    /// Depth at which call-tree traversal is truncated
    pub max_call_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("."),
            data_dir: PathBuf::from("tmp/tracescope"),
            db_name: DEFAULT_DB_NAME.to_string(),
            max_call_depth: 30,
        }
    }
}

impl Config {
    /// Load configuration for a workspace root, reading `tracescope.toml`
    /// from that root when present.
    pub fn load(root_dir: &Path) -> Result<Self> {
        let config_path = root_dir.join("tracescope.toml");
        let mut config = if config_path.exists() {
            let text = fs::read_to_string(&config_path)?;
            toml::from_str::<Config>(&text).map_err(|e| TraceScopeError::Config {
                message: format!("{}: {}", config_path.display(), e),
            })?
        } else {
            Config::default()
        };
        config.root_dir = root_dir.to_path_buf();
        Ok(config)
    }

    /// Absolute data directory
    pub fn data_path(&self) -> PathBuf {
        if self.data_dir.is_absolute() {
            self.data_dir.clone()
        } else {
            self.root_dir.join(&self.data_dir)
        }
    }

    /// Directory holding recorded trace databases
    pub fn db_dir(&self) -> PathBuf {
        self.data_path().join("db")
    }

    /// Path of the default trace database
    pub fn db_path(&self) -> PathBuf {
        self.db_dir().join(&self.db_name)
    }

    /// Path the agent touches after writing new trace data
    pub fn refresh_path(&self) -> PathBuf {
        self.data_path().join(REFRESH_PATH)
    }
}
