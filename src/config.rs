//! Harness configuration file.
//!
//! The file is optional TOML; every field has a default matching the
//! conventional repository layout (`node/lookup.js`,
//! `node/optimized-lookup.js`, `benchmarking/results.json`).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::exec::{Executor, Implementation, ImplementationCommand};
use crate::results::ResultsStore;

/// File name looked up in the current directory when no path is given.
pub const LOCAL_CONFIG_FILE: &str = "tldbench.toml";

/// Errors raised while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read harness config {path}: {source}")]
    Read {
        /// Config path.
        path: PathBuf,
        /// Underlying OS error.
        source: std::io::Error,
    },
    /// The file is not valid TOML for this schema.
    #[error("failed to parse harness config {path}: {source}")]
    Parse {
        /// Config path.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },
    /// An explicitly requested file does not exist.
    #[error("harness config {path} does not exist")]
    Missing {
        /// Config path.
        path: PathBuf,
    },
}

/// Launch and output settings for one implementation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImplementationConfig {
    /// Executable to launch.
    pub program: String,
    /// Arguments placed before the scenario parameters.
    #[serde(default)]
    pub args: Vec<String>,
    /// Collection name in the shared results store.
    pub results_key: String,
    /// Availability snapshot written after each run.
    pub snapshot: PathBuf,
}

impl ImplementationConfig {
    /// Command used to launch this implementation.
    pub fn command(&self) -> ImplementationCommand {
        ImplementationCommand::new(self.program.clone(), self.args.iter().cloned())
    }
}

/// Full harness configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// Directory implementations run in; relative paths resolve against it.
    pub working_dir: PathBuf,
    /// Shared results store.
    pub results_path: PathBuf,
    /// Environment variable carrying the concurrency hint.
    pub concurrency_env: String,
    /// Kill a child after this many seconds; unset waits forever.
    pub timeout_secs: Option<u64>,
    /// Reference implementation.
    pub baseline: ImplementationConfig,
    /// Implementation under test.
    pub optimized: ImplementationConfig,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            working_dir: PathBuf::from("."),
            results_path: PathBuf::from("benchmarking/results.json"),
            concurrency_env: "CONCURRENCY_LIMIT".to_string(),
            timeout_secs: None,
            baseline: ImplementationConfig {
                program: "node".to_string(),
                args: vec!["node/lookup.js".to_string()],
                results_key: "node".to_string(),
                snapshot: PathBuf::from("node/available.node.json"),
            },
            optimized: ImplementationConfig {
                program: "node".to_string(),
                args: vec!["node/optimized-lookup.js".to_string()],
                results_key: "optimizedNode".to_string(),
                snapshot: PathBuf::from("node/available.optimized.json"),
            },
        }
    }
}

impl HarnessConfig {
    /// Loads configuration.
    ///
    /// An `explicit` path must exist. Otherwise `./tldbench.toml` and then
    /// the user config directory are tried; if neither exists the defaults
    /// are used.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ConfigError::Missing {
                    path: path.to_path_buf(),
                });
            }
            return Self::from_file(path);
        }
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            return Self::from_file(&local);
        }
        match default_config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => {
                debug!("bench.config.defaults");
                Ok(Self::default())
            }
        }
    }

    /// Parses the TOML file at `path`.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "bench.config.loaded");
        Ok(config)
    }

    /// Settings for one side.
    pub fn implementation(&self, implementation: Implementation) -> &ImplementationConfig {
        match implementation {
            Implementation::Baseline => &self.baseline,
            Implementation::Optimized => &self.optimized,
        }
    }

    /// Resolves `path` against the working directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.working_dir.join(path)
        }
    }

    /// Snapshot path for one side, resolved.
    pub fn snapshot_path(&self, implementation: Implementation) -> PathBuf {
        self.resolve(&self.implementation(implementation).snapshot)
    }

    /// Shared results store described by this config.
    pub fn results_store(&self) -> ResultsStore {
        ResultsStore::new(
            self.resolve(&self.results_path),
            self.baseline.results_key.clone(),
            self.optimized.results_key.clone(),
        )
    }

    /// Executor rooted at the working directory.
    pub fn executor(&self) -> Executor {
        Executor::new(self.working_dir.clone())
            .with_timeout(self.timeout_secs.map(Duration::from_secs))
    }
}

/// Per-user config location, e.g. `~/.config/tldbench/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join("tldbench").join("config.toml"))
}
