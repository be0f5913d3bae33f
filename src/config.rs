//! Server configuration.
//!
//! Values come from, in increasing priority: built-in defaults, an optional
//! YAML file, `BEACON_*` environment variables, then command-line flags
//! (see [`crate::cli`]).
//!
//! ```yaml
//! server:
//!   host: 0.0.0.0
//!   port: 4221
//! files:
//!   directory: /tmp/beacon
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 4221;
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub files: FilesConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on buffered request bytes before answering 413.
    pub max_request_bytes: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    /// Base directory for `/files`; the route is disabled when unset.
    pub directory: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_request_bytes: DEFAULT_MAX_REQUEST_BYTES,
        }
    }
}

impl Config {
    /// Defaults with environment overrides applied.
    pub fn load() -> anyhow::Result<Self> {
        let mut cfg = Config::default();
        cfg.apply_env()?;
        Ok(cfg)
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(yaml).context("Invalid configuration")
    }

    /// Reads a YAML file, then applies environment overrides.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let mut cfg = Self::from_yaml_str(&contents)?;
        cfg.apply_env()?;
        Ok(cfg)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    fn apply_env(&mut self) -> anyhow::Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies `BEACON_HOST`, `BEACON_PORT` and `BEACON_DIRECTORY` as
    /// resolved by `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("BEACON_HOST") {
            self.server.host = host;
        }

        if let Some(port) = lookup("BEACON_PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("Invalid BEACON_PORT {port:?}"))?;
        }

        if let Some(dir) = lookup("BEACON_DIRECTORY") {
            self.files.directory = Some(PathBuf::from(dir));
        }

        Ok(())
    }
}
