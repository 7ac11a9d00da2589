//! TOML configuration for the `scout` binary.
//!
//! ```toml
//! [db]
//! path = "./data/scout.sqlite"
//!
//! [server]
//! bind = "127.0.0.1:8080"
//!
//! [source]
//! path = "./data/candidates.jsonl"
//! max_fork_ratio = 5.0
//!
//! [catalog]
//! path = "./config/catalog.toml"
//!
//! [history]
//! days = 90
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use traction_scout_core::catalog::Catalog;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    /// JSON array or JSON-lines file of raw metric records.
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_max_fork_ratio")]
    pub max_fork_ratio: f64,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: None,
            max_fork_ratio: default_max_fork_ratio(),
            limit: None,
        }
    }
}

fn default_max_fork_ratio() -> f64 {
    5.0
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CatalogConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HistoryConfig {
    #[serde(default = "default_history_days")]
    pub days: i64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            days: default_history_days(),
        }
    }
}

fn default_history_days() -> i64 {
    90
}

impl Config {
    /// The configured catalog, or the built-in tables when none is set.
    pub fn load_catalog(&self) -> Result<Catalog> {
        match &self.catalog.path {
            Some(path) => Catalog::load(path),
            None => Ok(Catalog::builtin()),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.db.path.as_os_str().is_empty() {
        anyhow::bail!("db.path must not be empty");
    }

    if !(config.source.max_fork_ratio > 0.0) {
        anyhow::bail!("source.max_fork_ratio must be > 0");
    }

    if config.source.limit == Some(0) {
        anyhow::bail!("source.limit must be >= 1 when set");
    }

    if config.history.days < 1 {
        anyhow::bail!("history.days must be >= 1");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn minimal_config_gets_defaults() {
        let file = write_config("[db]\npath = \"./data/scout.sqlite\"\n");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:8080");
        assert_eq!(config.source.max_fork_ratio, 5.0);
        assert_eq!(config.history.days, 90);
        assert!(config.source.path.is_none());
        assert_eq!(config.load_catalog().unwrap().version, Catalog::BUILTIN_VERSION);
    }

    #[test]
    fn rejects_bad_values() {
        let file = write_config("[db]\npath = \"x.sqlite\"\n[source]\nmax_fork_ratio = 0.0\n");
        assert!(load_config(file.path()).is_err());

        let file = write_config("[db]\npath = \"x.sqlite\"\n[history]\ndays = 0\n");
        assert!(load_config(file.path()).is_err());

        let file = write_config("[server]\nbind = \"0.0.0.0:1\"\n");
        assert!(load_config(file.path()).is_err());
    }
}
