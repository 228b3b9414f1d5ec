use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::catalog::{MetricName, VariableCatalog, VariableId};

/// Storage backend configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// In-memory storage (no persistence)
    #[serde(rename = "none")]
    None,

    /// SQLite database (default for most deployments)
    Sqlite {
        /// Path to the SQLite database file
        #[serde(default = "default_sqlite_path")]
        path: PathBuf,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Sqlite {
            path: default_sqlite_path(),
        }
    }
}

fn default_sqlite_path() -> PathBuf {
    crate::util::get_db_path()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub targets: Vec<Target>,

    #[serde(default)]
    pub polling: PollingConfig,

    /// Per-metric OID overrides for the standard catalog
    #[serde(default)]
    pub variables: Option<Vec<VariableOverride>>,

    /// Storage configuration (defaults to SQLite)
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub api: ApiSection,
}

/// One monitored host. Identity is the name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub name: String,
    pub address: String,
    #[serde(default = "crate::util::get_default_snmp_port")]
    pub port: u16,
}

impl Target {
    pub fn new(name: impl Into<String>, address: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            port,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default = "default_community")]
    pub community: String,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            timeout_ms: default_timeout_ms(),
            max_concurrency: default_max_concurrency(),
            community: default_community(),
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_timeout_ms() -> u64 {
    1000
}

fn default_max_concurrency() -> usize {
    8
}

fn default_community() -> String {
    "public".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct VariableOverride {
    pub metric: MetricName,
    pub oid: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiSection {
    #[serde(default = "crate::util::get_bind_addr")]
    pub bind: SocketAddr,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            bind: crate::util::get_bind_addr(),
        }
    }
}

impl Config {
    /// Reject configurations the poller cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        let mut names = HashSet::new();
        for target in &self.targets {
            if target.name.trim().is_empty() {
                bail!("target with address {} has an empty name", target.address);
            }
            if !names.insert(target.name.as_str()) {
                bail!("duplicate target name: {}", target.name);
            }
        }

        if self.targets.is_empty() {
            warn!("no targets configured, the poller will store nothing");
        }

        if self.polling.interval_ms == 0 {
            bail!("polling.interval_ms must be positive");
        }
        if self.polling.timeout_ms == 0 {
            bail!("polling.timeout_ms must be positive");
        }
        if self.polling.max_concurrency == 0 {
            bail!("polling.max_concurrency must be at least 1");
        }

        self.catalog()?;
        Ok(())
    }

    /// Build the variable catalog, applying any configured overrides.
    pub fn catalog(&self) -> anyhow::Result<VariableCatalog> {
        let mut catalog = VariableCatalog::standard();
        for over in self.variables.iter().flatten() {
            let id = VariableId::parse(&over.oid)?;
            catalog.set(over.metric, id);
        }
        Ok(catalog)
    }
}

pub fn parse_config(content: &str) -> anyhow::Result<Config> {
    let config: Config = serde_json::from_str(content)
        .map_err(|e| anyhow::anyhow!("Invalid configuration file provided: {e}"))?;
    config.validate()?;
    Ok(config)
}

pub fn read_config_file(path: &str) -> anyhow::Result<Config> {
    let file_content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {path}"))?;
    parse_config(&file_content).inspect(|config| trace!("loaded config: {config:?}"))
}
