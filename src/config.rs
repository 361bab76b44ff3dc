use std::time::Duration;

use anyhow::Context;
use tracing::trace;

use crate::{HostRecord, Secret, collection::CollectorSettings, remote::ssh::DEFAULT_PROGRAM};

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct Config {
    #[serde(default)]
    pub hosts: Vec<HostConfig>,

    #[serde(default)]
    pub collection: CollectionConfig,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct HostConfig {
    pub address: String,
    pub username: String,
    /// Inline credential
    pub secret: Option<Secret>,
    /// Name of an environment variable holding the credential
    pub secret_env: Option<String>,
    pub display: Option<String>,
    #[serde(default = "crate::util::get_default_ssh_port")]
    pub port: u16,
    #[serde(default)]
    pub simulated: bool,
}

impl HostConfig {
    /// Resolve the credential and build the host record
    ///
    /// Hosts without any credential get a blank one and are collected
    /// synthetically.
    pub fn to_record(&self) -> anyhow::Result<HostRecord> {
        let secret = match (&self.secret, &self.secret_env) {
            (Some(secret), _) => secret.clone(),
            (None, Some(var)) => std::env::var(var).map(Secret::new).with_context(|| {
                format!("secret variable {var} for host {} is not set", self.address)
            })?,
            (None, None) => Secret::default(),
        };

        let mut record = HostRecord {
            secret,
            ..HostRecord::new(self.address.trim(), self.username.trim(), "")
        }
        .with_port(self.port)
        .simulated(self.simulated);

        if let Some(display) = self
            .display
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
        {
            record = record.with_display_name(display);
        }

        Ok(record)
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct CollectionConfig {
    /// Try real collection before falling back to synthetic data
    #[serde(default = "default_prefer_real")]
    pub prefer_real: bool,

    /// Upper bound for one remote session during collection, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,

    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Seconds between two cycles in watch mode
    #[serde(default = "default_interval")]
    pub interval: u64,

    #[serde(default = "default_ssh_program")]
    pub ssh_program: String,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            prefer_real: default_prefer_real(),
            timeout_secs: default_timeout_secs(),
            probe_timeout_secs: default_probe_timeout_secs(),
            max_concurrency: default_max_concurrency(),
            interval: default_interval(),
            ssh_program: default_ssh_program(),
        }
    }
}

impl CollectionConfig {
    pub fn collector_settings(&self) -> CollectorSettings {
        CollectorSettings {
            command_timeout: Duration::from_secs(self.timeout_secs.max(1)),
            max_concurrency: self.max_concurrency.max(1),
        }
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs.max(1))
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval.max(1))
    }
}

fn default_prefer_real() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    12
}

fn default_probe_timeout_secs() -> u64 {
    8
}

fn default_max_concurrency() -> usize {
    16
}

fn default_interval() -> u64 {
    15
}

fn default_ssh_program() -> String {
    DEFAULT_PROGRAM.to_string()
}

impl Config {
    pub fn host_records(&self) -> anyhow::Result<Vec<HostRecord>> {
        self.hosts.iter().map(HostConfig::to_record).collect()
    }
}

pub fn read_config_file(path: &str) -> anyhow::Result<Config> {
    let file_content =
        std::fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?;
    serde_json::from_str(&file_content)
        .map_err(|e| anyhow::anyhow!("Invalid configuration file provided: {e}"))
        .inspect(|config| trace!("loaded config: {config:?}"))
}
