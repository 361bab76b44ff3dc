pub mod collection;
pub mod config;
pub mod probe;
pub mod registry;
pub mod remote;
pub mod util;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use collection::orchestrator::{Collector, CollectorSettings};
pub use probe::{ProbeFailure, ProbeResult, Prober};

/// Default SSH port for host records that do not specify one
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Credential of a monitored host
///
/// `Debug` and `Display` never print the wrapped value.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the raw credential. Only the remote runner should call this.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// A registered monitoring target
///
/// Records are never mutated in place: updating a host means removing the
/// old record and adding a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostRecord {
    /// Unique key within the host set
    pub address: String,
    pub username: String,
    /// Accepted on input, never written out
    #[serde(default, skip_serializing)]
    pub secret: Secret,
    #[serde(default = "crate::util::get_default_ssh_port")]
    pub port: u16,
    pub display_name: String,
    /// Always use synthetic data for this host
    #[serde(default)]
    pub simulated: bool,
    pub registered_at: DateTime<Utc>,
}

impl HostRecord {
    /// Create a record on port 22, displayed under its address
    pub fn new(
        address: impl Into<String>,
        username: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        let address = address.into();
        Self {
            display_name: address.clone(),
            address,
            username: username.into(),
            secret: Secret::new(secret),
            port: DEFAULT_SSH_PORT,
            simulated: false,
            registered_at: Utc::now(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn simulated(mut self, simulated: bool) -> Self {
        self.simulated = simulated;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostStatus {
    Online,
    Offline,
}

/// Where the numbers of a [`MetricSample`] came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// Collected from the host over SSH
    Real,
    /// Generated on purpose (simulated host or demo mode)
    Simulated,
    /// Generated because the real collection failed
    SimulatedFallback,
}

/// One observation of one host during one collection cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub address: String,
    pub display_name: String,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub disk_percent: f64,
    pub load_1: f64,
    pub load_5: f64,
    pub load_15: f64,
    pub uptime_text: Option<String>,
    pub status: HostStatus,
    pub data_source: DataSource,
    /// Set whenever `status` is offline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    pub observed_at: DateTime<Utc>,
}

impl MetricSample {
    pub fn is_online(&self) -> bool {
        self.status == HostStatus::Online
    }
}
