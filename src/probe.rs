//! Connectivity probe used while registering a host
//!
//! Runs `hostname` on the target with a short timeout and reports whether
//! the credentials work. Failures are turned into messages a user can act
//! on ("check username/password", "check address/port/network").

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Serialize, Serializer};
use tracing::{debug, instrument, warn};

use crate::{
    Secret,
    remote::{RemoteRunner, RemoteTarget, RunnerError},
    util::truncate_detail,
};

/// Identification command; prints a placeholder instead of failing
pub const PROBE_COMMAND: &str = "hostname 2>/dev/null || echo unknown-host";

const UNKNOWN_HOST: &str = "unknown-host";

/// Probes are interactive, so they never wait longer than this
pub const MAX_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(8);

/// Categories of failed probes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeFailure {
    Authentication,
    Timeout,
    ToolMissing(String),
    InvalidInput(String),
    Other(String),
}

impl From<RunnerError> for ProbeFailure {
    fn from(err: RunnerError) -> Self {
        match err {
            RunnerError::AuthenticationFailed => ProbeFailure::Authentication,
            RunnerError::ConnectionTimeout => ProbeFailure::Timeout,
            RunnerError::ExecutableMissing(program) => ProbeFailure::ToolMissing(program),
            RunnerError::InvalidTarget(msg) => ProbeFailure::InvalidInput(msg),
            other => ProbeFailure::Other(truncate_detail(&other.to_string())),
        }
    }
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeFailure::Authentication => {
                write!(f, "authentication failed, check username and password")
            }
            ProbeFailure::Timeout => {
                write!(f, "connection timed out, check address, port and network")
            }
            ProbeFailure::ToolMissing(program) => {
                write!(f, "'{}' is not installed on the monitoring host", program)
            }
            ProbeFailure::InvalidInput(msg) => write!(f, "invalid input: {}", msg),
            ProbeFailure::Other(msg) => write!(f, "connection test failed: {}", msg),
        }
    }
}

impl Serialize for ProbeFailure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Outcome of a connectivity check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeResult {
    pub reachable: bool,
    pub remote_identifier: Option<String>,
    pub failure_reason: Option<ProbeFailure>,
}

impl ProbeResult {
    pub fn reachable(identifier: impl Into<String>) -> Self {
        Self {
            reachable: true,
            remote_identifier: Some(identifier.into()),
            failure_reason: None,
        }
    }

    pub fn failed(reason: ProbeFailure) -> Self {
        Self {
            reachable: false,
            remote_identifier: None,
            failure_reason: Some(reason),
        }
    }
}

pub struct Prober {
    runner: Arc<dyn RemoteRunner>,
    timeout: Duration,
}

impl Prober {
    /// `timeout` is capped at [`MAX_PROBE_TIMEOUT`]
    pub fn new(runner: Arc<dyn RemoteRunner>, timeout: Duration) -> Self {
        Self {
            runner,
            timeout: timeout.min(MAX_PROBE_TIMEOUT),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[instrument(skip_all, fields(address = %address, port = port))]
    pub async fn probe(
        &self,
        address: &str,
        username: &str,
        secret: &Secret,
        port: u16,
    ) -> ProbeResult {
        let target = RemoteTarget::new(address, username, secret.clone(), port);

        let output = match self.runner.run(&target, PROBE_COMMAND, self.timeout).await {
            Ok(output) => output,
            Err(e) => {
                warn!("probe failed: {e}");
                return ProbeResult::failed(e.into());
            }
        };

        if !output.success() {
            let detail = if output.stderr.trim().is_empty() {
                format!("exit status {}", output.exit_code)
            } else {
                output.stderr.clone()
            };
            warn!("probe command exited with {}", output.exit_code);
            return ProbeResult::failed(ProbeFailure::Other(truncate_detail(&detail)));
        }

        let identifier = match output.stdout.trim() {
            "" | UNKNOWN_HOST => format!("server-{address}"),
            name => name.to_string(),
        };

        debug!("probe succeeded, remote identifies as {identifier}");

        ProbeResult::reachable(identifier)
    }
}
