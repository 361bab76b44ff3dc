//! Remote command execution
//!
//! Every invocation opens its own short-lived session to one host, runs a
//! single command inside the remote shell and returns what it printed.
//! Sessions are never pooled: a hung peer can only ever block the one call
//! that talks to it, and the call is bounded by its timeout.
//!
//! ## Design
//!
//! - **Trait-based**: `RemoteRunner` lets the collector and prober run
//!   against a scripted fake in tests
//! - **Argument vectors only**: no host or user input is ever spliced into
//!   a local shell string; address and username are allow-listed first
//! - **Categorized failures**: transport problems map onto `RunnerError`
//!   variants that callers can act on without parsing text

pub mod error;
pub mod ssh;
pub mod validate;

use std::time::Duration;

use async_trait::async_trait;

use crate::{HostRecord, Secret};

pub use error::{RunnerError, RunnerResult};
pub use ssh::SshRunner;

/// Connection parameters for a single remote invocation
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteTarget {
    pub address: String,
    pub username: String,
    pub secret: Secret,
    pub port: u16,
}

impl RemoteTarget {
    pub fn new(
        address: impl Into<String>,
        username: impl Into<String>,
        secret: Secret,
        port: u16,
    ) -> Self {
        Self {
            address: address.into(),
            username: username.into(),
            secret,
            port,
        }
    }

    /// Check address, username and port against the allow-lists
    pub fn validate(&self) -> RunnerResult<()> {
        validate::validate_address(&self.address)
            .and_then(|_| validate::validate_username(&self.username))
            .and_then(|_| validate::validate_port(self.port))
            .map_err(RunnerError::InvalidTarget)
    }
}

impl From<&HostRecord> for RemoteTarget {
    fn from(host: &HostRecord) -> Self {
        Self {
            address: host.address.clone(),
            username: host.username.clone(),
            secret: host.secret.clone(),
            port: host.port,
        }
    }
}

/// What a remote command left behind
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Executes one command on one host
///
/// Implementations must bound the whole call (connect, execute, drain
/// output) by `timeout` and must not retry. Errors must never contain the
/// target's secret.
#[async_trait]
pub trait RemoteRunner: Send + Sync {
    async fn run(
        &self,
        target: &RemoteTarget,
        command: &str,
        timeout: Duration,
    ) -> RunnerResult<CommandOutput>;
}
