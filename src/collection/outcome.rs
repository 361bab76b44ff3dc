//! Real-versus-synthetic policy
//!
//! Every host goes through the same two decisions each cycle:
//!
//! ```text
//! decide_mode ──Synthetic──────────────────────────────► PureSynthetic
//!      │
//!      └─Real──► attempt ──Ok(report)──► settle ──────► Real
//!                         └─Err(reason)─► settle ─────► SyntheticFallback
//! ```
//!
//! Both decisions are plain functions so they can be tested without any
//! remote session.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::{
    DataSource, HostRecord, HostStatus, MetricSample, remote::RunnerError, util::truncate_detail,
};

use super::{parsers::RemoteReport, synthetic};

/// Why a real collection attempt was abandoned
#[derive(Debug, Clone, PartialEq)]
pub enum CollectError {
    /// The session could not be established or timed out
    Transport(RunnerError),

    /// The host rejected the credentials
    Auth,

    /// The remote commands printed something unexpected
    Parse(String),

    /// The host record cannot be used for a remote session
    Config(String),

    /// A remote command exited non-zero
    CommandFailed { exit_code: i32, detail: String },

    /// The collection task itself broke down
    Internal(String),
}

impl From<RunnerError> for CollectError {
    fn from(err: RunnerError) -> Self {
        match err {
            RunnerError::AuthenticationFailed => CollectError::Auth,
            RunnerError::InvalidTarget(msg) => CollectError::Config(msg),
            other => CollectError::Transport(other),
        }
    }
}

impl fmt::Display for CollectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectError::Transport(err) => write!(f, "{}", err),
            CollectError::Auth => write!(f, "authentication failed"),
            CollectError::Parse(msg) => write!(f, "unexpected command output: {}", msg),
            CollectError::Config(msg) => write!(f, "invalid host configuration: {}", msg),
            CollectError::CommandFailed { exit_code, detail } if detail.is_empty() => {
                write!(f, "remote command exited with status {}", exit_code)
            }
            CollectError::CommandFailed { exit_code, detail } => {
                write!(f, "remote command exited with status {}: {}", exit_code, detail)
            }
            CollectError::Internal(msg) => write!(f, "collection task failed: {}", msg),
        }
    }
}

impl std::error::Error for CollectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CollectError::Transport(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionMode {
    Real,
    Synthetic,
}

/// Pick the collection mode for one host
///
/// Simulated hosts, hosts without a secret and cycles where the caller
/// disabled real attempts all go synthetic.
pub fn decide_mode(host: &HostRecord, prefer_real: bool) -> CollectionMode {
    if !prefer_real || host.simulated || host.secret.is_blank() {
        CollectionMode::Synthetic
    } else {
        CollectionMode::Real
    }
}

/// Result of collecting one host
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionOutcome {
    /// Numbers read from the host
    Real(MetricSample),

    /// Real collection failed; placeholder numbers, host marked offline
    SyntheticFallback {
        sample: MetricSample,
        reason: CollectError,
    },

    /// Synthetic on purpose
    PureSynthetic(MetricSample),
}

impl CollectionOutcome {
    pub fn sample(&self) -> &MetricSample {
        match self {
            CollectionOutcome::Real(sample)
            | CollectionOutcome::PureSynthetic(sample)
            | CollectionOutcome::SyntheticFallback { sample, .. } => sample,
        }
    }

    pub fn into_sample(self) -> MetricSample {
        match self {
            CollectionOutcome::Real(sample)
            | CollectionOutcome::PureSynthetic(sample)
            | CollectionOutcome::SyntheticFallback { sample, .. } => sample,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, CollectionOutcome::SyntheticFallback { .. })
    }
}

/// Outcome for a host that skips the remote attempt
pub fn synthesize(host: &HostRecord, now: DateTime<Utc>) -> CollectionOutcome {
    CollectionOutcome::PureSynthetic(synthetic::generate(host, now))
}

/// Turn the result of a real attempt into the host's outcome
///
/// A sample is either entirely real or entirely replaced: there is no
/// partially-real fallback.
pub fn settle(
    host: &HostRecord,
    attempt: Result<RemoteReport, CollectError>,
    now: DateTime<Utc>,
) -> CollectionOutcome {
    match attempt {
        Ok(report) => {
            let (load_1, load_5, load_15) = report.load;
            CollectionOutcome::Real(MetricSample {
                address: host.address.clone(),
                display_name: host.display_name.clone(),
                cpu_percent: report.cpu_percent,
                memory_percent: report.memory_percent,
                disk_percent: report.disk_percent,
                load_1,
                load_5,
                load_15,
                uptime_text: report.uptime_text,
                status: HostStatus::Online,
                data_source: DataSource::Real,
                error_detail: None,
                observed_at: now,
            })
        }
        Err(reason) => fallback(host, reason, now),
    }
}

/// Offline placeholder carrying `reason`
pub fn fallback(host: &HostRecord, reason: CollectError, now: DateTime<Utc>) -> CollectionOutcome {
    let mut sample = synthetic::generate(host, now);
    sample.status = HostStatus::Offline;
    sample.data_source = DataSource::SimulatedFallback;
    sample.error_detail = Some(truncate_detail(&reason.to_string()));

    CollectionOutcome::SyntheticFallback { sample, reason }
}
