//! Error types for remote command execution

use std::fmt;

/// Result type alias for runner operations
pub type RunnerResult<T> = Result<T, RunnerError>;

/// Reasons a remote invocation produced no usable output
///
/// None of the variants ever carries the target's secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunnerError {
    /// The remote side rejected the username/secret pair
    AuthenticationFailed,

    /// No answer within the session timeout
    ConnectionTimeout,

    /// The host refused the connection or could not be reached at all
    ConnectionRefusedOrUnreachable(String),

    /// The local remote-exec tool is not installed
    ExecutableMissing(String),

    /// Address, username or port failed validation; nothing was spawned
    InvalidTarget(String),

    /// Anything else, with a redacted and truncated detail
    Unknown(String),
}

impl RunnerError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, RunnerError::ConnectionTimeout)
    }
}

impl fmt::Display for RunnerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunnerError::AuthenticationFailed => write!(f, "authentication failed"),
            RunnerError::ConnectionTimeout => write!(f, "connection timed out"),
            RunnerError::ConnectionRefusedOrUnreachable(msg) => {
                write!(f, "host refused or unreachable: {}", msg)
            }
            RunnerError::ExecutableMissing(program) => {
                write!(f, "remote execution tool '{}' is not installed", program)
            }
            RunnerError::InvalidTarget(msg) => write!(f, "invalid target: {}", msg),
            RunnerError::Unknown(msg) => write!(f, "remote execution failed: {}", msg),
        }
    }
}

impl std::error::Error for RunnerError {}
