//! `RemoteRunner` backed by the OpenSSH client driven through `sshpass`
//!
//! ## Invocation
//!
//! ```text
//! sshpass -e ssh -o StrictHostKeyChecking=no -o ConnectTimeout=N ... \
//!     -p <port> -l <username> -- <address> <command>
//! ```
//!
//! The secret travels through the `SSHPASS` environment variable of the
//! child process, never through its argument list. The child is killed when
//! the session timeout fires.

use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument, trace};

use crate::util::{redact, truncate_detail};

use super::{CommandOutput, RemoteRunner, RemoteTarget, RunnerError, RunnerResult};

/// Program spawned by default
pub const DEFAULT_PROGRAM: &str = "sshpass";

/// Environment variable `sshpass -e` reads the password from
const SSHPASS_ENV: &str = "SSHPASS";

/// Exit status of `ssh` itself when the connection failed
const SSH_TRANSPORT_FAILURE: i32 = 255;

/// `sshpass`: incorrect password
const SSHPASS_BAD_PASSWORD: i32 = 5;

/// `sshpass`: host public key unknown
const SSHPASS_HOST_KEY_UNKNOWN: i32 = 6;

/// `sshpass` own failures (bad arguments, runtime error, parse error)
const SSHPASS_OWN_FAILURES: std::ops::RangeInclusive<i32> = 1..=4;

/// Prefix of every diagnostic `sshpass` prints itself
const SSHPASS_PREFIX: &str = "sshpass:";

/// Program `sshpass` launches
const SSH_PROGRAM: &str = "ssh";

#[derive(Debug, Clone)]
pub struct SshRunner {
    program: String,
}

impl SshRunner {
    pub fn new() -> Self {
        Self::with_program(DEFAULT_PROGRAM)
    }

    /// Use another `sshpass` binary, e.g. an absolute path
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Argument vector passed to the program
    pub fn build_args(target: &RemoteTarget, command: &str, timeout: Duration) -> Vec<String> {
        let connect_timeout = timeout.as_secs().max(1);
        vec![
            "-e".to_string(),
            "ssh".to_string(),
            "-o".to_string(),
            "StrictHostKeyChecking=no".to_string(),
            "-o".to_string(),
            "LogLevel=ERROR".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={connect_timeout}"),
            "-o".to_string(),
            "NumberOfPasswordPrompts=1".to_string(),
            "-p".to_string(),
            target.port.to_string(),
            "-l".to_string(),
            target.username.clone(),
            "--".to_string(),
            target.address.clone(),
            command.to_string(),
        ]
    }
}

impl Default for SshRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteRunner for SshRunner {
    #[instrument(skip_all, fields(address = %target.address, port = target.port))]
    async fn run(
        &self,
        target: &RemoteTarget,
        command: &str,
        timeout: Duration,
    ) -> RunnerResult<CommandOutput> {
        target.validate()?;

        trace!("spawning {} for remote command", self.program);

        let child = Command::new(&self.program)
            .args(Self::build_args(target, command, timeout))
            .env(SSHPASS_ENV, target.secret.expose())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => RunnerError::ExecutableMissing(self.program.clone()),
                _ => RunnerError::Unknown(truncate_detail(&e.to_string())),
            })?;

        // dropping the future drops the child, which kills it
        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(RunnerError::Unknown(truncate_detail(&e.to_string()))),
            Err(_) => {
                debug!("session exceeded {timeout:?}, killed");
                return Err(RunnerError::ConnectionTimeout);
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = redact(
            &String::from_utf8_lossy(&output.stderr),
            target.secret.expose(),
        );

        let Some(exit_code) = output.status.code() else {
            return Err(RunnerError::Unknown(
                "remote session terminated by signal".to_string(),
            ));
        };

        if let Some(err) = classify_exit(exit_code, &stderr) {
            debug!("session failed with exit code {exit_code}: {err}");
            return Err(err);
        }

        trace!("remote command exited with {exit_code}");

        Ok(CommandOutput {
            exit_code,
            stdout,
            stderr,
        })
    }
}

/// Map exit codes owned by `ssh`/`sshpass` onto runner errors
///
/// Returns `None` when the exit code belongs to the remote command.
pub fn classify_exit(exit_code: i32, stderr: &str) -> Option<RunnerError> {
    match exit_code {
        SSH_TRANSPORT_FAILURE => Some(classify_stderr(stderr)),
        SSHPASS_BAD_PASSWORD => Some(RunnerError::AuthenticationFailed),
        SSHPASS_HOST_KEY_UNKNOWN => Some(RunnerError::Unknown(
            "host key verification failed".to_string(),
        )),
        code if SSHPASS_OWN_FAILURES.contains(&code)
            && stderr.trim_start().starts_with(SSHPASS_PREFIX) =>
        {
            Some(classify_sshpass(stderr))
        }
        _ => None,
    }
}

/// `sshpass` gave up before `ssh` produced anything
fn classify_sshpass(stderr: &str) -> RunnerError {
    if stderr.to_lowercase().contains("failed to run command") {
        return RunnerError::ExecutableMissing(SSH_PROGRAM.to_string());
    }

    RunnerError::Unknown(truncate_detail(stderr))
}

/// Categorize the diagnostics `ssh` printed before giving up
pub fn classify_stderr(stderr: &str) -> RunnerError {
    let lower = stderr.to_lowercase();

    if lower.contains("permission denied") || lower.contains("authentication failed") {
        return RunnerError::AuthenticationFailed;
    }

    if lower.contains("timed out") {
        return RunnerError::ConnectionTimeout;
    }

    const UNREACHABLE: [&str; 5] = [
        "connection refused",
        "no route to host",
        "could not resolve hostname",
        "network is unreachable",
        "name or service not known",
    ];
    if UNREACHABLE.iter().any(|needle| lower.contains(needle)) {
        return RunnerError::ConnectionRefusedOrUnreachable(truncate_detail(stderr));
    }

    if stderr.trim().is_empty() {
        return RunnerError::Unknown(format!("ssh exited with status {SSH_TRANSPORT_FAILURE}"));
    }

    RunnerError::Unknown(truncate_detail(stderr))
}
