//! Collector - one collection cycle across a host set
//!
//! ## Message Flow
//!
//! ```text
//! hosts ─┬─► task(host A) ─► decide_mode ─► [runner ×2 ─► parse] ─► settle ─┐
//!        ├─► task(host B) ─► ...                                            ├─► BTreeMap<address, MetricSample>
//!        └─► task(host N) ─► ...                                            ┘
//! ```
//!
//! Host tasks run on a `JoinSet`, at most `max_concurrency` at a time. A
//! cycle therefore takes about as long as its slowest host, not the sum of
//! all hosts. Dropping the `collect` future aborts the whole cycle.

use std::collections::{BTreeMap, HashSet};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::FutureExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, instrument, trace, warn};

use crate::{
    HostRecord, MetricSample,
    registry::HostRegistry,
    remote::{CommandOutput, RemoteRunner, RemoteTarget},
    util::truncate_detail,
};

use super::{
    outcome::{
        CollectError, CollectionMode, CollectionOutcome, decide_mode, fallback, settle, synthesize,
    },
    parsers::{DISK_COMMAND, REPORT_COMMAND, RemoteReport},
};

#[derive(Debug, Clone)]
pub struct CollectorSettings {
    /// Upper bound for one remote session
    pub command_timeout: Duration,

    /// Hosts collected at the same time
    pub max_concurrency: usize,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            command_timeout: Duration::from_secs(12),
            max_concurrency: 16,
        }
    }
}

/// Collects metric samples for whole host sets
///
/// Cheap to clone; clones share the runner.
#[derive(Clone)]
pub struct Collector {
    runner: Arc<dyn RemoteRunner>,
    settings: CollectorSettings,
}

impl Collector {
    pub fn new(runner: Arc<dyn RemoteRunner>, settings: CollectorSettings) -> Self {
        Self { runner, settings }
    }

    pub fn settings(&self) -> &CollectorSettings {
        &self.settings
    }

    /// Run one cycle over `hosts`
    ///
    /// Returns exactly one sample per host with a non-empty address. Never
    /// fails: every failure ends up as an offline fallback sample.
    #[instrument(skip_all, fields(hosts = hosts.len(), prefer_real = prefer_real))]
    pub async fn collect(
        &self,
        hosts: &[HostRecord],
        prefer_real: bool,
    ) -> BTreeMap<String, MetricSample> {
        let permits = Arc::new(Semaphore::new(self.settings.max_concurrency.max(1)));
        let mut tasks = JoinSet::new();
        let mut seen = HashSet::new();

        for host in hosts {
            if host.address.trim().is_empty() {
                warn!(
                    "skipping host record without address (display name {:?})",
                    host.display_name
                );
                continue;
            }

            // first record wins, like `MemoryRegistry::with_hosts`
            if !seen.insert(host.address.as_str()) {
                warn!("skipping duplicate record for {}", host.address);
                continue;
            }

            let host = host.clone();
            let collector = self.clone();
            let permits = permits.clone();

            tasks.spawn(async move {
                // the semaphore is never closed
                let _permit = permits.acquire_owned().await.ok();

                let result = AssertUnwindSafe(collector.collect_host(&host, prefer_real))
                    .catch_unwind()
                    .await;

                let outcome = match result {
                    Ok(outcome) => outcome,
                    Err(panic) => {
                        let message = panic
                            .downcast_ref::<&str>()
                            .map(|s| s.to_string())
                            .or_else(|| panic.downcast_ref::<String>().cloned())
                            .unwrap_or_else(|| "panic".to_string());
                        error!("collection for {} panicked: {message}", host.address);
                        fallback(&host, CollectError::Internal(message), Utc::now())
                    }
                };

                (host.address, outcome)
            });
        }

        let mut samples = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((address, outcome)) => {
                    samples.insert(address, outcome.into_sample());
                }
                Err(e) => error!("collection task failed: {e}"),
            }
        }

        debug!(
            "cycle finished: {} samples, {} online",
            samples.len(),
            samples.values().filter(|s| s.is_online()).count()
        );

        samples
    }

    /// Run one cycle over a snapshot of the registry's host list
    pub async fn collect_registry(
        &self,
        registry: &dyn HostRegistry,
        prefer_real: bool,
    ) -> BTreeMap<String, MetricSample> {
        match registry.list_hosts().await {
            Ok(hosts) => self.collect(&hosts, prefer_real).await,
            Err(e) => {
                error!("failed to read host list: {e}");
                BTreeMap::new()
            }
        }
    }

    /// Collect a single host
    #[instrument(skip_all, fields(address = %host.address))]
    pub async fn collect_host(&self, host: &HostRecord, prefer_real: bool) -> CollectionOutcome {
        match decide_mode(host, prefer_real) {
            CollectionMode::Synthetic => {
                trace!("using synthetic data");
                synthesize(host, Utc::now())
            }
            CollectionMode::Real => {
                let attempt = self.attempt_real(host).await;
                if let Err(reason) = &attempt {
                    warn!("real collection failed, falling back to synthetic data: {reason}");
                }
                settle(host, attempt, Utc::now())
            }
        }
    }

    /// Run the report script and the disk query side by side
    async fn attempt_real(&self, host: &HostRecord) -> Result<RemoteReport, CollectError> {
        let target = RemoteTarget::from(host);
        target.validate()?;

        let timeout = self.settings.command_timeout;
        let (report, disk) = tokio::join!(
            self.runner.run(&target, REPORT_COMMAND, timeout),
            self.runner.run(&target, DISK_COMMAND, timeout),
        );

        let report = exited_cleanly(report?)?;
        let disk = exited_cleanly(disk?)?;

        trace!("received report and disk usage");

        RemoteReport::parse(&report.stdout, &disk.stdout).map_err(CollectError::Parse)
    }
}

fn exited_cleanly(output: CommandOutput) -> Result<CommandOutput, CollectError> {
    if output.success() {
        return Ok(output);
    }

    Err(CollectError::CommandFailed {
        exit_code: output.exit_code,
        detail: truncate_detail(&output.stderr),
    })
}
