//! Failure handling: every broken host still yields a bounded fallback sample
//!
//! - Timeouts and refused connections
//! - Rejected credentials
//! - Garbled output and failing commands
//! - Panicking collection tasks

use std::sync::Arc;
use std::time::Duration;

use hostwatch::{
    Collector, CollectorSettings, DataSource, HostStatus, MetricSample,
    collection::{
        CollectError, CollectionOutcome,
        synthetic::{CPU_BOUNDS, DISK_BOUNDS, MEMORY_BOUNDS, MIN_LOAD},
    },
    remote::RunnerError,
};
use assert_matches::assert_matches;
use pretty_assertions::assert_eq;

use crate::helpers::*;

fn collector(runner: ScriptedRunner) -> Collector {
    Collector::new(
        Arc::new(runner),
        CollectorSettings {
            command_timeout: Duration::from_millis(150),
            max_concurrency: 8,
        },
    )
}

fn assert_bounded_fallback(sample: &MetricSample) {
    assert_eq!(sample.status, HostStatus::Offline);
    assert_eq!(sample.data_source, DataSource::SimulatedFallback);
    assert!(sample.error_detail.as_ref().is_some_and(|d| !d.is_empty()));
    assert!(sample.error_detail.as_ref().unwrap().chars().count() <= 153);

    assert!((CPU_BOUNDS.0..=CPU_BOUNDS.1).contains(&sample.cpu_percent));
    assert!((MEMORY_BOUNDS.0..=MEMORY_BOUNDS.1).contains(&sample.memory_percent));
    assert!((DISK_BOUNDS.0..=DISK_BOUNDS.1).contains(&sample.disk_percent));
    assert!(sample.load_1 >= MIN_LOAD);
}

#[tokio::test]
async fn test_timing_out_host_falls_back() {
    let collector = collector(ScriptedRunner::new().host("10.0.0.5", Behavior::Hang));

    let samples = collector.collect(&[create_test_host("10.0.0.5")], true).await;
    let sample = &samples["10.0.0.5"];

    assert_bounded_fallback(sample);
    assert!(sample.error_detail.as_ref().unwrap().contains("timed out"));
}

#[tokio::test]
async fn test_failure_is_isolated_to_its_host() {
    let collector = collector(
        ScriptedRunner::new()
            .host("10.0.0.1", healthy("web-01"))
            .host("10.0.0.2", Behavior::Refused)
            .host("10.0.0.3", healthy("web-03")),
    );

    let hosts: Vec<_> = ["10.0.0.1", "10.0.0.2", "10.0.0.3"]
        .into_iter()
        .map(create_test_host)
        .collect();
    let samples = collector.collect(&hosts, true).await;

    assert_eq!(samples["10.0.0.1"].data_source, DataSource::Real);
    assert_eq!(samples["10.0.0.3"].data_source, DataSource::Real);
    assert_bounded_fallback(&samples["10.0.0.2"]);
    assert!(samples["10.0.0.2"].error_detail.as_ref().unwrap().contains("refused"));
}

#[tokio::test]
async fn test_rejected_credentials() {
    let collector = collector(ScriptedRunner::new().host("10.0.0.1", Behavior::AuthFailure));

    let outcome = collector.collect_host(&create_test_host("10.0.0.1"), true).await;

    let reason = assert_matches!(
        outcome,
        CollectionOutcome::SyntheticFallback { ref reason, .. } => reason.clone()
    );
    assert_eq!(reason, CollectError::Auth);
    assert_bounded_fallback(outcome.sample());
}

#[tokio::test]
async fn test_garbled_output_is_parse_failure() {
    let collector = collector(ScriptedRunner::new().host("10.0.0.1", Behavior::Garbage));

    let outcome = collector.collect_host(&create_test_host("10.0.0.1"), true).await;

    assert_matches!(
        outcome,
        CollectionOutcome::SyntheticFallback { reason: CollectError::Parse(_), .. }
    );
    assert_bounded_fallback(outcome.sample());
}

#[tokio::test]
async fn test_failing_command_is_reported() {
    let collector = collector(ScriptedRunner::new().host("10.0.0.1", Behavior::ExitCode(127)));

    let outcome = collector.collect_host(&create_test_host("10.0.0.1"), true).await;

    assert_matches!(
        outcome,
        CollectionOutcome::SyntheticFallback {
            reason: CollectError::CommandFailed { exit_code: 127, .. },
            ..
        }
    );
    assert!(outcome.sample().error_detail.as_ref().unwrap().contains("127"));
}

#[tokio::test]
async fn test_panicking_task_does_not_abort_cycle() {
    let collector = collector(
        ScriptedRunner::new()
            .host("10.0.0.1", Behavior::Panic)
            .host("10.0.0.2", healthy("web-02")),
    );

    let samples = collector
        .collect(&[create_test_host("10.0.0.1"), create_test_host("10.0.0.2")], true)
        .await;

    assert_eq!(samples.len(), 2);
    assert_bounded_fallback(&samples["10.0.0.1"]);
    assert!(samples["10.0.0.1"].error_detail.as_ref().unwrap().contains("exploded"));
    assert_eq!(samples["10.0.0.2"].data_source, DataSource::Real);
}

#[tokio::test]
async fn test_unsafe_address_never_reaches_runner() {
    let runner = Arc::new(ScriptedRunner::new());
    let collector = Collector::new(runner.clone(), CollectorSettings::default());

    let host = create_test_host("10.0.0.1; rm -rf /");
    let outcome = collector.collect_host(&host, true).await;

    assert_matches!(
        outcome,
        CollectionOutcome::SyntheticFallback { reason: CollectError::Config(_), .. }
    );
    assert_eq!(runner.calls(), 0);
}

#[tokio::test]
async fn test_transport_reason_is_kept() {
    let collector = collector(ScriptedRunner::new().host("10.0.0.1", Behavior::Hang));

    let outcome = collector.collect_host(&create_test_host("10.0.0.1"), true).await;

    assert_matches!(
        outcome,
        CollectionOutcome::SyntheticFallback {
            reason: CollectError::Transport(RunnerError::ConnectionTimeout),
            ..
        }
    );
}
