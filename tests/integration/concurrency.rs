//! Concurrency of a collection cycle
//!
//! Timing assertions use real time with generous margins.

use std::sync::Arc;
use std::time::{Duration, Instant};

use hostwatch::{Collector, CollectorSettings, DataSource};

use crate::helpers::*;

fn hosts(count: usize) -> Vec<hostwatch::HostRecord> {
    (1..=count)
        .map(|i| create_test_host(&format!("10.0.1.{i}")))
        .collect()
}

fn delayed_runner(count: usize, delay: Duration) -> ScriptedRunner {
    (1..=count).fold(ScriptedRunner::new(), |runner, i| {
        runner.host(
            &format!("10.0.1.{i}"),
            Behavior::Delayed(delay, Box::new(healthy("node"))),
        )
    })
}

#[tokio::test]
async fn test_hosts_are_collected_in_parallel() {
    let collector = Collector::new(
        Arc::new(delayed_runner(5, Duration::from_millis(300))),
        CollectorSettings {
            command_timeout: Duration::from_secs(5),
            max_concurrency: 16,
        },
    );

    let started = Instant::now();
    let samples = collector.collect(&hosts(5), true).await;
    let elapsed = started.elapsed();

    assert_eq!(samples.len(), 5);
    assert!(samples.values().all(|s| s.data_source == DataSource::Real));
    assert!(elapsed < Duration::from_millis(1500), "cycle took {elapsed:?}");
}

#[tokio::test]
async fn test_hanging_hosts_do_not_stall_the_cycle() {
    let timeout = Duration::from_millis(300);
    let runner = ScriptedRunner::new()
        .host("10.0.1.1", healthy("node"))
        .host("10.0.1.2", Behavior::Hang)
        .host("10.0.1.3", Behavior::Hang)
        .host("10.0.1.4", Behavior::Hang);
    let collector = Collector::new(
        Arc::new(runner),
        CollectorSettings {
            command_timeout: timeout,
            max_concurrency: 16,
        },
    );

    let started = Instant::now();
    let samples = collector.collect(&hosts(4), true).await;
    let elapsed = started.elapsed();

    assert_eq!(samples.len(), 4);
    assert_eq!(samples["10.0.1.1"].data_source, DataSource::Real);
    // sequential collection would take at least three timeouts
    assert!(elapsed < timeout * 3, "cycle took {elapsed:?}");
}

#[tokio::test]
async fn test_max_concurrency_is_respected() {
    let runner = Arc::new(delayed_runner(6, Duration::from_millis(100)));
    let collector = Collector::new(
        runner.clone(),
        CollectorSettings {
            command_timeout: Duration::from_secs(5),
            max_concurrency: 2,
        },
    );

    let samples = collector.collect(&hosts(6), true).await;

    assert_eq!(samples.len(), 6);
    // each host runs its two commands side by side
    assert!(runner.peak_concurrency() <= 4, "peak {}", runner.peak_concurrency());
    assert_eq!(runner.calls(), 12);
}

#[tokio::test]
async fn test_dropped_cycle_is_cancelled() {
    let runner = Arc::new(delayed_runner(3, Duration::from_secs(5)));
    let collector = Collector::new(runner.clone(), CollectorSettings::default());

    let hosts = hosts(3);
    let result = tokio::time::timeout(
        Duration::from_millis(200),
        collector.collect(&hosts, true),
    )
    .await;

    assert!(result.is_err());

    // aborted tasks never come back to issue more calls
    let calls = runner.calls();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(runner.calls(), calls);
}

#[tokio::test]
async fn test_concurrent_cycles_are_independent() {
    let runner = Arc::new(delayed_runner(3, Duration::from_millis(50)));
    let collector = Collector::new(runner, CollectorSettings::default());
    let hosts = hosts(3);

    let (a, b) = tokio::join!(collector.collect(&hosts, true), collector.collect(&hosts, false));

    assert!(a.values().all(|s| s.data_source == DataSource::Real));
    assert!(b.values().all(|s| s.data_source == DataSource::Simulated));
}
