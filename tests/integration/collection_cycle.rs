//! Full collection cycles against scripted hosts

use std::sync::Arc;
use std::time::Duration;

use hostwatch::{
    Collector, CollectorSettings, DataSource, HostStatus,
    collection::parsers::{DISK_COMMAND, REPORT_COMMAND},
    registry::{HostRegistry, MemoryRegistry},
};
use pretty_assertions::assert_eq;

use crate::helpers::*;

fn settings() -> CollectorSettings {
    CollectorSettings {
        command_timeout: Duration::from_millis(200),
        max_concurrency: 8,
    }
}

#[tokio::test]
async fn test_cycle_returns_one_sample_per_host() {
    let runner = Arc::new(
        ScriptedRunner::new()
            .host("10.0.0.1", healthy("web-01"))
            .host("10.0.0.2", healthy("web-02")),
    );
    let collector = Collector::new(runner.clone(), settings());

    let hosts = vec![
        create_test_host("10.0.0.1"),
        create_test_host("10.0.0.2"),
        create_test_host("10.0.0.3").simulated(true),
    ];

    let samples = collector.collect(&hosts, true).await;

    let keys: Vec<&str> = samples.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["10.0.0.1", "10.0.0.2", "10.0.0.3"]);

    assert_eq!(samples["10.0.0.1"].data_source, DataSource::Real);
    assert_eq!(samples["10.0.0.1"].cpu_percent, 7.3);
    assert_eq!(samples["10.0.0.1"].memory_percent, 2.12);
    assert_eq!(samples["10.0.0.1"].disk_percent, 53.0);
    assert_eq!(samples["10.0.0.3"].data_source, DataSource::Simulated);
    assert_eq!(samples["10.0.0.3"].status, HostStatus::Online);

    // two commands per real host, none for the simulated one
    assert_eq!(runner.calls(), 4);
    let commands = runner.commands();
    assert!(commands.contains(&("10.0.0.1".to_string(), REPORT_COMMAND.to_string())));
    assert!(commands.contains(&("10.0.0.2".to_string(), DISK_COMMAND.to_string())));
    assert!(commands.iter().all(|(address, _)| address != "10.0.0.3"));
}

#[tokio::test]
async fn test_demo_mode_makes_no_remote_calls() {
    let runner = Arc::new(ScriptedRunner::new().host("10.0.0.1", healthy("web-01")));
    let collector = Collector::new(runner.clone(), settings());

    let samples = collector
        .collect(&[create_test_host("10.0.0.1"), create_test_host("10.0.0.2")], false)
        .await;

    assert_eq!(samples.len(), 2);
    assert!(samples.values().all(|s| s.data_source == DataSource::Simulated));
    assert!(samples.values().all(|s| s.is_online()));
    assert_eq!(runner.calls(), 0);
}

#[tokio::test]
async fn test_hosts_without_secret_are_synthetic() {
    let runner = Arc::new(ScriptedRunner::new().host("10.0.0.1", healthy("web-01")));
    let collector = Collector::new(runner.clone(), settings());

    let host = hostwatch::HostRecord::new("10.0.0.1", "ops", "");
    let samples = collector.collect(&[host], true).await;

    assert_eq!(samples["10.0.0.1"].data_source, DataSource::Simulated);
    assert_eq!(runner.calls(), 0);
}

#[tokio::test]
async fn test_empty_host_set() {
    let collector = Collector::new(Arc::new(ScriptedRunner::new()), settings());
    assert!(collector.collect(&[], true).await.is_empty());
}

#[tokio::test]
async fn test_registry_snapshot_is_collected() {
    let runner = Arc::new(ScriptedRunner::new().host("10.0.0.1", healthy("web-01")));
    let collector = Collector::new(runner, settings());
    let registry = MemoryRegistry::with_hosts([create_test_host("10.0.0.1")]);

    let first = collector.collect_registry(&registry, true).await;
    assert_eq!(first.len(), 1);

    registry.add_host(create_test_host("10.0.0.9").simulated(true)).await.unwrap();
    registry.remove_host("10.0.0.1").await.unwrap();

    let second = collector.collect_registry(&registry, true).await;
    assert_eq!(second.keys().collect::<Vec<_>>(), vec!["10.0.0.9"]);
}

#[tokio::test]
async fn test_display_name_and_address_carried_through() {
    let runner = Arc::new(ScriptedRunner::new().host("10.0.0.1", healthy("web-01")));
    let collector = Collector::new(runner, settings());

    let host = create_test_host("10.0.0.1").with_display_name("frontend");
    let samples = collector.collect(&[host], true).await;

    assert_eq!(samples["10.0.0.1"].address, "10.0.0.1");
    assert_eq!(samples["10.0.0.1"].display_name, "frontend");
}

#[tokio::test]
async fn test_samples_serialize_without_secrets() {
    let runner = Arc::new(ScriptedRunner::new().host("10.0.0.1", healthy("web-01")));
    let collector = Collector::new(runner, settings());

    let samples = collector
        .collect(&[create_test_host("10.0.0.1"), create_test_host("10.0.0.2")], true)
        .await;
    let json = serde_json::to_string(&samples).unwrap();

    assert!(!json.contains("s3cr3t-value"));
    assert!(json.contains("\"data_source\":\"real\""));
    assert!(json.contains("\"data_source\":\"simulated_fallback\""));
    assert!(json.contains("\"status\":\"offline\""));
}

#[tokio::test]
async fn test_duplicate_address_keeps_first_record() {
    let runner = Arc::new(ScriptedRunner::new().host(
        "10.0.0.5",
        Behavior::Delayed(Duration::from_millis(100), Box::new(Behavior::Hang)),
    ));
    let collector = Collector::new(runner.clone(), settings());

    let hosts = vec![
        create_test_host("10.0.0.5").simulated(true),
        create_test_host("10.0.0.5"),
    ];
    let samples = collector.collect(&hosts, true).await;

    assert_eq!(samples.len(), 1);
    assert_eq!(samples["10.0.0.5"].data_source, DataSource::Simulated);
    assert_eq!(samples["10.0.0.5"].status, HostStatus::Online);
    assert_eq!(runner.calls(), 0);
}

#[tokio::test]
async fn test_duplicate_address_keeps_first_real_record() {
    let runner = Arc::new(ScriptedRunner::new().host(
        "10.0.0.5",
        Behavior::Delayed(Duration::from_millis(100), Box::new(healthy("web-05"))),
    ));
    let collector = Collector::new(runner.clone(), settings());

    let hosts = vec![
        create_test_host("10.0.0.5").with_display_name("first"),
        create_test_host("10.0.0.5").simulated(true).with_display_name("second"),
    ];
    let samples = collector.collect(&hosts, true).await;

    assert_eq!(samples.len(), 1);
    assert_eq!(samples["10.0.0.5"].data_source, DataSource::Real);
    assert_eq!(samples["10.0.0.5"].display_name, "first");
    assert_eq!(runner.calls(), 2);
}
