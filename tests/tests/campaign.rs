#![cfg(target_os = "linux")]

use mock_agent::MockAgent;
use netc::prelude::*;
use netc_runtime::ClientError;
use std::time::Duration;

mod utils;
use utils::{fleet, init, loopback};

fn profiles() -> Vec<TestProfile> {
    vec![
        TestProfile::new("low", 1, 0.1).unwrap(),
        TestProfile::new("high", 1, 0.01).unwrap(),
    ]
}

fn read_report(summary: &CampaignSummary) -> Vec<TestRecord> {
    serde_json::from_slice(&std::fs::read(&summary.report_path).unwrap()).unwrap()
}

#[tokio::test]
async fn campaign_over_http() {
    init();
    let dir = tempfile::tempdir().unwrap();

    let agents = [
        (loopback(1), MockAgent::new().fail_target("127.0.0.3")),
        (loopback(2), MockAgent::new()),
        (loopback(3), MockAgent::new()),
    ];
    let port = fleet(&agents).await;

    let config = CampaignConfig::new(&["127.0.0.1", "127.0.0.2", "127.0.0.3"])
        .profiles(profiles())
        .port(port)
        .output_dir(dir.path());
    let campaign = Campaign::new(config, HttpMeasurementClient::new(port)).unwrap();
    let summary = campaign.run().await.unwrap();

    assert_eq!(summary.attempted, 12);
    assert_eq!(summary.succeeded, 10);
    assert_eq!(summary.failures.len(), 2);
    assert!(summary
        .failures
        .iter()
        .all(|f| f.test_server == "127.0.0.1" && f.target_server == "127.0.0.3"));

    for (_, agent) in &agents {
        assert_eq!(agent.requests(), 4);
    }

    let records = read_report(&summary);
    assert_eq!(records.len(), 10);
    let low = records
        .iter()
        .find(|r| r.test_server == "127.0.0.2" && r.test_type == "low")
        .unwrap();
    assert_eq!(low.target_server, "127.0.0.1");
    assert_eq!(low.result.latency.avg, 100.);
    let high = records
        .iter()
        .find(|r| r.test_server == "127.0.0.2" && r.test_type == "high")
        .unwrap();
    assert_eq!(high.result.latency.avg, 10.);

    // Ten record files plus the report.
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 11);
}

#[tokio::test]
async fn unreachable_agent_is_skipped() {
    init();
    let dir = tempfile::tempdir().unwrap();

    let agents = [
        (loopback(1), MockAgent::new()),
        (loopback(2), MockAgent::new()),
    ];
    let port = fleet(&agents).await;

    // Nothing listens on 127.0.0.4.
    let config = CampaignConfig::new(&["127.0.0.1", "127.0.0.2", "127.0.0.4"])
        .profiles(profiles())
        .port(port)
        .output_dir(dir.path());
    let campaign = Campaign::new(config, HttpMeasurementClient::new(port)).unwrap();
    let summary = campaign.run().await.unwrap();

    assert_eq!(summary.succeeded, 8);
    assert_eq!(summary.failures.len(), 4);
    assert!(summary.failures.iter().all(|f| f.test_server == "127.0.0.4"));
    assert_eq!(read_report(&summary).len(), 8);
}

#[tokio::test]
async fn stalled_agent_times_out() {
    init();
    let dir = tempfile::tempdir().unwrap();

    let agents = [
        (loopback(1), MockAgent::new().delay(Duration::from_secs(5))),
        (loopback(2), MockAgent::new()),
    ];
    let port = fleet(&agents).await;

    let mut config = CampaignConfig::new(&["127.0.0.1", "127.0.0.2"])
        .profiles(vec![TestProfile::new("low", 1, 0.1).unwrap()])
        .port(port)
        .output_dir(dir.path());
    config.timeout_margin = Duration::from_secs(1);
    config.parallel = true;
    let campaign = Campaign::new(config, HttpMeasurementClient::new(port)).unwrap();
    let summary = campaign.run().await.unwrap();

    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].test_server, "127.0.0.1");
    assert_eq!(summary.failures[0].reason, ClientError::Timeout.to_string());
}
