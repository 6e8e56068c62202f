#![cfg(unix)]

use netc::prelude::*;
use netc_core::{MeasureErrorCode, RateUnit};
use netc_runtime::{serve, ClientError, MeasurementClient};
use std::time::Duration;

mod utils;
use utils::init;

// Streams until interrupted, then prints its summary the way ping does.
const FAKE_PING: &str = r#"
    trap 'echo "--- $3 ping statistics ---"
          echo "5 packets transmitted, 4 received, 20% packet loss, time 4005ms"
          echo "rtt min/avg/max/mdev = 0.8/1.2/2.4/0.3 ms"
          exit 0' INT
    echo "PING $3 56(84) bytes of data."
    while true; do sleep 0.05; done
"#;

const FAKE_IPERF: &str = r#"
    echo "Connecting to host $2, port 5201"
    echo "[  5]   0.00-10.00  sec  1.09 GBytes   939 Mbits/sec    0             sender"
    echo "[  5]   0.00-10.04  sec  1.09 GBytes   935 Mbits/sec                  receiver"
"#;

fn script(body: &str) -> ProbeCommand {
    ProbeCommand::new("sh").leading_args(["-c", body, "probe"])
}

async fn spawn_agent(probes: SystemProbes) -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let service = MeasurementService::new(probes);
    tokio::spawn(serve(listener, service, StopSignal::never()));
    port
}

#[tokio::test]
async fn agent_runs_probes() {
    init();
    let port = spawn_agent(SystemProbes::new(script(FAKE_PING), script(FAKE_IPERF))).await;
    let client = HttpMeasurementClient::new(port);

    let request = MeasureRequest {
        host: Some("10.0.0.2".to_string()),
        time: Some(1),
        interval: Some(0.2),
    };
    let result = client
        .measure("127.0.0.1", &request, Duration::from_secs(10))
        .await
        .unwrap();

    assert_eq!(result.latency.packets_transmitted, 5);
    assert_eq!(result.latency.packets_received, 4);
    assert_eq!(result.latency.packet_loss_percent, 20.);
    assert_eq!(result.latency.avg, 1.2);
    let send = result.throughput.send_rate.unwrap();
    assert_eq!(send.value, 939.);
    assert_eq!(send.unit, RateUnit::Mbits);
    assert_eq!(result.throughput.receive_rate.unwrap().value, 935.);
}

#[tokio::test]
async fn missing_probe_fails_measurement() {
    init();
    let probes = SystemProbes::new(
        script(FAKE_PING),
        ProbeCommand::new("netc-no-such-iperf"),
    );
    let port = spawn_agent(probes).await;
    let client = HttpMeasurementClient::new(port);

    let request = MeasureRequest {
        host: Some("10.0.0.2".to_string()),
        time: Some(1),
        interval: Some(0.2),
    };
    let err = client
        .measure("127.0.0.1", &request, Duration::from_secs(10))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::Agent {
            code: MeasureErrorCode::MeasurementFailed,
            ..
        }
    ));
}

#[tokio::test]
async fn agent_rejects_bad_parameters() {
    init();
    let port = spawn_agent(SystemProbes::new(script(FAKE_PING), script(FAKE_IPERF))).await;
    let client = HttpMeasurementClient::new(port);

    let request = MeasureRequest {
        host: Some("10.0.0.2".to_string()),
        time: Some(0),
        interval: None,
    };
    let err = client
        .measure("127.0.0.1", &request, Duration::from_secs(10))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::Agent {
            code: MeasureErrorCode::InvalidParameters,
            ..
        }
    ));
}
