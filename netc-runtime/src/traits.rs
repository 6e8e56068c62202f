use crate::{client::ClientError, error::ProbeError, stop::StopSignal};
use netc_core::{MeasureRequest, MeasurementResult};
use std::time::Duration;

/// The two external probes a measurement needs. Each returns the probe's captured output.
#[trait_variant::make(Probes: Send)]
pub trait LocalProbes {
    /// Run the open-ended latency probe against `host` for `duration`, sending one packet every
    /// `interval`.
    async fn latency(
        &self,
        host: &str,
        duration: Duration,
        interval: Duration,
        stop: StopSignal,
    ) -> Result<String, ProbeError>;

    /// Run the throughput probe against `host` until it finishes on its own.
    async fn throughput(&self, host: &str, stop: StopSignal) -> Result<String, ProbeError>;
}

/// Invokes the measurement service on a remote agent.
#[trait_variant::make(MeasurementClient: Send)]
pub trait LocalMeasurementClient {
    async fn measure(
        &self,
        test_server: &str,
        request: &MeasureRequest,
        timeout: Duration,
    ) -> Result<MeasurementResult, ClientError>;
}
