use crate::{error::ProbeError, stop::StopSignal, traits::Probes};
use metrics::counter;
use netc_core::parse::{parse, Metrics, ProbeKind};
use netc_core::MeasurementResult;
use std::time::Duration;
#[allow(unused)]
use tracing::{debug, error, info, instrument, warn};

/// Measures latency and throughput from this host to one target.
///
/// Has no notion of campaigns or rosters; it is the unit the agent exposes remotely.
#[derive(Clone, Debug)]
pub struct MeasurementService<P> {
    probes: P,
}

impl<P: Probes> MeasurementService<P> {
    pub fn new(probes: P) -> Self {
        Self { probes }
    }

    /// Run the latency probe, then the throughput probe. `duration` and `interval` only govern the
    /// latency probe. `None` unless both probes produced metrics.
    #[instrument(name = "measure", skip(self, stop))]
    pub async fn measure(
        &self,
        host: &str,
        duration: Duration,
        interval: Duration,
        stop: StopSignal,
    ) -> Option<MeasurementResult> {
        let output = self
            .probes
            .latency(host, duration, interval, stop.clone())
            .await;
        let latency = metrics_from(ProbeKind::Latency, output).and_then(Metrics::into_latency);

        if stop.is_stopped() {
            return None;
        }

        // Run sequentially: the throughput probe saturates the link the latency probe measures.
        let output = self.probes.throughput(host, stop).await;
        let throughput =
            metrics_from(ProbeKind::Throughput, output).and_then(Metrics::into_throughput);

        let result = MeasurementResult::combine(latency, throughput);
        if result.is_some() {
            counter!("netc.agent.measurements").increment(1);
        } else {
            counter!("netc.agent.failures").increment(1);
            warn!("Measurement against {host} unavailable.");
        }
        result
    }
}

fn metrics_from(kind: ProbeKind, output: Result<String, ProbeError>) -> Option<Metrics> {
    match output {
        Ok(output) => {
            let metrics = parse(kind, &output);
            if metrics.is_none() {
                warn!("Unable to parse {kind} probe output.");
                debug!("Unparsed {kind} output: {output}");
            }
            metrics
        }
        Err(ProbeError::Launch(err)) => {
            error!("Unable to launch {kind} probe: {err}");
            None
        }
        Err(err) => {
            warn!("{kind} probe failed: {err}");
            None
        }
    }
}
