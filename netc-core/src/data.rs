use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Round-trip and loss figures from one latency probe run.
///
/// Only ever constructed fully populated: a probe run whose summary cannot be read produces no
/// `LatencyMetrics` at all rather than a partially filled one. The two optional fields depend on
/// the probe tool's version and are absent when it does not report them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LatencyMetrics {
    #[serde(rename = "rtt_min")]
    pub min: f64,
    #[serde(rename = "rtt_avg")]
    pub avg: f64,
    #[serde(rename = "rtt_max")]
    pub max: f64,
    #[serde(rename = "rtt_mdev")]
    pub mean_deviation: f64,
    #[serde(rename = "rtt_ipg", default)]
    pub inter_packet_gap: Option<f64>,
    #[serde(rename = "rtt_ewma", default)]
    pub ewma: Option<f64>,
    #[serde(rename = "packet_loss")]
    pub packet_loss_percent: f64,
    pub packets_transmitted: u64,
    pub packets_received: u64,
}

/// Send and receive rates from one throughput probe run.
///
/// Either side may be missing on its own. A value with neither side cannot be constructed through
/// [`ThroughputMetrics::new`] nor deserialized.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawThroughput")]
pub struct ThroughputMetrics {
    pub send_rate: Option<Rate>,
    pub receive_rate: Option<Rate>,
}

impl ThroughputMetrics {
    pub fn new(send_rate: Option<Rate>, receive_rate: Option<Rate>) -> Option<Self> {
        if send_rate.is_none() && receive_rate.is_none() {
            None
        } else {
            Some(Self {
                send_rate,
                receive_rate,
            })
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Throughput needs a send or receive rate")]
pub struct MissingRates;

#[derive(Deserialize)]
struct RawThroughput {
    #[serde(default)]
    send_rate: Option<Rate>,
    #[serde(default)]
    receive_rate: Option<Rate>,
}

impl TryFrom<RawThroughput> for ThroughputMetrics {
    type Error = MissingRates;

    fn try_from(raw: RawThroughput) -> Result<Self, Self::Error> {
        ThroughputMetrics::new(raw.send_rate, raw.receive_rate).ok_or(MissingRates)
    }
}

/// A transfer rate as reported by the throughput probe, tagged with its unit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rate {
    pub value: f64,
    pub unit: RateUnit,
}

impl Rate {
    pub fn new(value: f64, unit: RateUnit) -> Self {
        Self { value, unit }
    }

    pub fn bits_per_second(&self) -> f64 {
        self.value * self.unit.bits_per_second()
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr)]
pub enum RateUnit {
    Bits,
    Kbits,
    Mbits,
    Gbits,
    Tbits,
    Bytes,
    KBytes,
    MBytes,
    GBytes,
    TBytes,
}

impl RateUnit {
    pub fn as_str(&self) -> &'static str {
        use RateUnit::*;
        match self {
            Bits => "bits/sec",
            Kbits => "Kbits/sec",
            Mbits => "Mbits/sec",
            Gbits => "Gbits/sec",
            Tbits => "Tbits/sec",
            Bytes => "Bytes/sec",
            KBytes => "KBytes/sec",
            MBytes => "MBytes/sec",
            GBytes => "GBytes/sec",
            TBytes => "TBytes/sec",
        }
    }

    pub fn bits_per_second(&self) -> f64 {
        use RateUnit::*;
        // iperf3 scales by 1000 for bits and by 1024 for bytes.
        match self {
            Bits => 1.,
            Kbits => 1e3,
            Mbits => 1e6,
            Gbits => 1e9,
            Tbits => 1e12,
            Bytes => 8.,
            KBytes => 8. * 1024.,
            MBytes => 8. * 1024. * 1024.,
            GBytes => 8. * 1024. * 1024. * 1024.,
            TBytes => 8. * 1024. * 1024. * 1024. * 1024.,
        }
    }
}

impl fmt::Display for RateUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown rate unit {0:?}")]
pub struct UnknownRateUnit(pub String);

impl FromStr for RateUnit {
    type Err = UnknownRateUnit;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use RateUnit::*;
        Ok(match s {
            "bits/sec" => Bits,
            "Kbits/sec" => Kbits,
            "Mbits/sec" => Mbits,
            "Gbits/sec" => Gbits,
            "Tbits/sec" => Tbits,
            "Bytes/sec" => Bytes,
            "KBytes/sec" => KBytes,
            "MBytes/sec" => MBytes,
            "GBytes/sec" => GBytes,
            "TBytes/sec" => TBytes,
            other => return Err(UnknownRateUnit(other.to_string())),
        })
    }
}

/// Latency and throughput of one target, seen from one host.
///
/// Serializes as a single flat object; the two halves have disjoint field names.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeasurementResult {
    #[serde(flatten)]
    pub latency: LatencyMetrics,
    #[serde(flatten)]
    pub throughput: ThroughputMetrics,
}

impl MeasurementResult {
    /// Both halves must be present. A measurement where only one probe succeeded is discarded.
    pub fn combine(
        latency: Option<LatencyMetrics>,
        throughput: Option<ThroughputMetrics>,
    ) -> Option<Self> {
        match (latency, throughput) {
            (Some(latency), Some(throughput)) => Some(Self {
                latency,
                throughput,
            }),
            _ => None,
        }
    }
}

/// One successful pairwise measurement, stamped with where and how it was taken.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TestRecord {
    pub test_server: String,
    pub target_server: String,
    pub test_type: String,
    pub timestamp: String,
    #[serde(flatten)]
    pub result: MeasurementResult,
}

/// All records of one campaign, in work-list order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Report {
    pub start_timestamp: String,
    pub records: Vec<TestRecord>,
}

impl Report {
    pub fn new(start_timestamp: impl Into<String>) -> Self {
        Self {
            start_timestamp: start_timestamp.into(),
            records: vec![],
        }
    }

    pub fn push(&mut self, record: TestRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
