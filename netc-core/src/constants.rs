use std::time::Duration;

/// Port every agent in the fleet listens on.
pub const DEFAULT_PORT: u16 = 5000;

/// Latency probe duration used when a request does not carry one.
pub const DEFAULT_PROBE_SECONDS: u64 = 10;

/// Latency probe interval used when a request does not carry one.
pub const DEFAULT_PROBE_INTERVAL_SECONDS: f64 = 0.2;

/// Number of equal checkpoints the latency probe duration is divided into.
pub const PROGRESS_CHECKPOINTS: u32 = 4;

/// Added to a profile's duration to get the client-side request timeout. Covers the throughput
/// probe, which runs after the latency probe with its own fixed length.
pub const DEFAULT_TIMEOUT_MARGIN: Duration = Duration::from_secs(30);

/// Delay between retries of a failed pair.
pub const RETRY_BACKOFF: Duration = Duration::from_secs(1);

pub const DEFAULT_PING_PROGRAM: &str = "ping";
pub const DEFAULT_IPERF_PROGRAM: &str = "iperf3";
