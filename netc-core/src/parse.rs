//! Metric parsing of raw probe output
//!
//! Probe tools print a human-oriented summary whose exact shape drifts between versions and
//! platforms. Parsing keys off a few anchor lines: if an anchor is missing the probe itself most
//! likely failed (100% loss, unreachable host, no output), so the whole value is `None`. Fields
//! that only some versions print are read when present and left empty otherwise.
use crate::{LatencyMetrics, Rate, ThroughputMetrics};
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

const LOSS_ANCHOR: &str = "packet loss";
const RTT_ANCHORS: [&str; 2] = ["round-trip", "rtt"];
const IPG_EWMA_MARKER: &str = "ipg/ewma";

const SEND_ANCHOR: &str = "sender";
const RECEIVE_ANCHOR: &str = "receiver";
const RATE_WINDOW: &str = "sec";
/// Tokens expected after the rate window: transfer, transfer unit, rate, rate unit.
const RATE_TOKENS: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProbeKind {
    Latency,
    Throughput,
}

impl std::fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeKind::Latency => f.write_str("latency"),
            ProbeKind::Throughput => f.write_str("throughput"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Metrics {
    Latency(LatencyMetrics),
    Throughput(ThroughputMetrics),
}

impl Metrics {
    pub fn into_latency(self) -> Option<LatencyMetrics> {
        match self {
            Metrics::Latency(metrics) => Some(metrics),
            Metrics::Throughput(_) => None,
        }
    }

    pub fn into_throughput(self) -> Option<ThroughputMetrics> {
        match self {
            Metrics::Throughput(metrics) => Some(metrics),
            Metrics::Latency(_) => None,
        }
    }
}

/// Parse the full captured output of one probe run.
pub fn parse(kind: ProbeKind, output: &str) -> Option<Metrics> {
    match kind {
        ProbeKind::Latency => parse_latency(output).map(Metrics::Latency),
        ProbeKind::Throughput => parse_throughput(output).map(Metrics::Throughput),
    }
}

pub fn parse_latency(output: &str) -> Option<LatencyMetrics> {
    let mut loss_line = None;
    let mut rtt_line = None;

    for line in output.lines() {
        if line.contains(LOSS_ANCHOR) {
            loss_line = Some(line);
        } else if line.contains('=') && RTT_ANCHORS.iter().any(|anchor| line.contains(anchor)) {
            rtt_line = Some(line);
        }
    }

    let Some(loss_line) = loss_line else {
        debug!("No packet loss summary in latency output.");
        return None;
    };
    let Some(rtt_line) = rtt_line else {
        debug!("No round-trip summary in latency output.");
        return None;
    };

    let loss = parse_loss_line(loss_line)?;
    let rtt = parse_rtt_line(rtt_line)?;

    if loss.received > loss.transmitted {
        warn!(
            "Latency summary claims {} received of {} transmitted; discarding.",
            loss.received, loss.transmitted
        );
        return None;
    }

    Some(LatencyMetrics {
        min: rtt.min,
        avg: rtt.avg,
        max: rtt.max,
        mean_deviation: rtt.mdev,
        inter_packet_gap: rtt.ipg,
        ewma: rtt.ewma,
        packet_loss_percent: loss.percent,
        packets_transmitted: loss.transmitted,
        packets_received: loss.received,
    })
}

#[derive(Debug, PartialEq)]
struct LossSummary {
    transmitted: u64,
    received: u64,
    percent: f64,
}

/// `10 packets transmitted, 9 received, 10% packet loss, time 9013ms`
///
/// Transmitted and received sit in the first two comma-separated fields. The loss figure is
/// taken from whichever field names the loss, since some versions insert an error count before
/// it.
fn parse_loss_line(line: &str) -> Option<LossSummary> {
    let fields: Vec<&str> = line.split(',').collect();

    let transmitted = leading_token(fields.first()?)?.parse().ok()?;
    let received = leading_token(fields.get(1)?)?.parse().ok()?;

    let loss_field = fields.iter().find(|field| field.contains(LOSS_ANCHOR))?;
    let percent: f64 = leading_token(loss_field)?
        .trim_end_matches('%')
        .parse()
        .ok()?;

    if !(0.0..=100.0).contains(&percent) {
        trace!("Packet loss {percent} out of range.");
        return None;
    }

    Some(LossSummary {
        transmitted,
        received,
        percent,
    })
}

#[derive(Debug, PartialEq)]
struct RttSummary {
    min: f64,
    avg: f64,
    max: f64,
    mdev: f64,
    ipg: Option<f64>,
    ewma: Option<f64>,
}

/// `rtt min/avg/max/mdev = 0.036/0.046/0.065/0.009 ms, pipe 2, ipg/ewma 0.101/0.045 ms`
///
/// The four aggregates are required. Inter-packet gap and EWMA are read either as values five and
/// six of the aggregate list or from a trailing `ipg/ewma` section, whichever the tool printed.
fn parse_rtt_line(line: &str) -> Option<RttSummary> {
    let (_, values) = line.split_once('=')?;
    let mut sections = values.split(',');

    let aggregates: Vec<Option<f64>> = sections
        .next()?
        .split('/')
        .map(first_number)
        .collect();

    let value = |idx: usize| aggregates.get(idx).copied().flatten();

    let mut summary = RttSummary {
        min: value(0)?,
        avg: value(1)?,
        max: value(2)?,
        mdev: value(3)?,
        ipg: value(4),
        ewma: value(5),
    };

    if let Some(section) = sections.find(|s| s.contains(IPG_EWMA_MARKER)) {
        let (ipg, ewma) = ipg_ewma(section);
        summary.ipg = summary.ipg.or(ipg);
        summary.ewma = summary.ewma.or(ewma);
    }

    Some(summary)
}

/// ` ipg/ewma 0.101/0.045 ms`
fn ipg_ewma(section: &str) -> (Option<f64>, Option<f64>) {
    let Some(values) = section
        .split_whitespace()
        .skip_while(|token| !token.contains(IPG_EWMA_MARKER))
        .nth(1)
    else {
        return (None, None);
    };

    let mut values = values.split('/').map(first_number);
    (values.next().flatten(), values.next().flatten())
}

pub fn parse_throughput(output: &str) -> Option<ThroughputMetrics> {
    let mut send_rate = None;
    let mut receive_rate = None;

    for line in output.lines() {
        if line.contains(SEND_ANCHOR) {
            if let Some(rate) = rate_after_window(line) {
                send_rate = Some(rate);
            }
        } else if line.contains(RECEIVE_ANCHOR) {
            if let Some(rate) = rate_after_window(line) {
                receive_rate = Some(rate);
            }
        }
    }

    let metrics = ThroughputMetrics::new(send_rate, receive_rate);
    if metrics.is_none() {
        debug!("No sender or receiver rate in throughput output.");
    }
    metrics
}

/// `[  5]   0.00-10.00  sec  1.10 GBytes   942 Mbits/sec    0             sender`
fn rate_after_window(line: &str) -> Option<Rate> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let window = tokens.iter().position(|token| *token == RATE_WINDOW)?;

    let trailing = &tokens[window + 1..];
    if trailing.len() < RATE_TOKENS {
        trace!("Too few tokens after rate window: {line:?}");
        return None;
    }

    let value = trailing[2].parse().ok()?;
    let unit = trailing[3].parse().ok()?;
    Some(Rate::new(value, unit))
}

fn leading_token(field: &str) -> Option<&str> {
    field.split_whitespace().next()
}

fn first_number(fragment: &str) -> Option<f64> {
    fragment
        .split_whitespace()
        .find_map(|token| token.parse::<f64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RateUnit;

    const LINUX_PING: &str = "\
PING 192.168.88.101 (192.168.88.101) 56(84) bytes of data.
64 bytes from 192.168.88.101: icmp_seq=1 ttl=64 time=0.412 ms
64 bytes from 192.168.88.101: icmp_seq=2 ttl=64 time=0.388 ms
^C
--- 192.168.88.101 ping statistics ---
10 packets transmitted, 9 received, 10% packet loss, time 9013ms
rtt min/avg/max/mdev = 0.301/0.402/0.611/0.087 ms
";

    const FLOOD_PING: &str = "\
--- 10.0.0.2 ping statistics ---
3000 packets transmitted, 3000 received, 0% packet loss, time 5998ms
rtt min/avg/max/mdev = 0.036/0.046/0.065/0.009 ms, pipe 2, ipg/ewma 0.101/0.045 ms
";

    const BSD_PING: &str = "\
--- 10.0.0.2 ping statistics ---
10 packets transmitted, 10 packets received, 0.0% packet loss
round-trip min/avg/max/stddev = 14.512/15.201/16.009/0.604 ms
";

    const IPERF: &str = "\
Connecting to host 192.168.88.101, port 5201
[  5] local 192.168.88.100 port 50866 connected to 192.168.88.101 port 5201
[ ID] Interval           Transfer     Bitrate         Retr  Cwnd
[  5]   0.00-1.00   sec   113 MBytes   948 Mbits/sec    0    379 KBytes
- - - - - - - - - - - - - - - - - - - - - - - - -
[ ID] Interval           Transfer     Bitrate         Retr
[  5]   0.00-10.00  sec  1.10 GBytes   942 Mbits/sec    0             sender
[  5]   0.00-10.04  sec  1.09 GBytes   935 Mbits/sec                  receiver

iperf Done.
";

    #[test]
    fn linux_latency() {
        let metrics = parse_latency(LINUX_PING).unwrap();
        assert_eq!(metrics.packets_transmitted, 10);
        assert_eq!(metrics.packets_received, 9);
        assert_eq!(metrics.packet_loss_percent, 10.);
        assert_eq!(metrics.min, 0.301);
        assert_eq!(metrics.avg, 0.402);
        assert_eq!(metrics.max, 0.611);
        assert_eq!(metrics.mean_deviation, 0.087);
        assert_eq!(metrics.inter_packet_gap, None);
        assert_eq!(metrics.ewma, None);
    }

    #[test]
    fn latency_with_ipg_and_ewma() {
        let metrics = parse_latency(FLOOD_PING).unwrap();
        assert_eq!(metrics.mean_deviation, 0.009);
        assert_eq!(metrics.inter_packet_gap, Some(0.101));
        assert_eq!(metrics.ewma, Some(0.045));
    }

    #[test]
    fn six_value_aggregate_list() {
        let output = "1 packets transmitted, 1 received, 0% packet loss\n\
                      rtt min/avg/max/mdev/ipg/ewma = 1.0/2.0/3.0/0.5/4.0/2.5 ms\n";
        let metrics = parse_latency(output).unwrap();
        assert_eq!(metrics.inter_packet_gap, Some(4.0));
        assert_eq!(metrics.ewma, Some(2.5));
    }

    #[test]
    fn bsd_latency() {
        let metrics = parse_latency(BSD_PING).unwrap();
        assert_eq!(metrics.packets_received, 10);
        assert_eq!(metrics.packet_loss_percent, 0.);
        assert_eq!(metrics.mean_deviation, 0.604);
    }

    #[test]
    fn tolerates_extra_whitespace_and_error_counts() {
        let output = "  10   packets transmitted ,  7 received ,  +3 errors ,  30%  packet loss\n\
                      rtt  min/avg/max/mdev =  1.5 / 2.5 / 3.5 / 0.25  ms\n";
        let metrics = parse_latency(output).unwrap();
        assert_eq!(metrics.packets_received, 7);
        assert_eq!(metrics.packet_loss_percent, 30.);
        assert_eq!(metrics.min, 1.5);
        assert_eq!(metrics.mean_deviation, 0.25);
    }

    #[test]
    fn latency_parse_is_idempotent() {
        for output in [LINUX_PING, FLOOD_PING, BSD_PING] {
            assert_eq!(parse_latency(output), parse_latency(output));
            assert!(parse_latency(output).is_some());
        }
    }

    #[test]
    fn missing_loss_line_is_none() {
        let output = "rtt min/avg/max/mdev = 1.0/2.0/3.0/0.5 ms\n";
        assert_eq!(parse_latency(output), None);
    }

    #[test]
    fn missing_rtt_line_is_none() {
        // Total loss: ping prints no round-trip summary.
        let output = "--- 10.0.0.9 ping statistics ---\n\
                      10 packets transmitted, 0 received, 100% packet loss, time 9211ms\n";
        assert_eq!(parse_latency(output), None);
    }

    #[test]
    fn malformed_required_field_is_none() {
        let output = "ten packets transmitted, 10 received, 0% packet loss\n\
                      rtt min/avg/max/mdev = 1.0/2.0/3.0/0.5 ms\n";
        assert_eq!(parse_latency(output), None);

        let output = "10 packets transmitted, 10 received, 0% packet loss\n\
                      rtt min/avg/max = 1.0/2.0/3.0 ms\n";
        assert_eq!(parse_latency(output), None);

        let output = "10 packets transmitted, 10 received, 0% packet loss\n\
                      rtt min/avg/max/mdev = 1.0/fast/3.0/0.5 ms\n";
        assert_eq!(parse_latency(output), None);
    }

    #[test]
    #[tracing_test::traced_test]
    fn received_above_transmitted_is_rejected() {
        let output = "10 packets transmitted, 12 received, 0% packet loss\n\
                      rtt min/avg/max/mdev = 1.0/2.0/3.0/0.5 ms\n";
        assert_eq!(parse_latency(output), None);
        assert!(logs_contain("12 received of 10 transmitted"));
    }

    #[test]
    fn empty_output() {
        assert_eq!(parse_latency(""), None);
        assert_eq!(parse_throughput(""), None);
    }

    #[test]
    fn iperf_throughput() {
        let metrics = parse_throughput(IPERF).unwrap();
        assert_eq!(metrics.send_rate, Some(Rate::new(942., RateUnit::Mbits)));
        assert_eq!(metrics.receive_rate, Some(Rate::new(935., RateUnit::Mbits)));
    }

    #[test]
    fn short_trailing_tokens_leave_side_absent() {
        let output = "[  5]   0.00-10.00  sec  1.10 GBytes   942 Mbits/sec    0   sender\n\
                      [  5]   0.00-10.04  sec  1.09 GBytes  receiver\n";
        let metrics = parse_throughput(output).unwrap();
        assert!(metrics.send_rate.is_some());
        assert_eq!(metrics.receive_rate, None);
    }

    #[test]
    fn no_rates_is_none() {
        let output = "iperf3: error - unable to connect to server: Connection refused\n";
        assert_eq!(parse_throughput(output), None);

        let output = "[  5]   0.00-10.00  sec  sender\n[  5]   0.00-10.00  sec  receiver\n";
        assert_eq!(parse_throughput(output), None);
    }

    #[test]
    fn summed_streams_win() {
        let output = "\
[  5]   0.00-10.00  sec   500 MBytes   420 Mbits/sec    0             sender
[  7]   0.00-10.00  sec   500 MBytes   420 Mbits/sec    0             sender
[SUM]   0.00-10.00  sec  1000 MBytes   840 Mbits/sec    0             sender
[SUM]   0.00-10.04  sec   998 MBytes   833 Mbits/sec                  receiver
";
        let metrics = parse_throughput(output).unwrap();
        assert_eq!(metrics.send_rate.unwrap().value, 840.);
        assert_eq!(metrics.receive_rate.unwrap().value, 833.);
    }

    #[test]
    fn parse_by_kind() {
        let latency = parse(ProbeKind::Latency, LINUX_PING).unwrap();
        assert!(latency.clone().into_latency().is_some());
        assert!(latency.into_throughput().is_none());

        let throughput = parse(ProbeKind::Throughput, IPERF).unwrap();
        assert!(throughput.into_throughput().is_some());

        assert!(parse(ProbeKind::Throughput, LINUX_PING).is_none());
    }
}
