//! Probe runner
//!
//! Launches and supervises the external probe tools. The latency probe is started in streaming
//! mode and stopped by us: the duration is slept through in four checkpoints, then the probe gets
//! an interrupt so it prints its summary. An operator stop during the wait kills it outright,
//! since a killed probe prints no summary and the run is treated as failed anyway. The throughput
//! probe runs to completion on its own.
use crate::{error::ProbeError, stop::StopSignal, traits::Probes};
use netc_core::{DEFAULT_IPERF_PROGRAM, DEFAULT_PING_PROGRAM, PROGRESS_CHECKPOINTS};
use process::ProbeProcess;
use std::process::ExitStatus;
use std::time::Duration;
use tokio::process::Command;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

mod process;

/// Program plus any arguments that precede the probe's own.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProbeCommand {
    program: String,
    leading_args: Vec<String>,
}

impl ProbeCommand {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            leading_args: vec![],
        }
    }

    pub fn leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.leading_args);
        command
    }
}

impl std::fmt::Display for ProbeCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.leading_args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Runs `ping` and `iperf3` (or stand-ins) on this host.
#[derive(Clone, Debug)]
pub struct SystemProbes {
    ping: ProbeCommand,
    iperf: ProbeCommand,
}

impl Default for SystemProbes {
    fn default() -> Self {
        Self::new(
            ProbeCommand::new(DEFAULT_PING_PROGRAM),
            ProbeCommand::new(DEFAULT_IPERF_PROGRAM),
        )
    }
}

impl SystemProbes {
    pub fn new(ping: ProbeCommand, iperf: ProbeCommand) -> Self {
        Self { ping, iperf }
    }
}

impl Probes for SystemProbes {
    async fn latency(
        &self,
        host: &str,
        duration: Duration,
        interval: Duration,
        stop: StopSignal,
    ) -> Result<String, ProbeError> {
        let mut command = self.ping.command();
        command
            .arg("-i")
            .arg(interval.as_secs_f64().to_string())
            .arg(host);

        info!(
            "Running latency probe `{}` against {host} for {}.",
            self.ping,
            humantime::format_duration(duration)
        );
        run_open_ended(command, duration, stop).await
    }

    async fn throughput(&self, host: &str, stop: StopSignal) -> Result<String, ProbeError> {
        let mut command = self.iperf.command();
        command.arg("-c").arg(host);

        info!("Running throughput probe `{}` against {host}.", self.iperf);
        run_to_completion(command, stop).await
    }
}

enum Checkpoint {
    Elapsed,
    Exited(Result<ExitStatus, ProbeError>),
    Cancelled,
}

/// Run a probe that never stops on its own for `duration`, then interrupt it and return all of
/// its output.
pub async fn run_open_ended(
    command: Command,
    duration: Duration,
    mut stop: StopSignal,
) -> Result<String, ProbeError> {
    let mut process = ProbeProcess::spawn(command)?;
    let checkpoint = duration / PROGRESS_CHECKPOINTS;

    for quarter in 1..=PROGRESS_CHECKPOINTS {
        let event = tokio::select! {
            _ = tokio::time::sleep(checkpoint) => Checkpoint::Elapsed,
            status = process.wait() => Checkpoint::Exited(status),
            _ = stop.stopped() => Checkpoint::Cancelled,
        };

        match event {
            Checkpoint::Elapsed => {
                info!("{}% complete", quarter * 100 / PROGRESS_CHECKPOINTS);
            }
            Checkpoint::Exited(status) => {
                let status = status?;
                warn!("Probe exited before its duration elapsed ({status}).");
                let output = process.finish().await?;
                return Ok(output.stdout);
            }
            Checkpoint::Cancelled => {
                warn!("Stop requested, terminating probe.");
                process.force_terminate().await?;
                return Err(ProbeError::Cancelled);
            }
        }
    }

    process.request_graceful_stop()?;
    let output = process.finish().await?;
    debug!("Probe finished with {}.", output.status);
    if !output.stderr.trim().is_empty() {
        debug!("Probe stderr: {}", output.stderr.trim());
    }
    Ok(output.stdout)
}

/// Run a probe until it exits. A non-zero exit status is a failed probe.
pub async fn run_to_completion(
    command: Command,
    mut stop: StopSignal,
) -> Result<String, ProbeError> {
    let process = ProbeProcess::spawn(command)?;

    let output = tokio::select! {
        output = process.finish() => output?,
        _ = stop.stopped() => {
            // Dropping the process kills it.
            warn!("Stop requested, terminating probe.");
            return Err(ProbeError::Cancelled);
        }
    };

    if !output.status.success() {
        return Err(ProbeError::Failed {
            status: output.status,
            stderr: output.stderr.trim().to_string(),
        });
    }

    Ok(output.stdout)
}
