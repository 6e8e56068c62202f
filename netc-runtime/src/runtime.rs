//! Default netc agent runtime
//!
//! Serves `POST /netc` so a campaign orchestrator can run probes from this host.
use crate::{
    measure::MeasurementService,
    probe::{ProbeCommand, SystemProbes},
    server::{server_task, ServerError},
    stop::StopSignal,
};
use clap::Args;
use netc_core::{DEFAULT_IPERF_PROGRAM, DEFAULT_PING_PROGRAM, DEFAULT_PORT};
#[allow(unused)]
use tracing::{debug, error, info, instrument};

#[derive(Args, Clone, Debug)]
pub struct AgentArgs {
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Latency probe program
    #[arg(long, default_value = DEFAULT_PING_PROGRAM)]
    pub ping: String,

    /// Throughput probe program
    #[arg(long, default_value = DEFAULT_IPERF_PROGRAM)]
    pub iperf: String,
}

/// Measurement agent.
///
/// # Example
///
/// ```ignore
/// use netc::prelude::*;
///
/// #[tokio::main]
/// async fn main() {
///     AgentRuntime::new()
///         .port(5001)
///         .run()
///         .await
///         .unwrap();
/// }
/// ```
///
/// Binaries with their own CLI flatten [`AgentArgs`] into it and hand the result to
/// [`AgentRuntime::args`].
pub struct AgentRuntime {
    port: u16,
    probes: SystemProbes,
}

impl Default for AgentRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentRuntime {
    pub fn new() -> Self {
        AgentRuntime {
            port: DEFAULT_PORT,
            probes: SystemProbes::default(),
        }
    }

    /// Apply parsed agent flags.
    ///
    /// `-p`, `--port` to set a custom port number (default `5000`)
    ///
    /// `--ping`, `--iperf` to use other probe programs.
    pub fn args(self, args: AgentArgs) -> Self {
        self.port(args.port).probes(SystemProbes::new(
            ProbeCommand::new(&args.ping),
            ProbeCommand::new(&args.iperf),
        ))
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn probes(mut self, probes: SystemProbes) -> Self {
        self.probes = probes;
        self
    }

    /// Serve until Ctrl+C.
    #[instrument(name = "agent", skip_all, fields(port = self.port))]
    pub async fn run(self) -> Result<(), ServerError> {
        let service = MeasurementService::new(self.probes);
        server_task(self.port, service, StopSignal::on_ctrl_c()).await?;
        info!("Agent stopped.");
        Ok(())
    }
}
