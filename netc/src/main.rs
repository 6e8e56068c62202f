use anyhow::{anyhow, Context};
use clap::{Args, Parser, Subcommand};
use netc::prelude::*;
use netc_core::{DEFAULT_PROBE_INTERVAL_SECONDS, DEFAULT_PROBE_SECONDS};
use std::path::PathBuf;
#[allow(unused)]
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "netc=info";

#[derive(Parser, Debug)]
#[command(version, about = "Pairwise network quality measurement")]
struct Cli {
    /// Log filter directives, e.g. `netc=debug`. Overrides `RUST_LOG`.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve measurements for a campaign orchestrator
    Agent(AgentCli),
    /// Measure every pair of a roster through their agents
    Campaign(CampaignCli),
    /// Measure one target from this host
    Measure(MeasureCli),
}

#[derive(Args, Debug)]
struct AgentCli {
    #[command(flatten)]
    agent: AgentArgs,
}

#[derive(Args, Debug)]
struct CampaignCli {
    /// TOML campaign configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Roster host; repeat for each agent. Replaces the configured roster.
    #[arg(short('n'), long = "host")]
    hosts: Vec<String>,

    /// Agent port
    #[arg(short, long)]
    port: Option<u16>,

    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    #[arg(long)]
    retries: Option<u32>,

    /// Run test servers concurrently, one probe per host at a time
    #[arg(long)]
    parallel: bool,
}

#[derive(Args, Debug)]
struct MeasureCli {
    /// Target IPv4 address
    #[arg(short('H'), long)]
    host: String,

    /// Latency probe duration in seconds
    #[arg(short, long, default_value_t = DEFAULT_PROBE_SECONDS)]
    time: u64,

    /// Seconds between latency probe packets
    #[arg(short, long, default_value_t = DEFAULT_PROBE_INTERVAL_SECONDS)]
    interval: f64,

    #[arg(long, default_value = netc_core::DEFAULT_PING_PROGRAM)]
    ping: String,

    #[arg(long, default_value = netc_core::DEFAULT_IPERF_PROGRAM)]
    iperf: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref())?;

    match cli.command {
        Command::Agent(cli) => AgentRuntime::new().args(cli.agent).run().await?,
        Command::Campaign(cli) => campaign(cli).await?,
        Command::Measure(cli) => measure(cli).await?,
    }
    Ok(())
}

fn init_tracing(log_level: Option<&str>) -> anyhow::Result<()> {
    let filter = match log_level {
        Some(directives) => EnvFilter::try_new(directives)?,
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

async fn campaign(cli: CampaignCli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => CampaignConfig::load(path)?,
        None => CampaignConfig::default(),
    };
    if !cli.hosts.is_empty() {
        config.hosts = cli.hosts;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }
    if let Some(retries) = cli.retries {
        config.retries = retries;
    }
    config.parallel |= cli.parallel;

    let client = HttpMeasurementClient::new(config.port);
    let campaign = Campaign::new(config, client)?;
    let summary = campaign.run().await?;

    for failure in &summary.failures {
        warn!(
            "Missing {} -> {} ({}): {}",
            failure.test_server, failure.target_server, failure.profile, failure.reason
        );
    }
    info!(
        "{} of {} measurements recorded in {}.",
        summary.succeeded,
        summary.attempted,
        summary.report_path.display()
    );
    Ok(())
}

async fn measure(cli: MeasureCli) -> anyhow::Result<()> {
    let request = MeasureRequest {
        host: Some(cli.host),
        time: Some(cli.time),
        interval: Some(cli.interval),
    };
    let target = request.resolve().map_err(|code| anyhow!(code))?;

    let probes = SystemProbes::new(ProbeCommand::new(&cli.ping), ProbeCommand::new(&cli.iperf));
    let result = MeasurementService::new(probes)
        .measure(
            &target.host,
            target.duration,
            target.interval,
            StopSignal::on_ctrl_c(),
        )
        .await;

    let json = serde_json::to_string_pretty(&result).context("Unable to encode result")?;
    println!("{json}");
    Ok(())
}
