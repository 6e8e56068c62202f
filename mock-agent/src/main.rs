use clap::Parser;
use mock_agent::MockAgent;
use std::net::SocketAddr;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(default_value = "0.0.0.0:5000")]
    addr: SocketAddr,

    /// Fail every measurement of this target
    #[arg(short, long)]
    fail: Vec<String>,

    /// Seconds to hold each response
    #[arg(short, long, default_value_t = 0)]
    delay: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mock_agent=debug,tower_http=debug")),
        )
        .init();

    let agent = cli
        .fail
        .iter()
        .fold(MockAgent::new(), |agent, target| agent.fail_target(target))
        .delay(Duration::from_secs(cli.delay));

    agent.run(cli.addr).await?;
    Ok(())
}
