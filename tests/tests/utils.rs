use mock_agent::MockAgent;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

#[allow(unused)]
pub fn init() {
    static ONCE_LOCK: OnceLock<()> = OnceLock::new();

    ONCE_LOCK.get_or_init(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("netc=debug,mock_agent=debug")),
            )
            .with_test_writer()
            .init();
    });
}

/// Start one mock agent per loopback address, all on the same port, as a fleet would be.
#[allow(unused)]
pub async fn fleet(agents: &[(Ipv4Addr, MockAgent)]) -> u16 {
    let mut port = 0;
    for (ip, agent) in agents {
        let addr = agent
            .spawn(SocketAddr::from((*ip, port)))
            .await
            .expect("Unable to bind mock agent");
        port = addr.port();
    }
    port
}

#[allow(unused)]
pub fn loopback(n: u8) -> Ipv4Addr {
    Ipv4Addr::new(127, 0, 0, n)
}
