//! Stand-in for a netc agent. Answers `POST /netc` with canned measurements instead of running
//! probes, and can be told to fail or stall.
use axum::{
    debug_handler,
    extract::{rejection::JsonRejection, Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use metrics::counter;
use netc_core::{
    ErrorBody, LatencyMetrics, MeasureErrorCode, MeasureRequest, MeasurementResult, Rate,
    RateUnit, ThroughputMetrics,
};
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::debug;

#[derive(Clone, Debug, Default)]
pub struct MockAgent {
    failing_targets: Vec<String>,
    delay: Duration,
    requests: Arc<AtomicU64>,
}

impl MockAgent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report a failed measurement whenever `target` is requested.
    pub fn fail_target(mut self, target: &str) -> Self {
        self.failing_targets.push(target.to_string());
        self
    }

    /// Hold every response for `delay`.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/netc", post(measure))
            .with_state(self.clone())
            .layer(TraceLayer::new_for_http())
    }

    /// Bind `addr` and serve in the background. Returns the bound address.
    pub async fn spawn(&self, addr: SocketAddr) -> std::io::Result<SocketAddr> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        let app = self.router();
        tokio::spawn(async move { axum::serve(listener, app).await });
        Ok(addr)
    }

    pub async fn run(&self, addr: SocketAddr) -> std::io::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, self.router()).await
    }
}

pub struct Rejection(StatusCode, MeasureErrorCode);

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        (self.0, Json(ErrorBody::from(self.1))).into_response()
    }
}

#[debug_handler]
async fn measure(
    State(agent): State<MockAgent>,
    payload: Result<Json<MeasureRequest>, JsonRejection>,
) -> Result<Json<MeasurementResult>, Rejection> {
    counter!("mock-agent.requests").increment(1);
    agent.requests.fetch_add(1, Ordering::Relaxed);

    let request = match payload {
        Ok(Json(request)) => request,
        Err(JsonRejection::JsonDataError(_)) => {
            return Err(Rejection(
                StatusCode::BAD_REQUEST,
                MeasureErrorCode::InvalidParameters,
            ))
        }
        Err(_) => return Err(Rejection(StatusCode::BAD_REQUEST, MeasureErrorCode::NoData)),
    };
    let target = request
        .resolve()
        .map_err(|code| Rejection(StatusCode::BAD_REQUEST, code))?;
    debug!("Pretending to measure {}.", target.host);

    tokio::time::sleep(agent.delay).await;

    if agent.failing_targets.contains(&target.host) {
        return Err(Rejection(
            StatusCode::BAD_GATEWAY,
            MeasureErrorCode::MeasurementFailed,
        ));
    }
    Ok(Json(canned_result(target.interval)))
}

/// A clean link; the average round trip echoes the requested interval in milliseconds so tests
/// can tell profiles apart.
pub fn canned_result(interval: Duration) -> MeasurementResult {
    let avg = interval.as_secs_f64() * 1000.;
    MeasurementResult {
        latency: LatencyMetrics {
            min: avg / 2.,
            avg,
            max: avg * 2.,
            mean_deviation: avg / 4.,
            inter_packet_gap: None,
            ewma: None,
            packet_loss_percent: 0.,
            packets_transmitted: 10,
            packets_received: 10,
        },
        throughput: ThroughputMetrics {
            send_rate: Some(Rate::new(941., RateUnit::Mbits)),
            receive_rate: Some(Rate::new(937., RateUnit::Mbits)),
        },
    }
}
