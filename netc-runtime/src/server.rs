use crate::{measure::MeasurementService, stop::StopSignal, traits::Probes};
use axum::{
    extract::{rejection::JsonRejection, Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use metrics::counter;
use netc_core::{ErrorBody, MeasureErrorCode, MeasureRequest, MeasurementResult};
use std::{net::SocketAddr, sync::Arc};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
#[allow(unused)]
use tracing::{debug, error, info, instrument, warn};

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Address Parsing Error")]
    AddrParseError(#[from] std::net::AddrParseError),

    #[error("IO Error: {0}")]
    IoError(#[from] std::io::Error),
}

pub(crate) async fn server_task<P>(
    port: u16,
    service: MeasurementService<P>,
    stop: StopSignal,
) -> Result<(), ServerError>
where
    P: Probes + Send + Sync + 'static,
{
    let socket_addr: SocketAddr = format!("0.0.0.0:{port}").parse()?;
    let listener = TcpListener::bind(socket_addr).await?;

    info!("Agent listening on {socket_addr}.");
    serve(listener, service, stop).await
}

/// Serve the agent on a bound listener until `stop` fires.
pub async fn serve<P>(
    listener: TcpListener,
    service: MeasurementService<P>,
    stop: StopSignal,
) -> Result<(), ServerError>
where
    P: Probes + Send + Sync + 'static,
{
    let app = router(service, stop.clone());
    let mut shutdown = stop;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.stopped().await })
        .await?;
    Ok(())
}

/// The agent's HTTP surface: `POST /netc`.
pub fn router<P>(service: MeasurementService<P>, stop: StopSignal) -> Router
where
    P: Probes + Send + Sync + 'static,
{
    let state = AgentState {
        service,
        busy: Mutex::new(()),
        stop,
    };

    Router::new()
        .route("/netc", post(measure::<P>))
        .with_state(Arc::new(state))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

struct AgentState<P> {
    service: MeasurementService<P>,
    // Probes on one host must not overlap; concurrent requests queue here.
    busy: Mutex<()>,
    stop: StopSignal,
}

#[derive(Error, Debug)]
enum HandlerError {
    #[error("Rejected request: {0}")]
    Rejected(MeasureErrorCode),

    #[error("Measurement failed")]
    Failed,
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let (status, code) = match self {
            HandlerError::Rejected(code) => (StatusCode::BAD_REQUEST, code),
            HandlerError::Failed => (
                StatusCode::BAD_GATEWAY,
                MeasureErrorCode::MeasurementFailed,
            ),
        };
        (status, Json(ErrorBody::from(code))).into_response()
    }
}

#[instrument(skip_all)]
async fn measure<P>(
    State(state): State<Arc<AgentState<P>>>,
    payload: Result<Json<MeasureRequest>, JsonRejection>,
) -> Result<Json<MeasurementResult>, HandlerError>
where
    P: Probes + Send + Sync + 'static,
{
    counter!("netc.agent.requests").increment(1);

    let request = match payload {
        Ok(Json(request)) => request,
        // Well-formed JSON with mistyped fields.
        Err(JsonRejection::JsonDataError(rejection)) => {
            debug!("Request fields rejected: {rejection}");
            return Err(HandlerError::Rejected(MeasureErrorCode::InvalidParameters));
        }
        Err(rejection) => {
            debug!("Request body rejected: {rejection}");
            return Err(HandlerError::Rejected(MeasureErrorCode::NoData));
        }
    };
    let target = request.resolve().map_err(HandlerError::Rejected)?;

    let _busy = state.busy.lock().await;
    info!(
        "Measuring {} for {}s at {}s intervals.",
        target.host,
        target.duration.as_secs(),
        target.interval.as_secs_f64()
    );

    state
        .service
        .measure(
            &target.host,
            target.duration,
            target.interval,
            state.stop.clone(),
        )
        .await
        .map(Json)
        .ok_or(HandlerError::Failed)
}
