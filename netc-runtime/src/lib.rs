pub mod campaign;
pub mod client;
mod error;
pub mod measure;
pub mod probe;
pub mod runtime;
mod server;
pub mod stop;
pub mod traits;

pub use crate::campaign::{Campaign, CampaignError, CampaignSummary, FailedAttempt};
pub use crate::client::{ClientError, HttpMeasurementClient};
pub use crate::error::ProbeError;
pub use crate::measure::MeasurementService;
pub use crate::probe::{ProbeCommand, SystemProbes};
pub use crate::runtime::{AgentArgs, AgentRuntime};
pub use crate::server::{router, serve, ServerError};
pub use crate::stop::{StopHandle, StopSignal};
pub use crate::traits::{MeasurementClient, Probes};
