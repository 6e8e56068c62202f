#![doc = include_str!("../../README.md")]

pub use netc_core::{parse, timestamp};
pub use netc_runtime::{campaign, client, measure, probe, runtime, stop};

pub mod prelude {
    pub use netc_core::{
        validate_host, CampaignConfig, MeasureRequest, MeasurementResult, TestProfile, TestRecord,
    };
    pub use netc_runtime::{
        AgentArgs, AgentRuntime, Campaign, CampaignSummary, HttpMeasurementClient,
        MeasurementService, ProbeCommand, StopSignal, SystemProbes,
    };
}
