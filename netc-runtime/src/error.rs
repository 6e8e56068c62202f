use std::process::ExitStatus;
use thiserror::Error;

/// Why a probe produced no output worth parsing.
///
/// None of these are fatal: the measurement service logs them and reports the measurement as
/// unavailable.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Unable to launch probe: {0}")]
    Launch(#[source] std::io::Error),

    #[error("Probe output pipe was not captured")]
    MissingPipe,

    #[error("Unable to signal probe process: {0}")]
    Signal(#[source] std::io::Error),

    #[error("Error waiting on probe process: {0}")]
    Wait(#[source] std::io::Error),

    #[error("Error reading probe output: {0}")]
    Output(#[source] std::io::Error),

    #[error("Probe output reader stopped unexpectedly: {0}")]
    Reader(#[from] tokio::task::JoinError),

    #[error("Probe exited with {status}: {stderr}")]
    Failed { status: ExitStatus, stderr: String },

    #[error("Probe cancelled by operator")]
    Cancelled,
}
