use super::store::StoreError;
use netc_core::ConfigError;
use thiserror::Error;

/// Errors that end a campaign. A failed pair is never one of them.
#[derive(Error, Debug)]
pub enum CampaignError {
    #[error("Invalid campaign configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}
