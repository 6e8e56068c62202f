use std::path::PathBuf;
use thiserror::Error;

/// Problems with the roster or the profile set. These are fatal before a campaign starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Roster needs at least two hosts, found {0}")]
    RosterTooSmall(usize),

    #[error("Roster contains an empty host identifier")]
    EmptyHost,

    #[error("Host {0} is not an IPv4 address")]
    InvalidHost(String),

    #[error("Host {0} appears more than once in the roster")]
    DuplicateHost(String),

    #[error("No test profiles configured")]
    NoProfiles,

    #[error("Test profile has an empty name")]
    EmptyProfileName,

    #[error("Test profile {0} is defined more than once")]
    DuplicateProfile(String),

    #[error("Test profile {0} needs a duration of at least one second")]
    ZeroDuration(String),

    #[error("Test profile {0} needs a positive, finite probe interval")]
    InvalidInterval(String),

    #[error("Unable to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Toml(#[from] toml::de::Error),
}
