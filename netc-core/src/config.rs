use crate::{ConfigError, DEFAULT_PORT, DEFAULT_TIMEOUT_MARGIN};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSeconds, DurationSecondsWithFrac};
use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A named probing cadence.
///
/// `duration` bounds the latency probe and `interval` is the gap between its packets, so
/// `interval = 0.01` is 100 packets per second.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TestProfile {
    pub name: String,
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(rename = "duration_seconds")]
    pub duration: Duration,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    #[serde(rename = "interval_seconds")]
    pub interval: Duration,
}

impl TestProfile {
    pub fn new(
        name: &str,
        duration_seconds: u64,
        interval_seconds: f64,
    ) -> Result<Self, ConfigError> {
        let interval = Duration::try_from_secs_f64(interval_seconds)
            .map_err(|_| ConfigError::InvalidInterval(name.to_string()))?;
        let profile = Self {
            name: name.to_string(),
            duration: Duration::from_secs(duration_seconds),
            interval,
        };
        profile.validate()?;
        Ok(profile)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyProfileName);
        }
        if self.duration.as_secs() == 0 {
            return Err(ConfigError::ZeroDuration(self.name.clone()));
        }
        if self.interval.is_zero() {
            return Err(ConfigError::InvalidInterval(self.name.clone()));
        }
        Ok(())
    }
}

/// The four cadences every campaign runs when none are configured.
pub fn default_profiles() -> Vec<TestProfile> {
    let profile = |name: &str, interval: Duration| TestProfile {
        name: name.to_string(),
        duration: Duration::from_secs(60),
        interval,
    };

    vec![
        profile("low", Duration::from_millis(100)),
        profile("medium", Duration::from_millis(50)),
        profile("high", Duration::from_millis(10)),
        profile("very_high", Duration::from_millis(2)),
    ]
}

/// Roster, profiles and knobs for one campaign. Read once at startup and not modified after.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignConfig {
    pub hosts: Vec<String>,
    pub profiles: Vec<TestProfile>,
    pub port: u16,
    pub output_dir: PathBuf,
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(rename = "request_timeout_margin_seconds")]
    pub timeout_margin: Duration,
    pub retries: u32,
    pub parallel: bool,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            hosts: vec![],
            profiles: default_profiles(),
            port: DEFAULT_PORT,
            output_dir: PathBuf::from("."),
            timeout_margin: DEFAULT_TIMEOUT_MARGIN,
            retries: 0,
            parallel: false,
        }
    }
}

impl CampaignConfig {
    pub fn new(hosts: &[&str]) -> Self {
        Self {
            hosts: hosts.iter().map(|h| h.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn profiles(mut self, profiles: Vec<TestProfile>) -> Self {
        self.profiles = profiles;
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Strip surrounding whitespace from every roster entry.
    pub fn trim_hosts(mut self) -> Self {
        for host in &mut self.hosts {
            *host = host.trim().to_string();
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hosts.len() < 2 {
            return Err(ConfigError::RosterTooSmall(self.hosts.len()));
        }

        let mut seen = HashSet::new();
        for host in &self.hosts {
            let host = host.trim();
            if host.is_empty() {
                return Err(ConfigError::EmptyHost);
            }
            if !validate_host(host) {
                return Err(ConfigError::InvalidHost(host.to_string()));
            }
            if !seen.insert(host) {
                return Err(ConfigError::DuplicateHost(host.to_string()));
            }
        }

        if self.profiles.is_empty() {
            return Err(ConfigError::NoProfiles);
        }

        let mut seen = HashSet::new();
        for profile in &self.profiles {
            profile.validate()?;
            if !seen.insert(profile.name.as_str()) {
                return Err(ConfigError::DuplicateProfile(profile.name.clone()));
            }
        }

        Ok(())
    }
}

/// Probe targets are dotted IPv4 addresses.
pub fn validate_host(host: &str) -> bool {
    host.parse::<Ipv4Addr>().is_ok()
}
