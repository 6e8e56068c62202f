//! Request and error bodies of the remote measurement call.
use crate::{validate_host, TestProfile, DEFAULT_PROBE_INTERVAL_SECONDS, DEFAULT_PROBE_SECONDS};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasureRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<f64>,
}

/// A request that passed validation.
#[derive(Clone, Debug, PartialEq)]
pub struct ProbeTarget {
    pub host: String,
    pub duration: Duration,
    pub interval: Duration,
}

impl MeasureRequest {
    pub fn new(host: &str) -> Self {
        Self {
            host: Some(host.to_string()),
            ..Default::default()
        }
    }

    pub fn for_profile(host: &str, profile: &TestProfile) -> Self {
        Self {
            host: Some(host.to_string()),
            time: Some(profile.duration.as_secs()),
            interval: Some(profile.interval.as_secs_f64()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.host.is_none() && self.time.is_none() && self.interval.is_none()
    }

    pub fn resolve(&self) -> Result<ProbeTarget, MeasureErrorCode> {
        if self.is_empty() {
            return Err(MeasureErrorCode::NoData);
        }

        let host = match self.host.as_deref().map(str::trim) {
            Some(host) if !host.is_empty() => host,
            _ => return Err(MeasureErrorCode::NoHost),
        };
        if !validate_host(host) {
            return Err(MeasureErrorCode::InvalidHost);
        }

        let seconds = self.time.unwrap_or(DEFAULT_PROBE_SECONDS);
        if seconds == 0 {
            return Err(MeasureErrorCode::InvalidParameters);
        }
        let interval = self.interval.unwrap_or(DEFAULT_PROBE_INTERVAL_SECONDS);
        let interval = match Duration::try_from_secs_f64(interval) {
            Ok(interval) if !interval.is_zero() => interval,
            _ => return Err(MeasureErrorCode::InvalidParameters),
        };

        Ok(ProbeTarget {
            host: host.to_string(),
            duration: Duration::from_secs(seconds),
            interval,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasureErrorCode {
    NoData,
    NoHost,
    InvalidHost,
    InvalidParameters,
    MeasurementFailed,
}

impl MeasureErrorCode {
    pub fn message(&self) -> &'static str {
        use MeasureErrorCode::*;
        match self {
            NoData => "No data provided",
            NoHost => "No host provided",
            InvalidHost => "Invalid host provided, expected an IPv4 address",
            InvalidParameters => "Invalid time or interval provided",
            MeasurementFailed => "Failed to measure network performance",
        }
    }
}

impl std::fmt::Display for MeasureErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: MeasureErrorCode,
}

impl From<MeasureErrorCode> for ErrorBody {
    fn from(code: MeasureErrorCode) -> Self {
        Self {
            error: code.message().to_string(),
            code,
        }
    }
}
