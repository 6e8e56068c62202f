use crate::traits::MeasurementClient;
use netc_core::{ErrorBody, MeasureErrorCode, MeasureRequest, MeasurementResult};
use reqwest::{Client, StatusCode};
use std::net::Ipv6Addr;
use std::time::Duration;
use thiserror::Error;
#[allow(unused)]
use tracing::{debug, error, instrument, trace};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Request timed out")]
    Timeout,

    #[error("Transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Agent answered with HTTP {0}")]
    Status(StatusCode),

    #[error("Agent reported: {message}")]
    Agent {
        code: MeasureErrorCode,
        message: String,
    },
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(err)
        }
    }
}

/// Calls `POST /netc` on agents listening on a fixed port.
#[derive(Clone, Debug)]
pub struct HttpMeasurementClient {
    client: Client,
    port: u16,
}

impl HttpMeasurementClient {
    pub fn new(port: u16) -> Self {
        Self {
            client: Client::new(),
            port,
        }
    }

    pub fn url(&self, test_server: &str) -> String {
        if test_server.parse::<Ipv6Addr>().is_ok() {
            format!("http://[{test_server}]:{}/netc", self.port)
        } else {
            format!("http://{test_server}:{}/netc", self.port)
        }
    }
}

impl MeasurementClient for HttpMeasurementClient {
    #[instrument(skip(self, request))]
    async fn measure(
        &self,
        test_server: &str,
        request: &MeasureRequest,
        timeout: Duration,
    ) -> Result<MeasurementResult, ClientError> {
        let res = self
            .client
            .post(self.url(test_server))
            .timeout(timeout)
            .json(request)
            .send()
            .await?;

        let status = res.status();
        if status.is_success() {
            return Ok(res.json().await?);
        }

        match res.json::<ErrorBody>().await {
            Ok(body) => Err(ClientError::Agent {
                code: body.code,
                message: body.error,
            }),
            Err(err) => {
                trace!("Error body not understood: {err}");
                Err(ClientError::Status(status))
            }
        }
    }
}
