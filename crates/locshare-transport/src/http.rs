//! HTTP sink posting samples to the collection endpoint.

use std::time::Duration;

use async_trait::async_trait;
use locshare_core::{LocationSample, LocationSink, SharingConfig, traits::SinkError};
use reqwest::{Client, header::CONTENT_TYPE};
use serde_json::Value;

use crate::protocol::{CONTENT_TYPE_JSON, decode_response, encode_sample};

/// Sink that POSTs each sample as JSON.
#[derive(Clone)]
pub struct HttpSink {
    client: Client,
    endpoint: String,
}

impl HttpSink {
    /// Create a sink for `endpoint` with the given request timeout.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, SinkError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SinkError::Transport(e.to_string()))?;
        Ok(Self::with_client(client, endpoint))
    }

    /// Create a sink from the session configuration.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn from_config(config: &SharingConfig) -> Result<Self, SinkError> {
        Self::new(config.endpoint.clone(), config.request_timeout)
    }

    /// Use an existing client.
    #[must_use]
    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl LocationSink for HttpSink {
    async fn send(&self, sample: &LocationSample) -> Result<Value, SinkError> {
        let body = encode_sample(sample)?;
        tracing::debug!(endpoint = %self.endpoint, "Sending location");

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, CONTENT_TYPE_JSON)
            .body(body)
            .send()
            .await
            .map_err(|e| SinkError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        tracing::debug!(status, "API response");

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SinkError::Transport(e.to_string()))?;
        decode_response(status, &bytes)
    }
}
