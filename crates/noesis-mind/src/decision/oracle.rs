//! Decision oracle transport.
//!
//! One HTTP POST per request against an Ollama-style generate endpoint. The
//! client trait exists so hosts and tests can substitute a scripted oracle.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::OracleConfig;
use crate::decision::DecisionError;

#[derive(Debug, Clone, Serialize)]
pub struct OracleRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OracleReply {
    pub response: String,
}

#[async_trait]
pub trait OracleClient: Send + Sync {
    /// Send one request and return the raw response text.
    async fn complete(&self, request: OracleRequest) -> Result<String, DecisionError>;
}

pub struct HttpOracleClient {
    endpoint: String,
    http: reqwest::Client,
}

impl HttpOracleClient {
    pub fn new(config: &OracleConfig) -> Result<Self, DecisionError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| DecisionError::Transport(e.to_string()))?;
        Ok(Self {
            endpoint: config.endpoint.clone(),
            http,
        })
    }
}

#[async_trait]
impl OracleClient for HttpOracleClient {
    async fn complete(&self, request: OracleRequest) -> Result<String, DecisionError> {
        tracing::debug!(endpoint = %self.endpoint, model = %request.model, "sending oracle request");

        let response = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| DecisionError::Transport(e.to_string()))?;

        let response = response
            .error_for_status()
            .map_err(|e| DecisionError::Transport(e.to_string()))?;

        let reply: OracleReply = response
            .json()
            .await
            .map_err(|e| DecisionError::Transport(format!("malformed oracle body: {e}")))?;

        Ok(reply.response)
    }
}
