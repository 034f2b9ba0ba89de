//! Remote generative-language service client.
//!
//! One POST per player query against a `generateContent` style endpoint. Only the
//! first candidate's first text part is used. Anything other than HTTP 200 with a
//! usable candidate is a [`ServiceError`]; nothing here retries.

use std::future::Future;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use tokio::time::timeout;

use crate::bridge::prompt::Prompt;
use crate::config::ServiceConfig;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("API key not configured")]
    NotConfigured,
    #[error("request timed out after {0}s")]
    Timeout(u32),
    #[error("HTTP request failed: {0}")]
    Transport(String),
    #[error("API error: status code {0}")]
    Status(u16),
    #[error("failed to decode response: {0}")]
    Decode(String),
    #[error("no response candidates returned")]
    NoCandidates,
}

/// Anything that turns a prompt into reply text.
pub trait CompletionBackend: Send + Sync + 'static {
    fn complete(&self, prompt: &Prompt) -> impl Future<Output = Result<String, ServiceError>> + Send;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f64,
    pub max_output_tokens: u32,
    pub top_p: f64,
    pub top_k: u32,
}

#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

/// Pull the reply text out of a raw response body.
pub fn decode_response(body: &str) -> Result<String, ServiceError> {
    let response: GenerateResponse =
        serde_json::from_str(body).map_err(|e| ServiceError::Decode(e.to_string()))?;
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or(ServiceError::NoCandidates)?;
    if let Some(reason) = &candidate.finish_reason {
        debug!("first candidate finish reason: {}", reason);
    }
    candidate
        .content
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .ok_or(ServiceError::NoCandidates)
}

/// HTTP client for the hosted model.
pub struct GeminiClient {
    config: ServiceConfig,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    /// Endpoint without the key, safe to log.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }

    pub fn build_api_url(&self) -> String {
        format!(
            "{}?key={}",
            self.endpoint(),
            urlencoding::encode(self.config.api_key.trim())
        )
    }

    pub fn build_request(&self, prompt: &Prompt) -> GenerateRequest {
        GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt.text()),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_output_tokens,
                top_p: self.config.top_p,
                top_k: self.config.top_k,
            },
        }
    }

    async fn fetch(&self, prompt: &Prompt) -> Result<String, ServiceError> {
        if !self.is_configured() {
            warn!("Generative service API key not configured");
            return Err(ServiceError::NotConfigured);
        }
        debug!("Requesting completion from {}", self.endpoint());

        let request = self
            .client
            .post(self.build_api_url())
            .json(&self.build_request(prompt));

        // One deadline covers the send and the body read
        let body = timeout(self.config.timeout(), async {
            let response = request
                .send()
                .await
                .map_err(|e| ServiceError::Transport(e.without_url().to_string()))?;
            let status = response.status();
            if status != reqwest::StatusCode::OK {
                return Err(ServiceError::Status(status.as_u16()));
            }
            response
                .text()
                .await
                .map_err(|e| ServiceError::Transport(e.without_url().to_string()))
        })
        .await
        .map_err(|_| ServiceError::Timeout(self.config.timeout_seconds))??;

        decode_response(&body)
    }
}

impl CompletionBackend for GeminiClient {
    async fn complete(&self, prompt: &Prompt) -> Result<String, ServiceError> {
        self.fetch(prompt).await
    }
}
