use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use crate::{
    chat::ChatCompletionResponse,
    embeddings::{EmbeddingRequest, EmbeddingResponse},
    ApiURL, ChatCompletionRequest,
};

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base: String,
    pub api_key: String,
    /// Upper bound for a single HTTP round trip, including reading the body.
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Client for an OpenAI-compatible HTTP API.
///
/// Cloning is cheap, the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    base_url: ApiURL,
}

impl LlmClient {
    pub fn new(config: ClientConfig) -> Result<Self, LlmClientError> {
        let api_key = config.api_key.trim();
        if api_key.is_empty() {
            return Err(LlmClientError::InvalidConfig("api key is empty".into()));
        }

        let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|_| LlmClientError::InvalidConfig("api key is not a valid header".into()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmClientError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            http,
            base_url: ApiURL::parse(&config.api_base)?,
        })
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, LlmClientError> {
        let url = self.base_url.append_path(path);

        let resp = self
            .http
            .post(url.as_ref())
            .json(body)
            .send()
            .await
            .map_err(LlmClientError::from_reqwest)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(LlmClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        resp.json::<T>().await.map_err(|e| {
            if e.is_timeout() {
                LlmClientError::Timeout
            } else {
                LlmClientError::ParsingError(format!("Failed to parse response as JSON: {}", e))
            }
        })
    }

    /// Run a chat completion and return the assistant's text.
    #[tracing::instrument(skip_all, fields(model = %request.model, messages = request.messages.len()))]
    pub async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<String, LlmClientError> {
        let response: ChatCompletionResponse = self.post("chat/completions", request).await?;
        response.into_content().ok_or(LlmClientError::EmptyResponse)
    }

    /// Embed a single input text.
    #[tracing::instrument(skip(self, input), fields(chars = input.len()))]
    pub async fn embed(&self, model: &str, input: &str) -> Result<Vec<f32>, LlmClientError> {
        let request = EmbeddingRequest { model, input };
        let response: EmbeddingResponse = self.post("embeddings", &request).await?;
        response.into_first().ok_or(LlmClientError::EmptyResponse)
    }
}

#[derive(Error, Debug)]
pub enum LlmClientError {
    #[error("Request timed out")]
    Timeout,
    #[error("ConnectionError: {0}")]
    ConnectionError(String),
    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("ParsingError: {0}")]
    ParsingError(String),
    #[error("Response contained no content")]
    EmptyResponse,
    #[error("InvalidConfig: {0}")]
    InvalidConfig(String),
}

impl LlmClientError {
    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::ConnectionError(err.to_string())
        }
    }

    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout | Self::ConnectionError(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::ParsingError(_) | Self::EmptyResponse | Self::InvalidConfig(_) => false,
        }
    }
}
