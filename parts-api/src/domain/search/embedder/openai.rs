//! Embedder backed by an OpenAI-compatible `/embeddings` endpoint.

use async_trait::async_trait;
use llm_client::LlmClient;

use crate::domain::search::traits::{Embedder, Result, SearchError};

/// Dimensions of `text-embedding-3-small`.
pub const DEFAULT_DIMENSIONS: usize = 1536;

#[derive(Clone)]
pub struct OpenAiEmbedder {
    client: LlmClient,
    model: String,
    dimensions: usize,
}

impl OpenAiEmbedder {
    pub fn new(client: LlmClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            dimensions: DEFAULT_DIMENSIONS,
        }
    }

    /// Override the expected dimensions, e.g. to match the stored index.
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let vector = self
            .client
            .embed(&self.model, text)
            .await
            .map_err(|e| SearchError::EmbeddingUnavailable(e.to_string()))?;

        if vector.len() != self.dimensions {
            return Err(SearchError::EmbeddingUnavailable(format!(
                "provider returned {} dimensions, expected {}",
                vector.len(),
                self.dimensions
            )));
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use llm_client::ClientConfig;
    use serde_json::json;
    use wiremock::{matchers::path, Mock, MockServer, ResponseTemplate};

    use super::*;

    fn embedder(server: &MockServer) -> OpenAiEmbedder {
        let client = LlmClient::new(
            ClientConfig::new("test-key")
                .with_api_base(server.uri())
                .with_timeout(Duration::from_secs(2)),
        )
        .unwrap();
        OpenAiEmbedder::new(client, "text-embedding-3-small").with_dimensions(3)
    }

    #[tokio::test]
    async fn returns_provider_vector() {
        let server = MockServer::start().await;
        Mock::given(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "embedding": [0.1, 0.2, 0.3], "index": 0 }]
            })))
            .mount(&server)
            .await;

        let vector = embedder(&server).embed("water filter").await.unwrap();
        assert_eq!(vector, vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn unexpected_dimensions_are_unavailable() {
        let server = MockServer::start().await;
        Mock::given(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "embedding": [0.1, 0.2], "index": 0 }]
            })))
            .mount(&server)
            .await;

        let err = embedder(&server).embed("water filter").await.unwrap_err();
        assert!(matches!(err, SearchError::EmbeddingUnavailable(_)));
    }

    #[tokio::test]
    async fn provider_errors_are_unavailable() {
        let server = MockServer::start().await;
        Mock::given(path("/embeddings"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = embedder(&server).embed("water filter").await.unwrap_err();
        assert!(matches!(err, SearchError::EmbeddingUnavailable(_)));
    }
}
