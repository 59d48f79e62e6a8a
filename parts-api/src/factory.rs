//! Composition root: the only place that picks concrete providers and
//! storage adapters for the search domain.

use std::{sync::Arc, time::Duration};

use llm_client::{ClientConfig, LlmClient};
use sqlx::SqlitePool;

use crate::{
    config::{LlmSettings, Settings},
    domain::search::{
        completer::{OpenAiCompleter, UnconfiguredCompleter},
        embedder::{OpenAiEmbedder, UnconfiguredEmbedder},
        repository::SqlitePartRepository,
        ChatCompleter, Embedder, SearchError, SearchService,
    },
};

/// Model-backed collaborators of the search pipeline.
pub struct LlmProviders {
    pub embedder: Arc<dyn Embedder>,
    pub completer: Arc<dyn ChatCompleter>,
    /// `false` when the stand-ins are in use.
    pub configured: bool,
}

impl LlmProviders {
    /// Providers that always fail, leaving every AI stage degraded.
    pub fn unconfigured(dimensions: usize) -> Self {
        Self {
            embedder: Arc::new(UnconfiguredEmbedder::new(dimensions)),
            completer: Arc::new(UnconfiguredCompleter),
            configured: false,
        }
    }

    /// Build OpenAI-compatible providers. The embedder expects vectors of the
    /// same length as the stored index.
    pub fn from_settings(settings: &LlmSettings, index_dimensions: usize) -> Self {
        let Some(api_key) = settings.api_key() else {
            tracing::warn!("No LLM API key configured, search runs without AI stages");
            return Self::unconfigured(index_dimensions);
        };

        let client_config = ClientConfig::new(api_key)
            .with_api_base(settings.api_base.as_str())
            .with_timeout(Duration::from_millis(settings.http_timeout_ms));
        let client = match LlmClient::new(client_config) {
            Ok(client) => client,
            Err(err) => {
                tracing::error!("Failed to create LLM client: {}", err);
                return Self::unconfigured(index_dimensions);
            }
        };

        let mut embedder = OpenAiEmbedder::new(client.clone(), settings.embedding_model.as_str());
        if index_dimensions > 0 {
            embedder = embedder.with_dimensions(index_dimensions);
        }

        tracing::info!(
            chat_model = %settings.chat_model,
            embedding_model = %settings.embedding_model,
            "LLM providers configured"
        );

        Self {
            embedder: Arc::new(embedder),
            completer: Arc::new(OpenAiCompleter::new(client, settings.chat_model.as_str())),
            configured: true,
        }
    }
}

/// Load the embedding index and wire the search service against the
/// catalog database. Also reports whether a language model is configured.
pub async fn search_service(
    pool: &SqlitePool,
    settings: &Settings,
) -> Result<(SearchService, bool), SearchError> {
    let repository = Arc::new(SqlitePartRepository::new(pool.clone()));

    let mut configured = false;
    let service = SearchService::load(
        repository,
        |dimensions| {
            let providers = LlmProviders::from_settings(&settings.llm, dimensions);
            configured = providers.configured;
            (providers.embedder, providers.completer)
        },
        settings.search_config(),
    )
    .await?;

    Ok((service, configured))
}
