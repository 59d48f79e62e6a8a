//! Search service running the interpret → rank → compose pipeline.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use super::composer::{ComposerConfig, ResponseComposer};
use super::index::EmbeddingIndex;
use super::interpreter::{InterpreterConfig, QueryInterpreter};
use super::ranker::{HybridRanker, RankerConfig};
use super::traits::{ChatCompleter, Embedder, PartRepository, Result};
use super::types::{
    ChatOutcome, CompareOutcome, Degradation, IntentParse, QueryIntent, SearchFilters,
    SearchOutcome,
};
use crate::domain::models::ConversationTurn;

/// Configuration for the search service.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Number of results when the caller does not ask for a count
    pub default_top_k: usize,
    /// Maximum number of results allowed
    pub max_top_k: usize,
    /// Products ranked for each chat message
    pub chat_top_k: usize,
    /// Prior turns forwarded to the composer
    pub max_history_turns: usize,
    /// End-to-end budget for a search; the composer gets what is left
    pub search_deadline: Duration,
    /// End-to-end budget for a chat message or a comparison
    pub chat_deadline: Duration,
    pub interpreter: InterpreterConfig,
    pub ranker: RankerConfig,
    pub composer: ComposerConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_top_k: 5,
            max_top_k: 20,
            chat_top_k: 5,
            max_history_turns: 10,
            search_deadline: Duration::from_millis(1800),
            chat_deadline: Duration::from_millis(2800),
            interpreter: InterpreterConfig::default(),
            ranker: RankerConfig::default(),
            composer: ComposerConfig::default(),
        }
    }
}

/// Search service tying the query interpreter, hybrid ranker and response
/// composer together.
///
/// Only store failures escape as errors; every AI stage degrades and is
/// reported in the outcome's `degraded` list.
///
/// # Examples
///
/// ```ignore
/// let service = SearchService::load(repository, |_| (embedder, completer), SearchConfig::default()).await?;
/// let outcome = service.search("water filter for whirlpool fridge", None, &Default::default(), true).await?;
/// ```
pub struct SearchService {
    repository: Arc<dyn PartRepository>,
    interpreter: QueryInterpreter,
    ranker: HybridRanker,
    composer: ResponseComposer,
    config: SearchConfig,
}

impl SearchService {
    /// Build the service, loading the embedding index and the category
    /// vocabulary from the store.
    ///
    /// `providers` receives the index dimensions so the embedder can be
    /// built to match the stored vectors.
    pub async fn load<F>(
        repository: Arc<dyn PartRepository>,
        providers: F,
        config: SearchConfig,
    ) -> Result<Self>
    where
        F: FnOnce(usize) -> (Arc<dyn Embedder>, Arc<dyn ChatCompleter>),
    {
        let index = EmbeddingIndex::build(repository.load_embeddings().await?);
        let (embedder, completer) = providers(index.dimensions());
        if !index.is_empty() && index.dimensions() != embedder.dimensions() {
            tracing::warn!(
                index = index.dimensions(),
                embedder = embedder.dimensions(),
                "Embedding index and embedder disagree on dimensions"
            );
        }
        tracing::info!(
            embeddings = index.len(),
            dimensions = index.dimensions(),
            "Loaded embedding index"
        );

        let categories = repository.categories().await?;

        Ok(Self::new(repository, embedder, completer, index, &categories, config))
    }

    pub fn new(
        repository: Arc<dyn PartRepository>,
        embedder: Arc<dyn Embedder>,
        completer: Arc<dyn ChatCompleter>,
        index: EmbeddingIndex,
        categories: &[String],
        config: SearchConfig,
    ) -> Self {
        Self {
            interpreter: QueryInterpreter::new(
                completer.clone(),
                categories,
                config.interpreter.clone(),
            ),
            ranker: HybridRanker::new(
                repository.clone(),
                embedder,
                Arc::new(index),
                config.ranker.clone(),
            ),
            composer: ResponseComposer::new(completer, repository.clone(), config.composer.clone()),
            repository,
            config,
        }
    }

    /// Largest `top_k` a search may ask for.
    pub fn max_top_k(&self) -> usize {
        self.config.max_top_k
    }

    /// Number of vectors in the embedding index.
    pub fn indexed_embeddings(&self) -> usize {
        self.ranker.index().len()
    }

    /// Execute a search query.
    ///
    /// # Arguments
    ///
    /// * `query` - Natural language search query
    /// * `top_k` - Maximum number of results (None uses default, capped at max_top_k)
    /// * `filters` - Explicit filters that override interpreted ones
    /// * `include_summary` - Also compose a natural-language summary
    pub async fn search(
        &self,
        query: &str,
        top_k: Option<usize>,
        filters: &SearchFilters,
        include_summary: bool,
    ) -> Result<SearchOutcome> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(SearchOutcome {
                intent: None,
                results: vec![],
                summary: None,
                suggestions: vec![],
                degraded: vec![],
            });
        }

        let deadline = Instant::now() + self.config.search_deadline;
        let top_k = top_k
            .unwrap_or(self.config.default_top_k)
            .clamp(1, self.config.max_top_k);

        let mut degraded = Vec::new();
        let (intent, structured) = self.interpret(query, &mut degraded).await;
        let intent = intent.with_filters(filters);

        let ranking = self.ranker.rank(&intent, top_k).await?;
        if ranking.embedding_degraded {
            degraded.push(Degradation::Embedding);
        }

        let (summary, suggestions) = if include_summary {
            let composition = self
                .composer
                .compose(query, &ranking.results, &[], deadline)
                .await;
            if composition.degraded {
                degraded.push(Degradation::Composition);
            }
            (Some(composition.text), composition.suggestions)
        } else {
            (None, vec![])
        };

        Ok(SearchOutcome {
            intent: structured.then_some(intent),
            results: ranking.results,
            summary,
            suggestions,
            degraded,
        })
    }

    /// Answer a chat message, using prior turns as context.
    pub async fn chat(
        &self,
        message: &str,
        history: &[ConversationTurn],
        include_products: bool,
    ) -> Result<ChatOutcome> {
        let deadline = Instant::now() + self.config.chat_deadline;
        let message = message.trim();
        let skip = history.len().saturating_sub(self.config.max_history_turns);
        let history = &history[skip..];

        let mut degraded = Vec::new();
        let (intent, _) = self.interpret(message, &mut degraded).await;

        let ranking = self.ranker.rank(&intent, self.config.chat_top_k).await?;
        if ranking.embedding_degraded {
            degraded.push(Degradation::Embedding);
        }

        let composition = self
            .composer
            .compose(message, &ranking.results, history, deadline)
            .await;
        if composition.degraded {
            degraded.push(Degradation::Composition);
        }

        let mut turns = history.to_vec();
        turns.push(ConversationTurn::user(message));
        turns.push(ConversationTurn::assistant(composition.text.clone()));

        Ok(ChatOutcome {
            response: composition.text,
            products: if include_products {
                ranking.results
            } else {
                vec![]
            },
            suggestions: composition.suggestions,
            history: turns,
            degraded,
        })
    }

    /// Compare the given parts. Unknown SKUs are skipped.
    pub async fn compare(&self, skus: &[String]) -> Result<CompareOutcome> {
        let products = self.repository.get_by_skus(skus).await?;
        if products.is_empty() {
            return Ok(CompareOutcome {
                comparison: String::new(),
                products,
                degraded: vec![],
            });
        }

        let deadline = Instant::now() + self.config.chat_deadline;
        let composition = self.composer.compare(&products, deadline).await;
        Ok(CompareOutcome {
            comparison: composition.text,
            products,
            degraded: if composition.degraded {
                vec![Degradation::Composition]
            } else {
                vec![]
            },
        })
    }

    /// Returns the intent to rank with and whether it came from the model.
    async fn interpret(
        &self,
        query: &str,
        degraded: &mut Vec<Degradation>,
    ) -> (QueryIntent, bool) {
        match self.interpreter.interpret(query).await {
            Ok(IntentParse::Intent(intent)) => (intent, true),
            Ok(IntentParse::Unstructured(_)) => (QueryIntent::bare(query), false),
            Err(e) => {
                tracing::warn!(error = %e, query, "Query interpreter unavailable, ranking raw query");
                degraded.push(Degradation::Intent);
                (QueryIntent::bare(query), false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::search::completer::MockCompleter;
    use crate::domain::search::embedder::MockEmbedder;
    use crate::domain::search::repository::MockPartRepository;
    use crate::domain::search::test_parts::part;
    use crate::domain::search::traits::{CompletionError, SearchError};
    use crate::domain::search::types::MatchReason;

    fn catalog() -> MockPartRepository {
        let mut filter = part("XWFE", "GE Refrigerator Water Filter", "GE");
        filter.category = Some("Refrigerator Parts".into());
        MockPartRepository::new()
            .with_parts(vec![
                filter,
                part("EDR1RXD1", "Whirlpool Refrigerator Water Filter 1", "Whirlpool"),
                part("EDR4RXD1", "Whirlpool Refrigerator Water Filter 4", "Whirlpool"),
                part("W10380496", "Whirlpool Washer Drum", "Whirlpool"),
            ])
            .with_embeddings(vec![
                ("XWFE", vec![1.0, 0.0]),
                ("EDR1RXD1", vec![0.9, 0.1]),
                ("EDR4RXD1", vec![0.6, 0.4]),
                ("W10380496", vec![0.0, 1.0]),
            ])
    }

    fn config() -> SearchConfig {
        let mut config = SearchConfig::default();
        config.interpreter.timeout = Duration::from_millis(50);
        config.ranker.embedding_timeout = Duration::from_millis(50);
        config.composer.timeout = Duration::from_millis(50);
        config
    }

    async fn service(embedder: MockEmbedder, completer: MockCompleter) -> SearchService {
        SearchService::load(
            Arc::new(catalog()),
            |_| (Arc::new(embedder), Arc::new(completer)),
            config(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn search_empty_query_returns_empty() {
        let service = service(MockEmbedder::returning(vec![1.0, 0.0]), MockCompleter::failing()).await;

        let outcome = service.search("   ", None, &SearchFilters::default(), true).await.unwrap();
        assert!(outcome.results.is_empty());
        assert!(outcome.summary.is_none());
    }

    #[tokio::test]
    async fn search_uses_interpreted_intent() {
        let completer = MockCompleter::returning(r#"{"brand": "Whirlpool", "part_type": "water filter"}"#);
        let service = service(MockEmbedder::returning(vec![1.0, 0.0]), completer.clone()).await;

        let outcome = service
            .search("water filter for whirlpool fridge", None, &SearchFilters::default(), false)
            .await
            .unwrap();

        let skus: Vec<_> = outcome.results.iter().map(|r| r.part.sku.as_str()).collect();
        assert_eq!(skus, vec!["EDR1RXD1", "EDR4RXD1"]);
        assert!(outcome.results.iter().all(|r| r.match_reason == MatchReason::Both));
        assert_eq!(outcome.intent.unwrap().brand.as_deref(), Some("Whirlpool"));
        assert!(outcome.degraded.is_empty());
        // summary not requested, only the interpreter ran
        assert_eq!(completer.call_count(), 1);
    }

    #[tokio::test]
    async fn search_caps_top_k_and_applies_explicit_filters() {
        let service = service(MockEmbedder::returning(vec![1.0, 0.0]), MockCompleter::returning("{}")).await;
        let filters = SearchFilters {
            brand: Some("whirlpool".into()),
            ..Default::default()
        };

        let outcome = service.search("parts", Some(500), &filters, false).await.unwrap();

        assert_eq!(outcome.results.len(), 3);
        assert!(outcome
            .results
            .iter()
            .all(|r| r.part.brand.as_deref() == Some("Whirlpool")));
    }

    #[tokio::test]
    async fn every_ai_stage_can_degrade() {
        let service = service(MockEmbedder::failing(2), MockCompleter::failing()).await;

        let outcome = service
            .search("XWFE", Some(5), &SearchFilters::default(), true)
            .await
            .unwrap();

        assert_eq!(outcome.results[0].part.sku, "XWFE");
        assert_eq!(
            outcome.degraded,
            vec![
                Degradation::Intent,
                Degradation::Embedding,
                Degradation::Composition
            ]
        );
        assert!(outcome
            .summary
            .unwrap()
            .starts_with("Found 1 results for 'XWFE'."));
    }

    #[tokio::test]
    async fn stalled_providers_stay_within_latency_targets() {
        let stalled = Duration::from_secs(30);
        let service = SearchService::load(
            Arc::new(catalog()),
            |_| {
                (
                    Arc::new(MockEmbedder::returning(vec![1.0, 0.0]).with_delay(stalled)),
                    Arc::new(MockCompleter::returning("too late").with_delay(stalled)),
                )
            },
            SearchConfig::default(),
        )
        .await
        .unwrap();

        let started = Instant::now();
        let outcome = service
            .search("whirlpool filter", None, &SearchFilters::default(), true)
            .await
            .unwrap();
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(
            outcome.degraded,
            vec![
                Degradation::Intent,
                Degradation::Embedding,
                Degradation::Composition
            ]
        );

        let started = Instant::now();
        let outcome = service.chat("whirlpool filter", &[], true).await.unwrap();
        assert!(started.elapsed() < Duration::from_secs(3));
        assert!(outcome.degraded.contains(&Degradation::Composition));
    }

    #[tokio::test]
    async fn chat_appends_exchange_and_trims_history() {
        let completer = MockCompleter::with_sequence(vec![
            Ok("not json".into()),
            Ok("The GE XWFE fits your fridge.".into()),
        ]);
        let mut service = service(MockEmbedder::returning(vec![1.0, 0.0]), completer.clone()).await;
        service.config.max_history_turns = 2;
        let history = vec![
            ConversationTurn::user("first"),
            ConversationTurn::assistant("second"),
            ConversationTurn::user("third"),
        ];

        let outcome = service.chat("ge filter?", &history, true).await.unwrap();

        assert_eq!(outcome.response, "The GE XWFE fits your fridge.");
        assert!(!outcome.products.is_empty());
        assert_eq!(
            outcome.history,
            vec![
                ConversationTurn::assistant("second"),
                ConversationTurn::user("third"),
                ConversationTurn::user("ge filter?"),
                ConversationTurn::assistant("The GE XWFE fits your fridge."),
            ]
        );
        // composer saw the trimmed history plus the product context
        assert_eq!(completer.requests()[1].messages.len(), 3);
    }

    #[tokio::test]
    async fn chat_can_omit_products() {
        let service = service(MockEmbedder::returning(vec![1.0, 0.0]), MockCompleter::returning("Hi")).await;

        let outcome = service.chat("hello", &[], false).await.unwrap();
        assert!(outcome.products.is_empty());
    }

    #[tokio::test]
    async fn compare_retries_transient_failure() {
        let completer = MockCompleter::with_sequence(vec![
            Err(CompletionError::Transient("timeout".into())),
            Ok("XWFE is cheaper.".into()),
        ]);
        let service = service(MockEmbedder::returning(vec![1.0, 0.0]), completer).await;

        let outcome = service
            .compare(&["XWFE".into(), "EDR1RXD1".into(), "NOPE".into()])
            .await
            .unwrap();

        assert_eq!(outcome.comparison, "XWFE is cheaper.");
        assert_eq!(outcome.products.len(), 2);
        assert!(outcome.degraded.is_empty());
    }

    #[tokio::test]
    async fn store_failure_escapes() {
        let repo = catalog();
        let service = SearchService::load(
            Arc::new(repo.clone()),
            |_| {
                (
                    Arc::new(MockEmbedder::returning(vec![1.0, 0.0])),
                    Arc::new(MockCompleter::failing()),
                )
            },
            config(),
        )
        .await
        .unwrap();
        repo.set_unavailable(true);

        let err = service
            .search("filter", None, &SearchFilters::default(), true)
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::StoreUnavailable(_)));
    }
}
