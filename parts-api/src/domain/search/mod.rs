//! Hybrid part search: structured filters plus embedding similarity, with
//! language-model query parsing and response writing around it.
//!
//! # Pipeline
//!
//! 1. `QueryInterpreter` asks the model for a structured [`QueryIntent`].
//! 2. `HybridRanker` applies the intent's predicates to the store, scores the
//!    raw query against the `EmbeddingIndex` and merges both sets.
//! 3. `ResponseComposer` writes a summary and picks upsells.
//!
//! Every stage that depends on an external model degrades instead of failing:
//! the interpreter falls back to the raw query, the ranker to filters and
//! keywords, the composer to a templated summary. Only
//! [`SearchError::StoreUnavailable`] fails a request.
//!
//! # Architecture
//!
//! The stages are built around trait abstractions for testability:
//!
//! - [`Embedder`] - Query embedding (OpenAI-compatible API, mocks)
//! - [`ChatCompleter`] - Chat completions (OpenAI-compatible API, mocks)
//! - `PartRepository` - Part storage (SQLite, mocks)

mod composer;
mod index;
mod interpreter;
mod prompts;
mod ranker;
mod service;
#[cfg(test)]
mod test_parts;
mod traits;
mod types;

pub mod completer;
pub mod embedder;
pub mod repository;

pub use composer::ComposerConfig;
pub use interpreter::InterpreterConfig;
pub use ranker::RankerConfig;
pub use service::{SearchConfig, SearchService};
pub use traits::{ChatCompleter, Embedder, SearchError};
pub use types::{Degradation, PartFilter, QueryIntent, RankedResult, SearchFilters};
