//! Embedding generation implementations.

#[cfg(test)]
mod mock;
mod openai;
mod unconfigured;

#[cfg(test)]
pub use mock::MockEmbedder;
pub use openai::OpenAiEmbedder;
pub use unconfigured::UnconfiguredEmbedder;
