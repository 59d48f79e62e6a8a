//! Chat-completion provider implementations.

#[cfg(test)]
mod mock;
mod openai;
mod unconfigured;

#[cfg(test)]
pub use mock::MockCompleter;
pub use openai::OpenAiCompleter;
pub use unconfigured::UnconfiguredCompleter;
