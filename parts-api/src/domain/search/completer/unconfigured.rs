use async_trait::async_trait;

use crate::domain::search::traits::{ChatCompleter, CompletionError};
use crate::domain::search::types::CompletionRequest;

/// Stand-in used when no API key is configured.
#[derive(Debug, Clone, Default)]
pub struct UnconfiguredCompleter;

#[async_trait]
impl ChatCompleter for UnconfiguredCompleter {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String, CompletionError> {
        Err(CompletionError::Failed(
            "no language model configured".into(),
        ))
    }
}
