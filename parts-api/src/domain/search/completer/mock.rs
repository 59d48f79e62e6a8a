//! Mock chat completer for testing.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::domain::search::traits::{ChatCompleter, CompletionError};
use crate::domain::search::types::CompletionRequest;

/// Mock completer that replays scripted answers and records every request.
///
/// The last scripted answer repeats once the script is exhausted.
#[derive(Clone)]
pub struct MockCompleter {
    script: Arc<Vec<Result<String, CompletionError>>>,
    delay: Option<Duration>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockCompleter {
    pub fn with_sequence(script: Vec<Result<String, CompletionError>>) -> Self {
        assert!(!script.is_empty(), "script needs at least one answer");
        Self {
            script: Arc::new(script),
            delay: None,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn returning(text: impl Into<String>) -> Self {
        Self::with_sequence(vec![Ok(text.into())])
    }

    /// Every call fails permanently.
    pub fn failing() -> Self {
        Self::with_sequence(vec![Err(CompletionError::Failed("mock failure".into()))])
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatCompleter for MockCompleter {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len() - 1
        };
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.script[call.min(self.script.len() - 1)].clone()
    }
}
