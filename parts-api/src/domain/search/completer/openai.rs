//! Chat completer backed by an OpenAI-compatible `/chat/completions` endpoint.

use async_trait::async_trait;
use llm_client::{ChatCompletionRequest, ChatMessage, LlmClient};

use crate::domain::models::{ConversationTurn, TurnRole};
use crate::domain::search::traits::{ChatCompleter, CompletionError};
use crate::domain::search::types::CompletionRequest;

#[derive(Clone)]
pub struct OpenAiCompleter {
    client: LlmClient,
    model: String,
}

impl OpenAiCompleter {
    pub fn new(client: LlmClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    fn to_api_request(&self, request: &CompletionRequest) -> ChatCompletionRequest {
        let messages = std::iter::once(ChatMessage::system(request.system_prompt.as_str()))
            .chain(request.messages.iter().map(to_chat_message))
            .collect();

        ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }
}

fn to_chat_message(turn: &ConversationTurn) -> ChatMessage {
    match turn.role {
        TurnRole::User => ChatMessage::user(turn.content.as_str()),
        TurnRole::Assistant => ChatMessage::assistant(turn.content.as_str()),
        TurnRole::System => ChatMessage::system(turn.content.as_str()),
    }
}

#[async_trait]
impl ChatCompleter for OpenAiCompleter {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        self.client
            .chat_completion(&self.to_api_request(request))
            .await
            .map_err(|e| {
                if e.is_transient() {
                    CompletionError::Transient(e.to_string())
                } else {
                    CompletionError::Failed(e.to_string())
                }
            })
    }
}
