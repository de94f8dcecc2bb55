//! Chat-completion capability required by `llm` nodes.
//!
//! The engine only depends on [`ChatClient`]; any provider that accepts a
//! model name, an ordered message list, a temperature and a token limit and
//! answers with text can back it.

use crate::ClientError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub max_tokens: u64,
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Provider identifier used in logs
    fn id(&self) -> &str;

    async fn chat_completion(&self, request: ChatRequest) -> Result<String, ClientError>;
}

/// Replies with the last user message. Used when no provider is configured.
#[derive(Debug, Default, Clone)]
pub struct EchoChatClient;

#[async_trait]
impl ChatClient for EchoChatClient {
    fn id(&self) -> &str {
        "echo"
    }

    async fn chat_completion(&self, request: ChatRequest) -> Result<String, ClientError> {
        Ok(request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::User)
            .map(|m| m.content.clone())
            .unwrap_or_default())
    }
}

/// Scripted client for tests: answers with queued responses in order and
/// remembers every request it received.
#[derive(Debug, Default)]
pub struct MockChatClient {
    responses: Mutex<VecDeque<Result<String, ClientError>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockChatClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.responses.get_mut().push_back(Ok(response.into()));
        self
    }

    pub fn with_error(mut self, error: ClientError) -> Self {
        self.responses.get_mut().push_back(Err(error));
        self
    }

    pub async fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl ChatClient for MockChatClient {
    fn id(&self) -> &str {
        "mock"
    }

    async fn chat_completion(&self, request: ChatRequest) -> Result<String, ClientError> {
        self.requests.lock().await.push(request);
        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or(Err(ClientError::Exhausted))
    }
}
