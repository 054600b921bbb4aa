//! Seam to the language-model backend.
//!
//! The HTTP client that actually talks to a model lives outside this crate;
//! everything here programs against [`IntelligenceProvider`]. The scripted
//! implementation exists for tests and offline development, compiled
//! unconditionally so downstream integration tests can drive it too.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider transport error: {0}")]
    Transport(String),

    #[error("provider returned an empty response")]
    EmptyResponse,
}

/// One turn of the conversation, role `"user"` or `"assistant"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        ChatMessage {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// One completion turn: system prompt plus conversation in, raw text out.
#[async_trait]
pub trait IntelligenceProvider: Send + Sync {
    async fn complete(
        &self,
        system: &str,
        messages: &[ChatMessage],
    ) -> Result<String, ProviderError>;
}

/// Pops pre-canned responses in order and records every request it saw.
#[derive(Default)]
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<(String, Vec<ChatMessage>)>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        ScriptedProvider::default()
    }

    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let provider = ScriptedProvider::new();
        if let Ok(mut queue) = provider.responses.lock() {
            queue.extend(responses.into_iter().map(Into::into));
        }
        provider
    }

    pub fn push_response(&self, response: impl Into<String>) {
        if let Ok(mut queue) = self.responses.lock() {
            queue.push_back(response.into());
        }
    }

    /// Every (system, messages) pair this provider has answered.
    pub fn requests(&self) -> Vec<(String, Vec<ChatMessage>)> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl IntelligenceProvider for ScriptedProvider {
    async fn complete(
        &self,
        system: &str,
        messages: &[ChatMessage],
    ) -> Result<String, ProviderError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push((system.to_string(), messages.to_vec()));
        }
        let next = self
            .responses
            .lock()
            .map_err(|_| ProviderError::Transport("script lock poisoned".to_string()))?
            .pop_front();
        next.ok_or_else(|| ProviderError::Transport("script exhausted".to_string()))
    }
}
