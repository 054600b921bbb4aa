//! Conversational contact agent.
//!
//! One chat turn: assemble the system prompt from live directory data, send
//! the conversation to the model, split the reply into display text plus
//! `[ACTION]` payloads, and (separately) apply those payloads against the
//! directory under the confidence-gating rules. The model proposes, the
//! apply step disposes; nothing the model says writes a row by itself.

pub mod actions;
pub mod apply;
pub mod prompts;

pub use actions::{parse_actions, ActionKind, AgentAction, Confidence, ACTION_MARKER};
pub use apply::{apply_action, ActionOutcome};

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::directory::{Directory, DirectoryError};
use crate::intelligence::{ChatMessage, IntelligenceProvider, ProviderError};

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

/// One agent turn: display text plus any parsed action payloads. `raw`
/// carries the unsplit model output for the conversation history.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentReply {
    pub message: String,
    pub actions: Vec<AgentAction>,
    pub raw: String,
}

pub struct ContactAgent {
    directory: Arc<Directory>,
    provider: Arc<dyn IntelligenceProvider>,
}

impl ContactAgent {
    pub fn new(directory: Arc<Directory>, provider: Arc<dyn IntelligenceProvider>) -> Self {
        ContactAgent {
            directory,
            provider,
        }
    }

    /// Run one conversation turn. The caller owns the history and decides
    /// what to do with the returned actions (see [`apply_action`]).
    pub async fn chat(
        &self,
        user_message: &str,
        history: &[ChatMessage],
    ) -> Result<AgentReply, AgentError> {
        let contacts = self.directory.contacts()?;
        // Tag loading is best-effort; the prompt says so when it fails.
        let tags = self.directory.tags().ok();
        let system = prompts::build_system_prompt(&contacts, tags.as_deref());

        let mut messages: Vec<ChatMessage> = history.to_vec();
        messages.push(ChatMessage::user(user_message));

        let raw = self.provider.complete(&system, &messages).await?;
        let (message, actions) = parse_actions(&raw);
        Ok(AgentReply {
            message,
            actions,
            raw,
        })
    }

    /// Apply every parsed action from a reply, in order.
    pub fn apply(&self, actions: &[AgentAction]) -> Vec<ActionOutcome> {
        actions
            .iter()
            .map(|action| apply_action(&self.directory, action))
            .collect()
    }
}
