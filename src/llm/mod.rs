//! Language-model seam: chat messages, sessions and the client trait.

pub mod chain;
pub mod openai;
pub mod prompts;

use std::fmt;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use chain::{PromptInputs, StructuredChain};
pub use openai::OpenAiChat;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A chat-completion backend. Implementations send one request per call and
/// return the raw assistant text.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn invoke(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Model identifier, used for logging.
    fn name(&self) -> &str;
}

/// Correlation handle grouping every model call of one user-triggered run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Session(String);

impl Session {
    pub fn new() -> Self {
        Self(format!(
            "{}-{:08x}",
            Utc::now().format("%Y%m%dT%H%M%S"),
            rand::random::<u32>()
        ))
    }

    pub fn from_id(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }

    /// Trace context for one named step of a feature within this session.
    pub fn trace(&self, feature: &'static str, step: &'static str) -> TraceContext {
        TraceContext {
            session_id: self.0.clone(),
            feature,
            step,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Metadata attached to the trace event emitted for each model call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceContext {
    pub session_id: String,
    pub feature: &'static str,
    pub step: &'static str,
}
