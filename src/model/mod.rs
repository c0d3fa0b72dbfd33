// SPDX-License-Identifier: MIT

//! Model module - the text-generation seam
//!
//! The planner only ever sees `generate(messages) -> text`; the concrete
//! implementation lives in [openai] (any OpenAI-compatible chat endpoint).

pub mod openai;

pub use openai::OpenAiModel;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// A role-tagged message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Core trait for text-generation implementations.
///
/// Implementations may fail or return malformed content; callers are
/// responsible for recovery.
#[async_trait]
pub trait Model: Send + Sync {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String, ModelError>;
}
