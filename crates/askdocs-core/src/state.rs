//! UI-agnostic conversation types
//!
//! This module contains data structures that are shared between different UIs
//! (TUI, one-shot CLI) and don't depend on any specific UI framework.

use serde::{Deserialize, Serialize};

/// Text shown in place of an answer whenever a request fails for any reason.
pub const FAILURE_MESSAGE: &str = "Failed to get response from the server. Please try again.";

/// What kind of turn a message is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    User,
    Assistant,
    Error,
}

impl MessageKind {
    /// Role used when replaying this message to the server.
    /// Error notices count as assistant turns.
    pub fn history_role(self) -> HistoryRole {
        match self {
            MessageKind::User => HistoryRole::User,
            MessageKind::Assistant | MessageKind::Error => HistoryRole::Assistant,
        }
    }
}

/// A single turn in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub kind: MessageKind,
    pub content: String,
    /// Cited URLs, in the order the server returned them. Empty unless
    /// this is an assistant answer with citations.
    pub sources: Vec<String>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::User,
            content: content.into(),
            sources: Vec::new(),
        }
    }

    pub fn assistant(content: impl Into<String>, sources: Vec<String>) -> Self {
        Self {
            kind: MessageKind::Assistant,
            content: content.into(),
            sources,
        }
    }

    pub fn error() -> Self {
        Self {
            kind: MessageKind::Error,
            content: FAILURE_MESSAGE.to_string(),
            sources: Vec::new(),
        }
    }

    pub fn to_history(&self) -> HistoryEntry {
        HistoryEntry {
            role: self.kind.history_role(),
            content: self.content.clone(),
            sources: self.sources.clone(),
        }
    }
}

/// The role of a message as the Q&A endpoint sees it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRole {
    User,
    Assistant,
}

/// Wire form of a prior message in `conversation_history`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: HistoryRole,
    pub content: String,
    #[serde(default)]
    pub sources: Vec<String>,
}

/// A successful answer from the endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub sources: Vec<String>,
}

/// Read-only copy of the conversation handed to renderers
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snapshot {
    pub messages: Vec<Message>,
    pub pending: bool,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
