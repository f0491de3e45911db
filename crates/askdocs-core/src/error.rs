//! Error types for the conversation store and Q&A client

use thiserror::Error;

/// Why a request to the Q&A endpoint did not produce an answer
#[derive(Debug, Error)]
pub enum AskError {
    #[error("question is empty")]
    EmptyQuestion,

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("server responded with {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("malformed response body: {0}")]
    MalformedBody(String),

    /// The background task running the request panicked or was cancelled
    #[error("request task ended without a result: {0}")]
    Aborted(String),
}

impl AskError {
    pub fn is_transport(&self) -> bool {
        matches!(self, AskError::Transport { .. })
    }
}

/// Why a submission was not accepted into the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitRejected {
    #[error("question is empty")]
    Empty,
    #[error("a request is already in flight")]
    Pending,
}
