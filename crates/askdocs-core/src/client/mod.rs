pub mod http;

#[cfg(test)]
pub(crate) mod test_server;

use async_trait::async_trait;

use crate::error::AskError;
use crate::state::{Answer, HistoryEntry};

pub use http::{AskClient, HealthStatus, DEFAULT_ENDPOINT};

/// Anything that can answer a question given the prior conversation.
///
/// `AskClient` talks to the real endpoint; tests plug in canned backends.
#[async_trait]
pub trait AskBackend: Send + Sync {
    async fn ask(&self, question: &str, history: &[HistoryEntry]) -> Result<Answer, AskError>;
}
