//! Conversation store
//!
//! Holds the ordered message history and the pending flag for one chat
//! session. Messages are only ever appended.

use tracing::{debug, warn};

use crate::error::{AskError, SubmitRejected};
use crate::state::{Answer, HistoryEntry, Message, Snapshot};

#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<Message>,
    pending: bool,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept a new question. Returns the trimmed text that was stored.
    pub fn append_user(&mut self, text: &str) -> Result<String, SubmitRejected> {
        if self.pending {
            debug!("submission ignored: request already pending");
            return Err(SubmitRejected::Pending);
        }
        let question = text.trim();
        if question.is_empty() {
            debug!("submission ignored: empty question");
            return Err(SubmitRejected::Empty);
        }

        self.messages.push(Message::user(question));
        self.pending = true;
        Ok(question.to_string())
    }

    /// Record the outcome of the request started by the last `append_user`.
    /// Returns the appended reply, or `None` if no request was pending.
    pub fn append_result(&mut self, result: Result<Answer, AskError>) -> Option<&Message> {
        if !self.pending {
            warn!("append_result called with no pending request; ignoring");
            return None;
        }

        let message = match result {
            Ok(answer) => Message::assistant(answer.answer, answer.sources),
            Err(e) => {
                warn!(error = %e, "question failed");
                Message::error()
            }
        };
        self.messages.push(message);
        self.pending = false;
        self.messages.last()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            messages: self.messages.clone(),
            pending: self.pending,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// All current messages in wire form, in order
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.messages.iter().map(Message::to_history).collect()
    }
}
