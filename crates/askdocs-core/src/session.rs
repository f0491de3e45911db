//! One chat session: a conversation plus the request currently in flight.
//!
//! UIs call `submit` on user input and `poll` on every tick; the one-shot
//! CLI uses `ask_once`.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::client::AskBackend;
use crate::conversation::Conversation;
use crate::error::{AskError, SubmitRejected};
use crate::state::{Answer, Message, Snapshot};

type AskTask = JoinHandle<Result<Answer, AskError>>;

pub struct ChatSession {
    conversation: Conversation,
    backend: Arc<dyn AskBackend>,
    in_flight: Option<AskTask>,
}

impl ChatSession {
    pub fn new(backend: Arc<dyn AskBackend>) -> Self {
        Self {
            conversation: Conversation::new(),
            backend,
            in_flight: None,
        }
    }

    /// Accept a question and start asking it in the background.
    ///
    /// The endpoint receives the turns before this one as history; the new
    /// question travels separately. Outside a tokio runtime the question is
    /// answered straight away with the failure message.
    pub fn submit(&mut self, text: &str) -> Result<(), SubmitRejected> {
        let runtime = Handle::try_current();
        let history = self.conversation.history();
        let question = self.conversation.append_user(text)?;
        info!(history_len = history.len(), "question submitted");

        match runtime {
            Ok(runtime) => {
                let backend = Arc::clone(&self.backend);
                self.in_flight = Some(runtime.spawn(async move {
                    backend.ask(&question, &history).await
                }));
            }
            Err(e) => {
                warn!(error = %e, "no async runtime to send the question on");
                self.conversation
                    .append_result(Err(AskError::Aborted(e.to_string())));
            }
        }
        Ok(())
    }

    /// Settle the in-flight request if it has finished. Returns true when a
    /// reply was appended.
    pub async fn poll(&mut self) -> bool {
        let finished = self.in_flight.as_ref().is_some_and(|task| task.is_finished());
        if !finished {
            return false;
        }
        self.settle().await.is_some()
    }

    /// Wait for the in-flight request and append its outcome.
    pub async fn settle(&mut self) -> Option<&Message> {
        let task = self.in_flight.take()?;
        let result = match task.await {
            Ok(result) => result,
            Err(e) => Err(AskError::Aborted(e.to_string())),
        };
        debug!(ok = result.is_ok(), "request settled");
        self.conversation.append_result(result)
    }

    /// Submit and wait for the reply.
    pub async fn ask_once(&mut self, text: &str) -> Result<Message, SubmitRejected> {
        self.submit(text)?;
        // submit always leaves a task behind, so settle always appends
        Ok(self.settle().await.cloned().unwrap_or_else(Message::error))
    }

    pub fn is_pending(&self) -> bool {
        self.conversation.is_pending()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.conversation.snapshot()
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{HistoryEntry, HistoryRole, MessageKind, FAILURE_MESSAGE};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    /// Returns a fixed result and records the history it was given
    struct CannedBackend {
        result: fn() -> Result<Answer, AskError>,
        calls: Mutex<Vec<(String, Vec<HistoryEntry>)>>,
    }

    impl CannedBackend {
        fn new(result: fn() -> Result<Answer, AskError>) -> Arc<Self> {
            Arc::new(Self {
                result,
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl AskBackend for CannedBackend {
        async fn ask(&self, question: &str, history: &[HistoryEntry]) -> Result<Answer, AskError> {
            self.calls
                .lock()
                .unwrap()
                .push((question.to_string(), history.to_vec()));
            (self.result)()
        }
    }

    /// Holds the request open until the test releases it
    struct GatedBackend {
        gate: Mutex<Option<oneshot::Receiver<Result<Answer, AskError>>>>,
    }

    #[async_trait]
    impl AskBackend for GatedBackend {
        async fn ask(&self, _question: &str, _history: &[HistoryEntry]) -> Result<Answer, AskError> {
            let rx = self.gate.lock().unwrap().take().expect("asked twice");
            rx.await.unwrap_or_else(|e| Err(AskError::Aborted(e.to_string())))
        }
    }

    struct PanickingBackend;

    #[async_trait]
    impl AskBackend for PanickingBackend {
        async fn ask(&self, _question: &str, _history: &[HistoryEntry]) -> Result<Answer, AskError> {
            panic!("backend blew up");
        }
    }

    fn segment_answer() -> Result<Answer, AskError> {
        Ok(Answer {
            answer: "A segment is...".to_string(),
            sources: vec!["https://experienceleague.adobe.com/x".to_string()],
        })
    }

    fn network_failure() -> Result<Answer, AskError> {
        Err(AskError::Aborted("connection refused".to_string()))
    }

    #[tokio::test]
    async fn test_pending_between_submit_and_reply() {
        let (tx, rx) = oneshot::channel();
        let backend = Arc::new(GatedBackend {
            gate: Mutex::new(Some(rx)),
        });
        let mut session = ChatSession::new(backend);

        session.submit("What is a segment?").unwrap();
        let snap = session.snapshot();
        assert_eq!(snap.messages.len(), 1);
        assert_eq!(snap.messages[0].kind, MessageKind::User);
        assert!(snap.pending);
        assert!(!session.poll().await);

        assert_eq!(session.submit("another"), Err(SubmitRejected::Pending));

        tx.send(segment_answer()).unwrap();
        let reply = session.settle().await.unwrap();
        assert_eq!(reply.kind, MessageKind::Assistant);
        assert_eq!(reply.content, "A segment is...");
        assert_eq!(reply.sources, vec!["https://experienceleague.adobe.com/x"]);

        let snap = session.snapshot();
        assert_eq!(snap.messages.len(), 2);
        assert!(!snap.pending);
    }

    #[tokio::test]
    async fn test_network_failure_becomes_error_message() {
        let mut session = ChatSession::new(CannedBackend::new(network_failure));

        let reply = session.ask_once("abc").await.unwrap();
        assert_eq!(reply.kind, MessageKind::Error);
        assert_eq!(reply.content, FAILURE_MESSAGE);

        let snap = session.snapshot();
        assert_eq!(snap.messages.len(), 2);
        assert_eq!(snap.messages.last().unwrap().kind, MessageKind::Error);
        assert!(!snap.pending);
    }

    #[tokio::test]
    async fn test_panicking_backend_still_settles() {
        let mut session = ChatSession::new(Arc::new(PanickingBackend));

        let reply = session.ask_once("abc").await.unwrap();
        assert_eq!(reply.kind, MessageKind::Error);
        assert!(!session.is_pending());
    }

    #[tokio::test]
    async fn test_history_excludes_current_question() {
        let backend = CannedBackend::new(segment_answer);
        let mut session = ChatSession::new(backend.clone());

        session.ask_once("first").await.unwrap();
        session.ask_once("second").await.unwrap();

        let calls = backend.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, "first");
        assert!(calls[0].1.is_empty());

        let (question, history) = &calls[1];
        assert_eq!(question, "second");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, HistoryRole::User);
        assert_eq!(history[0].content, "first");
        assert_eq!(history[1].role, HistoryRole::Assistant);
        assert_eq!(history[1].content, "A segment is...");
    }

    #[tokio::test]
    async fn test_rejected_input_issues_no_request() {
        let backend = CannedBackend::new(segment_answer);
        let mut session = ChatSession::new(backend.clone());

        assert_eq!(session.ask_once("   ").await, Err(SubmitRejected::Empty));
        assert!(!session.poll().await);
        assert!(backend.calls.lock().unwrap().is_empty());
        assert_eq!(session.snapshot(), Snapshot::default());
    }

    #[test]
    fn test_submit_without_runtime_does_not_stay_pending() {
        let backend = CannedBackend::new(segment_answer);
        let mut session = ChatSession::new(backend.clone());

        session.submit("What is a segment?").unwrap();

        let snap = session.snapshot();
        assert!(!snap.pending);
        assert_eq!(snap.messages.len(), 2);
        assert_eq!(snap.messages[0].kind, MessageKind::User);
        assert_eq!(snap.messages[1].kind, MessageKind::Error);
        assert_eq!(snap.messages[1].content, FAILURE_MESSAGE);
        assert!(backend.calls.lock().unwrap().is_empty());

        // The next question is accepted
        session.submit("again").unwrap();
        assert_eq!(session.snapshot().messages.len(), 4);
    }

    #[tokio::test]
    async fn test_poll_appends_once_finished() {
        let mut session = ChatSession::new(CannedBackend::new(segment_answer));
        session.submit("q").unwrap();

        let mut settled = false;
        for _ in 0..100 {
            if session.poll().await {
                settled = true;
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        assert!(settled);
        assert_eq!(session.conversation().messages().len(), 2);
        assert!(!session.poll().await);
    }
}
