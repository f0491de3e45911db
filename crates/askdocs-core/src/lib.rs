pub mod client;
pub mod config;
pub mod conversation;
pub mod error;
pub mod render;
pub mod session;
pub mod state;

// Re-export main types for convenience
pub use client::{AskBackend, AskClient, HealthStatus, DEFAULT_ENDPOINT};
pub use config::Config;
pub use conversation::Conversation;
pub use error::{AskError, SubmitRejected};
pub use render::{render_message, RenderedMessage};
pub use session::ChatSession;
pub use state::{Answer, HistoryEntry, HistoryRole, Message, MessageKind, Snapshot, FAILURE_MESSAGE};
