pub mod chat;
pub mod conversation;
pub mod twiml;

// Re-export commonly used types for convenience
pub use chat::{ChatClient, ChatMessage, ChatRole, DEFAULT_MODEL};
pub use conversation::{ConversationStore, MAX_HISTORY_TURNS, Role, Turn, ensure_window};
pub use twiml::{matches_goodbye_intent, render_gather, render_goodbye, render_reply};
