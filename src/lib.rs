pub mod config;
pub mod core;
pub mod errors;
pub mod handlers;
pub mod routes;
pub mod state;

// Re-export commonly used items for convenience
pub use config::ServerConfig;
pub use core::chat::{ChatClient, ChatMessage, ChatRole, DEFAULT_MODEL};
pub use core::conversation::{ConversationStore, MAX_HISTORY_TURNS, Role, Turn};
pub use errors::{ChatError, ChatResult};
pub use state::AppState;
