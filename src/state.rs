//! Shared application state.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::core::chat::ChatClient;
use crate::core::conversation::ConversationStore;

/// State shared by every handler through `axum::extract::State`
///
/// The conversation store is the only mutable resource; everything else is
/// resolved once at startup and read-only afterwards.
pub struct AppState {
    pub config: ServerConfig,
    pub conversations: ConversationStore,
    /// `None` when no API key is configured; respond requests then fall back
    /// to the configured apology reply instead of failing the call.
    pub chat: Option<ChatClient>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Arc<Self> {
        let chat = match ChatClient::from_config(&config) {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!("chat completions disabled: {e}");
                None
            }
        };

        Arc::new(Self {
            conversations: ConversationStore::new(config.conversation_idle_ttl()),
            chat,
            config,
        })
    }
}
