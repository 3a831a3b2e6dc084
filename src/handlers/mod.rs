//! HTTP request handlers
//!
//! - `api` - Health check endpoint
//! - `voice` - Carrier voice webhooks (incoming call, speech respond)

pub mod api;
pub mod voice;

pub use voice::{incoming_call, respond, voice_status};
