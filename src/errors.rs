//! Error types for the chat-completion client.
//!
//! Handler code never surfaces these to the carrier: a failed completion is
//! logged and replaced with the configured fallback sentence, so the caller
//! always hears well-formed markup.

use thiserror::Error;

/// Result type for chat-completion operations
pub type ChatResult<T> = Result<T, ChatError>;

/// Errors from the chat-completion API client
#[derive(Error, Debug)]
pub enum ChatError {
    /// No API key was configured at startup
    #[error("OpenAI API key not configured in server environment")]
    MissingApiKey,

    /// Network-level failure (connect, timeout, body read)
    #[error("chat completion request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("chat completion API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The API answered 200 but the first choice carried no usable text
    #[error("chat completion response contained no content")]
    EmptyResponse,
}
