//! Chat-completion API client.
//!
//! Thin wrapper over the OpenAI `/chat/completions` endpoint. One request per
//! webhook turn, no retry and no streaming; a slow completion only delays the
//! one carrier request that is waiting on it. The base URL is overridable so
//! tests and gateways can point the client elsewhere.

use serde::{Deserialize, Serialize};

use crate::config::ServerConfig;
use crate::errors::{ChatError, ChatResult};

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Sampling temperature for scripted-sounding phone replies
const TEMPERATURE: f32 = 0.6;

/// Replies are spoken aloud; keep them short
const MAX_TOKENS: u32 = 180;

/// Wire role of a completion message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One message in the completion prompt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Configured client bound to credentials from the server configuration
#[derive(Debug)]
pub struct ChatClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl ChatClient {
    /// Build a client from the resolved configuration.
    ///
    /// Fails with [`ChatError::MissingApiKey`] when no key is configured; the
    /// caller keeps running and substitutes the fallback reply per turn.
    pub fn from_config(config: &ServerConfig) -> ChatResult<Self> {
        let api_key = config
            .openai_api_key
            .clone()
            .ok_or(ChatError::MissingApiKey)?;

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            model: config.openai_model.clone(),
        })
    }

    /// The model name sent with each request
    pub fn model(&self) -> &str {
        &self.model
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Run one completion over the given prompt and return the trimmed reply
    /// text of the first choice.
    pub async fn complete(&self, messages: &[ChatMessage]) -> ChatResult<String> {
        let request = CompletionRequest {
            model: &self.model,
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            messages,
        };

        let response = self
            .client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let completion: CompletionResponse = response.json().await?;
        let reply = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(ChatError::EmptyResponse)?;

        Ok(reply)
    }
}
