//! Carrier voice webhooks.
//!
//! Two entry points model the per-call flow: `incoming_call` answers a new
//! call with the greeting and starts listening; `respond` consumes each
//! transcribed utterance and speaks the next reply. Every path renders
//! well-formed TwiML - the carrier must never see a bare error, so completion
//! failures degrade to the configured apology sentence instead.

use std::sync::Arc;

use axum::extract::rejection::FormRejection;
use axum::extract::{Form, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::core::chat::ChatMessage;
use crate::core::conversation::{Role, Turn, ensure_window};
use crate::core::twiml;
use crate::errors::ChatError;
use crate::state::AppState;

/// Spoken when a respond callback arrives without a call SID
const MISSING_CALL_FAREWELL: &str =
    "I ran into a technical issue identifying this call. Please try again later.";

/// TwiML response body with the carrier's expected content type
pub struct Twiml(pub String);

impl IntoResponse for Twiml {
    fn into_response(self) -> Response {
        ([(header::CONTENT_TYPE, "text/xml")], self.0).into_response()
    }
}

/// Form fields the carrier posts to the respond endpoint
#[derive(Debug, Deserialize)]
pub struct RespondForm {
    #[serde(rename = "CallSid", default)]
    pub call_sid: String,
    #[serde(rename = "SpeechResult", default)]
    pub speech_result: String,
}

/// What a respond request should do, classified from its fields alone
///
/// Making this a pure decision keeps the awkward edge cases (respond after
/// goodbye, respond with no history, missing SID) testable without a server.
#[derive(Debug, PartialEq, Eq)]
enum RespondAction {
    /// Missing call SID: farewell markup with a 400 status
    Reject,
    /// No speech detected: re-prompt and keep listening
    Reprompt,
    /// Goodbye intent: clear history and end the call
    Farewell,
    /// Normal turn exchange with the trimmed transcript
    Reply(String),
}

fn classify_respond(call_sid: &str, speech_result: &str, keywords: &[String]) -> RespondAction {
    if call_sid.trim().is_empty() {
        return RespondAction::Reject;
    }

    let transcript = speech_result.trim();
    if transcript.is_empty() {
        return RespondAction::Reprompt;
    }

    if twiml::matches_goodbye_intent(transcript, keywords) {
        return RespondAction::Farewell;
    }

    RespondAction::Reply(transcript.to_string())
}

/// System instruction + windowed history + the caller's new utterance
fn build_prompt(system_prompt: &str, history: &[Turn], transcript: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(system_prompt));
    for turn in history {
        messages.push(match turn.role {
            Role::User => ChatMessage::user(turn.text.clone()),
            Role::Assistant => ChatMessage::assistant(turn.text.clone()),
        });
    }
    messages.push(ChatMessage::user(transcript));
    messages
}

/// Handler for POST /voice/incoming - greet the caller and start listening
pub async fn incoming_call(State(state): State<Arc<AppState>>) -> Twiml {
    let assistant = &state.config.assistant;
    Twiml(twiml::render_gather(
        &state.config.respond_action_url(),
        &assistant.greeting,
        &assistant.no_input_message,
    ))
}

/// Handler for GET /voice/incoming - static status payload for configuration
/// verification
pub async fn voice_status(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message":
            "Configure your Twilio phone number to POST incoming voice calls to this endpoint.",
        "active_conversations": state.conversations.len(),
    }))
}

/// Handler for POST /voice/respond - one conversation turn
///
/// The store is mutated only after the completion call resolves; a request
/// rejected before producing a transcript never touches state.
///
/// Extraction failures (wrong content type, undecodable body) are reported in
/// TwiML like every other error, not as the extractor's plain-text rejection.
pub async fn respond(
    State(state): State<Arc<AppState>>,
    form: Result<Form<RespondForm>, FormRejection>,
) -> Response {
    let Form(form) = match form {
        Ok(form) => form,
        Err(rejection) => {
            tracing::warn!("unreadable respond callback body: {rejection}");
            return (
                StatusCode::BAD_REQUEST,
                Twiml(twiml::render_goodbye(MISSING_CALL_FAREWELL)),
            )
                .into_response();
        }
    };

    let assistant = &state.config.assistant;
    let action_url = state.config.respond_action_url();

    match classify_respond(&form.call_sid, &form.speech_result, &state.config.goodbye_keywords) {
        RespondAction::Reject => {
            tracing::warn!("respond callback without a CallSid");
            (
                StatusCode::BAD_REQUEST,
                Twiml(twiml::render_goodbye(MISSING_CALL_FAREWELL)),
            )
                .into_response()
        }
        RespondAction::Reprompt => Twiml(twiml::render_gather(
            &action_url,
            &assistant.reprompt,
            &assistant.no_input_message,
        ))
        .into_response(),
        RespondAction::Farewell => {
            tracing::info!(call_sid = %form.call_sid, "caller said goodbye, ending call");
            state.conversations.clear(&form.call_sid);
            Twiml(twiml::render_goodbye(&assistant.farewell)).into_response()
        }
        RespondAction::Reply(transcript) => {
            let history = state.conversations.get(&form.call_sid);
            let messages = build_prompt(&assistant.system_prompt, &history, &transcript);

            let completion = match &state.chat {
                Some(client) => client.complete(&messages).await,
                None => Err(ChatError::MissingApiKey),
            };
            let reply = match completion {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(call_sid = %form.call_sid, "chat completion failed: {e}");
                    assistant.fallback.clone()
                }
            };

            let mut turns = history;
            turns.push(Turn::user(transcript));
            turns.push(Turn::assistant(reply.clone()));
            state
                .conversations
                .update(&form.call_sid, ensure_window(turns));

            Twiml(twiml::render_reply(&reply, &action_url)).into_response()
        }
    }
}
