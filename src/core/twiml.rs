//! TwiML voice-response rendering.
//!
//! Three document shapes cover every reply the server makes: speak-then-listen,
//! speak-then-listen-again, and speak-then-hangup. The element and attribute
//! structure is a bit-exact contract with the carrier, so these templates are
//! the one place where formatting precision matters.
//!
//! All embedded text passes through [`escape_xml`]. Transcripts and model
//! output are caller-influenceable, and an unescaped angle bracket would let a
//! caller inject markup into the response document.

/// Escape the five XML-special characters in text and attribute values
pub fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Speak `prompt`, listen for speech, and submit the transcript to
/// `action_url`. If the carrier collects no speech before its timeout, speak
/// `fallback` and end the call.
pub fn render_gather(action_url: &str, prompt: &str, fallback: &str) -> String {
    format!(
        concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
            "<Response>\n",
            "  <Gather input=\"speech\" action=\"{}\" method=\"POST\" speechTimeout=\"auto\">\n",
            "    <Say>{}</Say>\n",
            "  </Gather>\n",
            "  <Say>{}</Say>\n",
            "  <Hangup/>\n",
            "</Response>",
        ),
        escape_xml(action_url),
        escape_xml(prompt),
        escape_xml(fallback),
    )
}

/// Speak `message`, then keep listening for the caller's next turn.
pub fn render_reply(message: &str, action_url: &str) -> String {
    format!(
        concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
            "<Response>\n",
            "  <Say>{}</Say>\n",
            "  <Gather input=\"speech\" action=\"{}\" method=\"POST\" speechTimeout=\"auto\"/>\n",
            "</Response>",
        ),
        escape_xml(message),
        escape_xml(action_url),
    )
}

/// Speak `farewell` and terminate the call.
pub fn render_goodbye(farewell: &str) -> String {
    format!(
        concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
            "<Response>\n",
            "  <Say>{}</Say>\n",
            "  <Hangup/>\n",
            "</Response>",
        ),
        escape_xml(farewell),
    )
}

/// Whether the transcript signals that the caller wants to end the call.
///
/// Case-insensitive substring match against the configured keyword list.
/// An empty transcript never matches.
pub fn matches_goodbye_intent(transcript: &str, keywords: &[String]) -> bool {
    let transcript = transcript.trim().to_lowercase();
    if transcript.is_empty() {
        return false;
    }
    keywords
        .iter()
        .any(|keyword| transcript.contains(keyword.as_str()))
}
