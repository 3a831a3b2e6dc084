//! Configuration module for the Voicedesk server
//!
//! Configuration is resolved once at startup into an immutable [`ServerConfig`]
//! that is injected into handlers through the application state. Sources are
//! merged with the priority: YAML > ENV vars > .env values > defaults.
//! The `.env` file is loaded in `main.rs` before any of this runs, so by the
//! time these functions read the environment the two lowest layers are already
//! collapsed into one.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

mod yaml;

pub use yaml::YamlConfig;

/// Errors raised while loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },

    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("TLS requires both a certificate path and a key path")]
    IncompleteTls,
}

/// TLS configuration for HTTPS webhooks
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// Path to the TLS certificate file (PEM format)
    pub cert_path: PathBuf,
    /// Path to the TLS private key file (PEM format)
    pub key_path: PathBuf,
}

/// Assistant persona and all spoken copy, fully resolved
///
/// Every field holds the final sentence the carrier will speak; defaults are
/// applied during [`ServerConfig`] resolution, never at call sites.
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// Display name the assistant introduces itself with
    pub name: String,
    /// Company name woven into the default system prompt
    pub company: String,
    /// Greeting spoken when a call first connects
    pub greeting: String,
    /// Spoken when a gather collects no speech before the carrier timeout
    pub no_input_message: String,
    /// Spoken when a respond callback arrives with an empty transcript
    pub reprompt: String,
    /// Spoken when the caller signals goodbye intent
    pub farewell: String,
    /// Substitute reply when the completion API fails
    pub fallback: String,
    /// System instruction sent as the first completion message
    pub system_prompt: String,
}

/// Server configuration
///
/// Contains everything needed to run the webhook server:
/// - Server settings (host, port, public URL, TLS)
/// - Chat-completion API settings (key, base URL, model)
/// - Assistant persona and spoken copy
/// - Conversation store settings (goodbye keywords, idle eviction)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,
    /// Externally reachable base URL; gather action URLs are built from this
    pub public_url: String,

    // TLS configuration (optional)
    pub tls: Option<TlsConfig>,

    // Chat-completion API settings
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,

    // Assistant persona
    pub assistant: AssistantConfig,

    // Conversation settings
    /// Lowercased keyword list matched against transcripts as substrings
    pub goodbye_keywords: Vec<String>,
    /// Seconds a conversation may sit idle before eviction (0 disables)
    pub conversation_idle_ttl_seconds: u64,
}

/// Zeroize the API key when the config is dropped so the secret does not
/// linger in freed memory.
impl Drop for ServerConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        if let Some(ref mut key) = self.openai_api_key {
            key.zeroize();
        }
    }
}

pub(crate) const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub(crate) const DEFAULT_ASSISTANT_NAME: &str = "Avery";
pub(crate) const DEFAULT_COMPANY: &str = "our team";
pub(crate) const DEFAULT_NO_INPUT_MESSAGE: &str =
    "I did not hear anything, but you can call back any time.";
pub(crate) const DEFAULT_REPROMPT: &str =
    "I did not catch that. Could you repeat what you need help with?";
pub(crate) const DEFAULT_FAREWELL: &str =
    "It was great speaking with you. I'll end the call now. Goodbye!";
pub(crate) const DEFAULT_FALLBACK: &str =
    "I'm having trouble responding right now, but we'll follow up with you shortly.";
const DEFAULT_GOODBYE_KEYWORDS: &[&str] =
    &["goodbye", "bye", "hang up", "that's all", "thank you", "thanks"];
const DEFAULT_IDLE_TTL_SECONDS: u64 = 900;

fn default_greeting(name: &str) -> String {
    format!("Hi, this is {name}. I'm here to help. What can I do for you today?")
}

fn default_system_prompt(name: &str, company: &str) -> String {
    [
        format!("You are {name}, a warm and professional phone concierge for {company}."),
        "Speak naturally in short sentences (15 words or fewer) and keep a calm, confident tone."
            .to_string(),
        "Always confirm caller intent, gather key details, and reassure the caller that you can help."
            .to_string(),
        "Never mention that you are an AI model. Do not invent information you do not have."
            .to_string(),
        "If a request requires human follow-up, offer to take a message or schedule a call back."
            .to_string(),
        "If the caller asks for a person, check availability, then offer to take contact info or schedule."
            .to_string(),
    ]
    .join(" ")
}

/// Read an environment variable, treating blank values as unset
fn env_opt(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Split a comma-separated keyword list into trimmed lowercase entries.
/// A list that is set but contains only separators falls back to the defaults.
fn parse_goodbye_keywords(raw: Option<String>) -> Vec<String> {
    let parsed: Vec<String> = raw
        .as_deref()
        .map(|list| {
            list.split(',')
                .map(|keyword| keyword.trim().to_lowercase())
                .filter(|keyword| !keyword.is_empty())
                .collect()
        })
        .unwrap_or_default();

    if parsed.is_empty() {
        DEFAULT_GOODBYE_KEYWORDS
            .iter()
            .map(|keyword| keyword.to_string())
            .collect()
    } else {
        parsed
    }
}

/// Merge environment variables (base) with optional YAML overrides into a
/// fully resolved configuration.
fn merge_config(overrides: Option<YamlConfig>) -> Result<ServerConfig, ConfigError> {
    let overrides = overrides.unwrap_or_default();
    let server = overrides.server.unwrap_or_default();
    let server_tls = server.tls.unwrap_or_default();
    let openai = overrides.openai.unwrap_or_default();
    let assistant = overrides.assistant.unwrap_or_default();
    let conversation = overrides.conversation.unwrap_or_default();

    let host = server
        .host
        .or_else(|| env_opt("HOST"))
        .unwrap_or_else(|| "0.0.0.0".to_string());

    let port = match server.port {
        Some(port) => port,
        None => match env_opt("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidValue {
                    var: "PORT",
                    value: raw,
                })?,
            None => 8080,
        },
    };

    let public_url = server
        .public_url
        .or_else(|| env_opt("PUBLIC_URL"))
        .unwrap_or_else(|| format!("http://{host}:{port}"));

    let cert_path = server_tls
        .cert_path
        .or_else(|| env_opt("TLS_CERT_PATH").map(PathBuf::from));
    let key_path = server_tls
        .key_path
        .or_else(|| env_opt("TLS_KEY_PATH").map(PathBuf::from));
    let tls = match (cert_path, key_path) {
        (Some(cert_path), Some(key_path)) => Some(TlsConfig {
            cert_path,
            key_path,
        }),
        (None, None) => None,
        _ => return Err(ConfigError::IncompleteTls),
    };

    let name = assistant
        .name
        .or_else(|| env_opt("ASSISTANT_NAME"))
        .unwrap_or_else(|| DEFAULT_ASSISTANT_NAME.to_string());
    let company = assistant
        .company
        .or_else(|| env_opt("ASSISTANT_COMPANY"))
        .unwrap_or_else(|| DEFAULT_COMPANY.to_string());

    let assistant = AssistantConfig {
        greeting: assistant
            .greeting
            .or_else(|| env_opt("ASSISTANT_GREETING"))
            .unwrap_or_else(|| default_greeting(&name)),
        no_input_message: assistant
            .no_input_message
            .or_else(|| env_opt("ASSISTANT_NO_INPUT_MESSAGE"))
            .unwrap_or_else(|| DEFAULT_NO_INPUT_MESSAGE.to_string()),
        reprompt: assistant
            .reprompt
            .or_else(|| env_opt("ASSISTANT_REPROMPT"))
            .unwrap_or_else(|| DEFAULT_REPROMPT.to_string()),
        farewell: assistant
            .farewell
            .or_else(|| env_opt("ASSISTANT_FAREWELL"))
            .unwrap_or_else(|| DEFAULT_FAREWELL.to_string()),
        fallback: assistant
            .fallback
            .or_else(|| env_opt("ASSISTANT_FALLBACK"))
            .unwrap_or_else(|| DEFAULT_FALLBACK.to_string()),
        system_prompt: assistant
            .system_prompt
            .or_else(|| env_opt("ASSISTANT_SYSTEM_PROMPT"))
            .unwrap_or_else(|| default_system_prompt(&name, &company)),
        name,
        company,
    };

    let conversation_idle_ttl_seconds = match conversation.idle_ttl_seconds {
        Some(seconds) => seconds,
        None => match env_opt("CONVERSATION_IDLE_TTL_SECONDS") {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidValue {
                    var: "CONVERSATION_IDLE_TTL_SECONDS",
                    value: raw,
                })?,
            None => DEFAULT_IDLE_TTL_SECONDS,
        },
    };

    Ok(ServerConfig {
        host,
        port,
        public_url,
        tls,
        openai_api_key: openai.api_key.or_else(|| env_opt("OPENAI_API_KEY")),
        openai_base_url: openai
            .base_url
            .or_else(|| env_opt("OPENAI_BASE_URL"))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        openai_model: openai
            .model
            .or_else(|| env_opt("OPENAI_MODEL"))
            .unwrap_or_else(|| crate::core::chat::DEFAULT_MODEL.to_string()),
        assistant,
        goodbye_keywords: parse_goodbye_keywords(
            conversation
                .goodbye_keywords
                .or_else(|| env_opt("GOODBYE_KEYWORDS")),
        ),
        conversation_idle_ttl_seconds,
    })
}

impl ServerConfig {
    /// Load configuration from environment variables only
    pub fn from_env() -> Result<Self, ConfigError> {
        merge_config(None)
    }

    /// Load configuration from a YAML file with environment variable base
    ///
    /// Priority order (highest to lowest): YAML file values, environment
    /// variables, `.env` file values, built-in defaults.
    pub fn from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let yaml_config = YamlConfig::from_file(path)?;
        merge_config(Some(yaml_config))
    }

    /// Get the server bind address as "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if TLS is enabled
    pub fn is_tls_enabled(&self) -> bool {
        self.tls.is_some()
    }

    /// The absolute URL the carrier submits speech results to
    pub fn respond_action_url(&self) -> String {
        format!("{}/voice/respond", self.public_url.trim_end_matches('/'))
    }

    /// Idle eviction interval for the conversation store, `None` when disabled
    pub fn conversation_idle_ttl(&self) -> Option<Duration> {
        if self.conversation_idle_ttl_seconds == 0 {
            None
        } else {
            Some(Duration::from_secs(self.conversation_idle_ttl_seconds))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const ALL_VARS: &[&str] = &[
        "HOST",
        "PORT",
        "PUBLIC_URL",
        "TLS_CERT_PATH",
        "TLS_KEY_PATH",
        "OPENAI_API_KEY",
        "OPENAI_BASE_URL",
        "OPENAI_MODEL",
        "ASSISTANT_NAME",
        "ASSISTANT_COMPANY",
        "ASSISTANT_GREETING",
        "ASSISTANT_NO_INPUT_MESSAGE",
        "ASSISTANT_REPROMPT",
        "ASSISTANT_FAREWELL",
        "ASSISTANT_FALLBACK",
        "ASSISTANT_SYSTEM_PROMPT",
        "GOODBYE_KEYWORDS",
        "CONVERSATION_IDLE_TTL_SECONDS",
    ];

    fn clear_env() {
        for var in ALL_VARS {
            unsafe { std::env::remove_var(var) };
        }
    }

    #[test]
    #[serial]
    fn defaults_resolve_with_empty_environment() {
        clear_env();
        let config = ServerConfig::from_env().unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.public_url, "http://0.0.0.0:8080");
        assert!(config.openai_api_key.is_none());
        assert_eq!(config.openai_model, "gpt-4o-mini");
        assert_eq!(config.assistant.name, "Avery");
        assert!(config.assistant.greeting.contains("Avery"));
        assert!(config.assistant.system_prompt.contains("our team"));
        assert!(config.goodbye_keywords.contains(&"goodbye".to_string()));
        assert_eq!(config.conversation_idle_ttl_seconds, 900);
        assert!(!config.is_tls_enabled());
    }

    #[test]
    #[serial]
    fn environment_overrides_defaults() {
        clear_env();
        unsafe {
            std::env::set_var("PORT", "9099");
            std::env::set_var("ASSISTANT_NAME", "Robin");
            std::env::set_var("PUBLIC_URL", "https://bot.example.com/");
        }

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.port, 9099);
        assert_eq!(config.assistant.name, "Robin");
        // The default greeting tracks the configured name
        assert!(config.assistant.greeting.contains("Robin"));
        assert_eq!(
            config.respond_action_url(),
            "https://bot.example.com/voice/respond"
        );

        clear_env();
    }

    #[test]
    #[serial]
    fn yaml_overrides_environment() {
        clear_env();
        unsafe { std::env::set_var("ASSISTANT_NAME", "FromEnv") };

        let yaml: YamlConfig = serde_yaml::from_str(
            r#"
assistant:
  name: "FromYaml"
server:
  port: 4040
"#,
        )
        .unwrap();

        let config = merge_config(Some(yaml)).unwrap();
        assert_eq!(config.assistant.name, "FromYaml");
        assert_eq!(config.port, 4040);

        clear_env();
    }

    #[test]
    #[serial]
    fn invalid_port_is_rejected() {
        clear_env();
        unsafe { std::env::set_var("PORT", "not-a-port") };

        let err = ServerConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var: "PORT", .. }));

        clear_env();
    }

    #[test]
    #[serial]
    fn tls_requires_both_paths() {
        clear_env();
        unsafe { std::env::set_var("TLS_CERT_PATH", "/tmp/cert.pem") };

        let err = ServerConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::IncompleteTls));

        clear_env();
    }

    #[test]
    fn goodbye_keywords_parse_and_normalize() {
        let parsed = parse_goodbye_keywords(Some("Goodbye, Hang Up ,  ciao".to_string()));
        assert_eq!(parsed, vec!["goodbye", "hang up", "ciao"]);

        // Blank list falls back to defaults
        let fallback = parse_goodbye_keywords(Some(" , ,".to_string()));
        assert!(fallback.contains(&"thanks".to_string()));

        let unset = parse_goodbye_keywords(None);
        assert!(unset.contains(&"bye".to_string()));
    }

    #[test]
    fn idle_ttl_zero_disables_eviction() {
        let mut config = test_support::minimal_config();
        config.conversation_idle_ttl_seconds = 0;
        assert!(config.conversation_idle_ttl().is_none());

        config.conversation_idle_ttl_seconds = 30;
        assert_eq!(
            config.conversation_idle_ttl(),
            Some(Duration::from_secs(30))
        );
    }
}
