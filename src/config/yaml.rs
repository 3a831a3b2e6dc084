use serde::Deserialize;
use std::path::PathBuf;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Values specified
/// here override environment variables (and therefore also `.env` and
/// built-in defaults).
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 8080
///   public_url: "https://bot.example.com"
///   tls:
///     cert_path: "/etc/voicedesk/cert.pem"
///     key_path: "/etc/voicedesk/key.pem"
///
/// openai:
///   api_key: "sk-..."
///   base_url: "https://api.openai.com/v1"
///   model: "gpt-4o-mini"
///
/// assistant:
///   name: "Avery"
///   company: "Acme Plumbing"
///   greeting: "Hi, this is Avery. What can I do for you today?"
///   farewell: "Thanks for calling. Goodbye!"
///
/// conversation:
///   goodbye_keywords: "goodbye, bye, hang up"
///   idle_ttl_seconds: 900
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub openai: Option<OpenAiYaml>,
    pub assistant: Option<AssistantYaml>,
    pub conversation: Option<ConversationYaml>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Externally reachable base URL, used to build the gather action URL
    pub public_url: Option<String>,
    pub tls: Option<TlsYaml>,
}

/// TLS configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TlsYaml {
    pub cert_path: Option<PathBuf>,
    pub key_path: Option<PathBuf>,
}

/// Chat-completion API settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct OpenAiYaml {
    pub api_key: Option<String>,
    /// Override for the API base URL (gateways, mock servers)
    pub base_url: Option<String>,
    pub model: Option<String>,
}

/// Assistant persona and spoken copy from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AssistantYaml {
    pub name: Option<String>,
    pub company: Option<String>,
    pub greeting: Option<String>,
    pub no_input_message: Option<String>,
    pub reprompt: Option<String>,
    pub farewell: Option<String>,
    pub fallback: Option<String>,
    pub system_prompt: Option<String>,
}

/// Conversation store settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ConversationYaml {
    /// Comma-separated goodbye keyword list
    pub goodbye_keywords: Option<String>,
    /// Idle seconds before a conversation is evicted (0 disables)
    pub idle_ttl_seconds: Option<u64>,
}

impl YamlConfig {
    /// Load a YAML configuration file from disk
    pub fn from_file(path: &PathBuf) -> Result<Self, super::ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| super::ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        serde_yaml::from_str(&contents).map_err(|source| super::ConfigError::Parse {
            path: path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_yaml() {
        let yaml = r#"
server:
  port: 9090
assistant:
  name: "Robin"
"#;
        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.unwrap().port, Some(9090));
        let assistant = config.assistant.unwrap();
        assert_eq!(assistant.name.as_deref(), Some("Robin"));
        assert!(assistant.greeting.is_none());
        assert!(config.openai.is_none());
    }

    #[test]
    fn parses_empty_document_as_default() {
        let config: YamlConfig = serde_yaml::from_str("{}").unwrap();
        assert!(config.server.is_none());
        assert!(config.conversation.is_none());
    }
}
