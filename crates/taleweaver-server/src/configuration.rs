use crate::error::{to_env_var, ConfigError, ENV_PREFIX};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use taleweaver::agent::{LoopSettings, DEFAULT_MAX_ROUNDS, DEFAULT_ROUND_TIMEOUT};
use taleweaver::providers::{
    anthropic::{ANTHROPIC_HOST, DEFAULT_MAX_TOKENS},
    configs::{
        AnthropicProviderConfig, OllamaProviderConfig, OpenAiProviderConfig, ProviderConfig,
    },
    ollama::OLLAMA_HOST,
    openai::OPENAI_HOST,
};

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

/// Where the rules, tone and scenario files live
#[derive(Debug, Deserialize)]
pub struct ContentSettings {
    #[serde(default = "default_content_root")]
    pub root: PathBuf,
}

impl Default for ContentSettings {
    fn default() -> Self {
        Self {
            root: default_content_root(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AgentSettings {
    #[serde(default = "default_max_rounds")]
    pub max_rounds: usize,
    #[serde(default = "default_round_timeout_secs")]
    pub round_timeout_secs: u64,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
            round_timeout_secs: default_round_timeout_secs(),
        }
    }
}

impl AgentSettings {
    pub fn loop_settings(&self) -> LoopSettings {
        LoopSettings {
            max_rounds: self.max_rounds,
            round_timeout: Duration::from_secs(self.round_timeout_secs),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OpenAiSettings {
    #[serde(default = "default_openai_host")]
    pub host: String,
    pub api_key: String,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct AnthropicSettings {
    #[serde(default = "default_anthropic_host")]
    pub host: String,
    pub api_key: String,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default = "default_anthropic_max_tokens")]
    pub max_tokens: i32,
}

#[derive(Debug, Deserialize)]
pub struct OllamaSettings {
    #[serde(default = "default_ollama_host")]
    pub host: String,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub content: ContentSettings,
    #[serde(default)]
    pub agent: AgentSettings,
    #[serde(default)]
    pub openai: Option<OpenAiSettings>,
    #[serde(default)]
    pub anthropic: Option<AnthropicSettings>,
    #[serde(default)]
    pub ollama: Option<OllamaSettings>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load_and_validate()
    }

    fn load_and_validate() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", i64::from(default_port()))?
            .set_default("content.root", ".")?
            .set_default("agent.max_rounds", default_max_rounds() as i64)?
            .set_default("agent.round_timeout_secs", default_round_timeout_secs() as i64)?
            // An optional taleweaver.toml in the working directory
            .add_source(File::with_name("taleweaver").required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let result: Result<Self, config::ConfigError> = config.try_deserialize();

        match result {
            Ok(settings) => Ok(settings),
            Err(err) => {
                tracing::debug!("Configuration error: {:?}", &err);

                let error_str = err.to_string();
                if let Some(field) = missing_field(&error_str) {
                    Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(&field),
                    })
                } else if let config::ConfigError::NotFound(field) = &err {
                    Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    })
                } else {
                    Err(ConfigError::Other(err))
                }
            }
        }
    }

    /// One provider config per backend section that is present
    pub fn provider_configs(&self) -> Vec<ProviderConfig> {
        let mut configs = Vec::new();
        if let Some(openai) = &self.openai {
            configs.push(ProviderConfig::OpenAi(OpenAiProviderConfig {
                host: openai.host.clone(),
                api_key: openai.api_key.clone(),
                temperature: openai.temperature,
                max_tokens: openai.max_tokens,
            }));
        }
        if let Some(anthropic) = &self.anthropic {
            configs.push(ProviderConfig::Anthropic(AnthropicProviderConfig {
                host: anthropic.host.clone(),
                api_key: anthropic.api_key.clone(),
                temperature: anthropic.temperature,
                max_tokens: Some(anthropic.max_tokens),
            }));
        }
        if let Some(ollama) = &self.ollama {
            configs.push(ProviderConfig::Ollama(OllamaProviderConfig {
                host: ollama.host.clone(),
                temperature: ollama.temperature,
                max_tokens: ollama.max_tokens,
            }));
        }
        configs
    }
}

/// Pull the dotted key out of a serde "missing field" message, which may carry
/// the enclosing section as `for key `section``
fn missing_field(error: &str) -> Option<String> {
    let (_, rest) = error.split_once("missing field `")?;
    let (field, rest) = rest.split_once('`')?;
    let section = rest
        .split_once("for key `")
        .and_then(|(_, key)| key.split_once('`'))
        .map(|(key, _)| key);
    Some(match section {
        Some(section) if !section.is_empty() => format!("{}.{}", section, field),
        _ => field.to_string(),
    })
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_content_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_max_rounds() -> usize {
    DEFAULT_MAX_ROUNDS
}

fn default_round_timeout_secs() -> u64 {
    DEFAULT_ROUND_TIMEOUT.as_secs()
}

fn default_openai_host() -> String {
    OPENAI_HOST.to_string()
}

fn default_anthropic_host() -> String {
    ANTHROPIC_HOST.to_string()
}

fn default_anthropic_max_tokens() -> i32 {
    DEFAULT_MAX_TOKENS
}

fn default_ollama_host() -> String {
    OLLAMA_HOST.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn clean_env() {
        for (key, _) in env::vars() {
            if key.starts_with("TALEWEAVER_") {
                env::remove_var(&key);
            }
        }
    }

    #[test]
    #[serial]
    fn test_default_settings() {
        clean_env();

        let settings = Settings::new().unwrap();
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.content.root, PathBuf::from("."));
        assert_eq!(settings.agent.loop_settings(), LoopSettings::default());
        assert!(settings.openai.is_none());
        assert!(settings.anthropic.is_none());
        assert!(settings.ollama.is_none());
        assert!(settings.provider_configs().is_empty());
    }

    #[test]
    #[serial]
    fn test_anthropic_settings() {
        clean_env();
        env::set_var("TALEWEAVER_ANTHROPIC__API_KEY", "test-key");
        env::set_var("TALEWEAVER_ANTHROPIC__TEMPERATURE", "0.7");

        let settings = Settings::new().unwrap();
        let anthropic = settings.anthropic.as_ref().unwrap();
        assert_eq!(anthropic.host, "https://api.anthropic.com");
        assert_eq!(anthropic.api_key, "test-key");
        assert_eq!(anthropic.temperature, Some(0.7));
        assert_eq!(anthropic.max_tokens, 1024);

        let configs = settings.provider_configs();
        assert_eq!(configs.len(), 1);
        if let ProviderConfig::Anthropic(config) = &configs[0] {
            assert_eq!(config.max_tokens, Some(1024));
        } else {
            panic!("Expected Anthropic provider");
        }

        clean_env();
    }

    #[test]
    #[serial]
    fn test_ollama_settings() {
        clean_env();
        env::set_var("TALEWEAVER_OLLAMA__HOST", "http://custom.ollama.host");
        env::set_var("TALEWEAVER_OLLAMA__MAX_TOKENS", "2000");

        let settings = Settings::new().unwrap();
        let ollama = settings.ollama.as_ref().unwrap();
        assert_eq!(ollama.host, "http://custom.ollama.host");
        assert_eq!(ollama.temperature, None);
        assert_eq!(ollama.max_tokens, Some(2000));

        clean_env();
    }

    #[test]
    #[serial]
    fn test_environment_override() {
        clean_env();
        env::set_var("TALEWEAVER_SERVER__PORT", "8080");
        env::set_var("TALEWEAVER_CONTENT__ROOT", "/srv/adventures");
        env::set_var("TALEWEAVER_AGENT__MAX_ROUNDS", "3");
        env::set_var("TALEWEAVER_AGENT__ROUND_TIMEOUT_SECS", "30");
        env::set_var("TALEWEAVER_OPENAI__API_KEY", "test-key");
        env::set_var("TALEWEAVER_OPENAI__HOST", "https://custom.openai.com");

        let settings = Settings::new().unwrap();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.content.root, PathBuf::from("/srv/adventures"));
        assert_eq!(
            settings.agent.loop_settings(),
            LoopSettings {
                max_rounds: 3,
                round_timeout: Duration::from_secs(30),
            }
        );

        let openai = settings.openai.as_ref().unwrap();
        assert_eq!(openai.host, "https://custom.openai.com");
        assert_eq!(openai.api_key, "test-key");

        clean_env();
    }

    #[test]
    #[serial]
    fn test_missing_api_key_names_env_var() {
        clean_env();
        env::set_var("TALEWEAVER_OPENAI__TEMPERATURE", "0.2");

        match Settings::new() {
            Err(ConfigError::MissingEnvVar { env_var }) => {
                assert!(env_var.starts_with("TALEWEAVER_"));
                assert!(env_var.ends_with("API_KEY"));
            }
            other => panic!("Expected missing env var error, got {:?}", other),
        }

        clean_env();
    }

    #[test]
    fn test_missing_field_parsing() {
        assert_eq!(
            missing_field("missing field `api_key` for key `openai`"),
            Some("openai.api_key".to_string())
        );
        assert_eq!(missing_field("missing field `type`"), Some("type".to_string()));
        assert_eq!(missing_field("invalid type"), None);
    }

    #[test]
    fn test_socket_addr_conversion() {
        let server_settings = ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 3000,
        };
        let addr = server_settings.socket_addr().unwrap();
        assert_eq!(addr.to_string(), "127.0.0.1:3000");
    }
}
