use secrecy::SecretString;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "llama3-8b-8192";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;
const DEFAULT_MAX_PROMPT_CHARS: usize = 24_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("GROQ_API_KEY is not set. Please set it in your .env file")]
    MissingApiKey,

    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Settings for the outbound completion API.
#[derive(Debug, Clone)]
pub struct GroqConfig {
    pub api_key: SecretString,
    pub api_url: String,
    pub model: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub groq: GroqConfig,
    pub bind_addr: SocketAddr,
    pub max_upload_bytes: usize,
    /// Characters of extracted text allowed into the summarization prompt.
    pub max_prompt_chars: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("GROQ_API_KEY")
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let api_url = lookup("GROQ_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        if api_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "GROQ_API_URL",
                value: api_url,
                reason: "endpoint URL must not be empty".to_string(),
            });
        }
        let model = lookup("GROQ_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        if model.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "GROQ_MODEL",
                value: model,
                reason: "model identifier must not be empty".to_string(),
            });
        }

        let timeout_secs: u64 = parse_or(&lookup, "GROQ_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "GROQ_TIMEOUT_SECS",
                value: "0".to_string(),
                reason: "timeout must be at least one second".to_string(),
            });
        }

        let bind_addr = parse_or(
            &lookup,
            "PDFCHAT_BIND_ADDR",
            SocketAddr::from(([127, 0, 0, 1], 8000)),
        )?;
        let max_upload_bytes = parse_or(&lookup, "PDFCHAT_MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?;
        let max_prompt_chars = parse_or(&lookup, "PDFCHAT_MAX_PROMPT_CHARS", DEFAULT_MAX_PROMPT_CHARS)?;

        Ok(Self {
            groq: GroqConfig {
                api_key: SecretString::from(api_key),
                api_url,
                model,
                timeout: Duration::from_secs(timeout_secs),
            },
            bind_addr,
            max_upload_bytes,
            max_prompt_chars,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        }),
    }
}
