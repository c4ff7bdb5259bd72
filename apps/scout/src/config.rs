use std::time::Duration;

use anyhow::{Context, Result};

use crate::generation::GenerationSettings;
use crate::llm_client::{LlmSettings, DEFAULT_API_URL, DEFAULT_MODEL};

/// Application configuration loaded from environment variables.
/// Passed explicitly to everything that needs it; there is no global model handle.
#[derive(Debug, Clone)]
pub struct Config {
    pub llm_api_key: String,
    pub llm_api_url: String,
    pub llm_model: String,
    pub llm_temperature: f32,
    pub llm_max_tokens: u32,
    /// Validation retries per stage.
    pub llm_max_retries: u32,
    pub llm_timeout: Duration,
    /// Retrieval is disabled when unset.
    pub serper_api_key: Option<String>,
    /// Requests-per-minute ceiling shared by model and retrieval calls. 0 disables it.
    pub max_rpm: u32,
    pub max_tool_rounds: u32,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            llm_api_key: require_env("LLM_API_KEY")?,
            llm_api_url: env_or("LLM_API_URL", DEFAULT_API_URL),
            llm_model: env_or("LLM_MODEL", DEFAULT_MODEL),
            llm_temperature: parse_env("LLM_TEMPERATURE", 0.1)?,
            llm_max_tokens: parse_env("LLM_MAX_TOKENS", 8192)?,
            llm_max_retries: parse_env("LLM_MAX_RETRIES", 3)?,
            llm_timeout: Duration::from_secs(parse_env("LLM_TIMEOUT_SECS", 120)?),
            serper_api_key: std::env::var("SERPER_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            max_rpm: parse_env("MAX_RPM", 10)?,
            max_tool_rounds: parse_env("MAX_TOOL_ROUNDS", 4)?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }

    pub fn llm_settings(&self) -> LlmSettings {
        LlmSettings {
            api_url: self.llm_api_url.clone(),
            api_key: self.llm_api_key.clone(),
            model: self.llm_model.clone(),
            temperature: self.llm_temperature,
            max_tokens: self.llm_max_tokens,
            timeout: self.llm_timeout,
        }
    }

    pub fn generation_settings(&self) -> GenerationSettings {
        GenerationSettings {
            max_retries: self.llm_max_retries,
            request_timeout: self.llm_timeout,
            max_tool_rounds: self.max_tool_rounds,
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid {}", std::any::type_name::<T>())),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_uses_default_when_unset() {
        let value: u32 = parse_env("OPENSCOUT_TEST_UNSET_VARIABLE", 7).unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn test_parse_env_rejects_garbage() {
        std::env::set_var("OPENSCOUT_TEST_BAD_RPM", "ten");
        let err = parse_env::<u32>("OPENSCOUT_TEST_BAD_RPM", 10).unwrap_err();
        assert!(err.to_string().contains("OPENSCOUT_TEST_BAD_RPM must be a valid u32"));
    }

    #[test]
    fn test_settings_are_derived_from_config() {
        let config = Config {
            llm_api_key: "key".to_string(),
            llm_api_url: DEFAULT_API_URL.to_string(),
            llm_model: DEFAULT_MODEL.to_string(),
            llm_temperature: 0.1,
            llm_max_tokens: 8192,
            llm_max_retries: 5,
            llm_timeout: Duration::from_secs(90),
            serper_api_key: None,
            max_rpm: 10,
            max_tool_rounds: 2,
            rust_log: "info".to_string(),
        };
        let generation = config.generation_settings();
        assert_eq!(generation.max_retries, 5);
        assert_eq!(generation.request_timeout, Duration::from_secs(90));
        assert_eq!(generation.max_tool_rounds, 2);
        assert_eq!(config.llm_settings().max_tokens, 8192);
    }
}
