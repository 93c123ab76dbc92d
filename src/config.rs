//! Configuration management for the `TerraGraph` application
//!
//! Configuration is read once from environment variables at process start,
//! validated, and then shared read-only by every component.
//!
//! Credentials come from `API_USERNAME`, `API_PASSWORD` and `GROQ_API_KEY`.
//! Every other setting can be overridden with a `TERRAGRAPH_<SECTION>__<FIELD>`
//! variable, e.g. `TERRAGRAPH_SERVER__PORT=9000` or
//! `TERRAGRAPH_LLM__MODEL=llama3-8b-8192`.

use crate::{Result, TerraGraphError};
use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// Root configuration structure for the `TerraGraph` application
#[derive(Debug, Clone, Deserialize)]
pub struct TerraGraphConfig {
    /// Weather API configuration
    pub weather: WeatherConfig,
    /// Chat-completion API configuration
    pub llm: LlmConfig,
    /// Translation and speech API configuration
    #[serde(default)]
    pub translation: TranslationConfig,
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Weather API configuration settings
#[derive(Clone, Deserialize)]
pub struct WeatherConfig {
    /// Basic auth user name (`API_USERNAME`)
    pub username: String,
    /// Basic auth password (`API_PASSWORD`)
    pub password: String,
    /// Base URL for the weather API
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_weather_timeout")]
    pub timeout_seconds: u32,
}

/// Chat-completion API configuration settings
#[derive(Clone, Deserialize)]
pub struct LlmConfig {
    /// Bearer key (`GROQ_API_KEY`)
    pub api_key: String,
    /// Base URL of the OpenAI-compatible API
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    /// Model identifier
    #[serde(default = "default_llm_model")]
    pub model: String,
    /// Sampling temperature
    #[serde(default = "default_llm_temperature")]
    pub temperature: f32,
    /// Request timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_seconds: u32,
    /// Maximum number of retries for transient failures
    #[serde(default = "default_llm_max_retries")]
    pub max_retries: u32,
}

/// Translation and speech API settings. The key is supplied per request.
#[derive(Debug, Clone, Deserialize)]
pub struct TranslationConfig {
    #[serde(default = "default_translation_base_url")]
    pub base_url: String,
    /// Language pair used for translation, e.g. `en-tw`
    #[serde(default = "default_language_pair")]
    pub language_pair: String,
    /// Language used for speech synthesis, e.g. `tw`
    #[serde(default = "default_voice_language")]
    pub voice_language: String,
    #[serde(default = "default_weather_timeout")]
    pub timeout_seconds: u32,
}

/// HTTP server settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory holding the dashboard page
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    /// Maximum accepted upload size in MB
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: u32,
    /// PEM certificate and key; both set means HTTPS
    #[serde(default)]
    pub tls_cert: Option<PathBuf>,
    #[serde(default)]
    pub tls_key: Option<PathBuf>,
}

/// Logging configuration settings
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl fmt::Debug for WeatherConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeatherConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

// Default value functions
fn default_weather_base_url() -> String {
    "https://api.meteomatics.com".to_string()
}

fn default_weather_timeout() -> u32 {
    30
}

fn default_llm_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_llm_model() -> String {
    "mixtral-8x7b-32768".to_string()
}

fn default_llm_temperature() -> f32 {
    0.5
}

fn default_llm_timeout() -> u32 {
    60
}

fn default_llm_max_retries() -> u32 {
    2
}

fn default_translation_base_url() -> String {
    "https://translation-api.ghananlp.org".to_string()
}

fn default_language_pair() -> String {
    "en-tw".to_string()
}

fn default_voice_language() -> String {
    "tw".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

fn default_max_upload_mb() -> u32 {
    20
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            base_url: default_translation_base_url(),
            language_pair: default_language_pair(),
            voice_language: default_voice_language(),
            timeout_seconds: default_weather_timeout(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            static_dir: default_static_dir(),
            max_upload_mb: default_max_upload_mb(),
            tls_cert: None,
            tls_key: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl TerraGraphConfig {
    /// Configuration with default settings around the given credentials
    #[must_use]
    pub fn with_credentials(
        username: impl Into<String>,
        password: impl Into<String>,
        llm_api_key: impl Into<String>,
    ) -> Self {
        Self {
            weather: WeatherConfig {
                username: username.into(),
                password: password.into(),
                base_url: default_weather_base_url(),
                timeout_seconds: default_weather_timeout(),
            },
            llm: LlmConfig {
                api_key: llm_api_key.into(),
                base_url: default_llm_base_url(),
                model: default_llm_model(),
                temperature: default_llm_temperature(),
                timeout_seconds: default_llm_timeout(),
                max_retries: default_llm_max_retries(),
            },
            translation: TranslationConfig::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Load configuration from the process environment
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration from the given variables instead of the process
    /// environment when `vars` is `Some`.
    ///
    /// Missing credentials fail here rather than as an authentication
    /// error on the first request.
    pub fn load_from(vars: Option<HashMap<String, String>>) -> Result<Self> {
        let required = |key: &str| {
            let value = match &vars {
                Some(vars) => vars.get(key).cloned(),
                None => std::env::var(key).ok(),
            };
            value
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| TerraGraphError::config(format!("{key} is not set")))
        };
        let username = required("API_USERNAME")?;
        let password = required("API_PASSWORD")?;
        let api_key = required("GROQ_API_KEY")?;

        let settings = Config::builder()
            .add_source(
                Environment::with_prefix("TERRAGRAPH")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(vars.clone()),
            )
            .set_override("weather.username", username)
            .and_then(|builder| builder.set_override("weather.password", password))
            .and_then(|builder| builder.set_override("llm.api_key", api_key))
            .and_then(|builder| builder.build())
            .map_err(load_error)?;

        let mut config: Self = settings.try_deserialize().map_err(load_error)?;
        config.logging.level = config.logging.level.to_lowercase();
        config.logging.format = config.logging.format.to_lowercase();

        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.weather.timeout_seconds == 0 || self.weather.timeout_seconds > 300 {
            return Err(TerraGraphError::config(
                "Weather API timeout must be between 1 and 300 seconds",
            ));
        }

        if self.llm.timeout_seconds == 0 || self.llm.timeout_seconds > 300 {
            return Err(TerraGraphError::config(
                "LLM API timeout must be between 1 and 300 seconds",
            ));
        }

        if self.llm.max_retries > 10 {
            return Err(TerraGraphError::config("LLM API max retries cannot exceed 10"));
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(TerraGraphError::config(
                "LLM temperature must be between 0.0 and 2.0",
            ));
        }

        if self.server.max_upload_mb == 0 || self.server.max_upload_mb > 500 {
            return Err(TerraGraphError::config(
                "Upload limit must be between 1 and 500 MB",
            ));
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(TerraGraphError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            )));
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(TerraGraphError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            )));
        }

        for (name, url) in [
            ("Weather API", &self.weather.base_url),
            ("LLM API", &self.llm.base_url),
            ("Translation API", &self.translation.base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(TerraGraphError::config(format!(
                    "{name} base URL must be a valid HTTP or HTTPS URL"
                )));
            }
        }

        if self.server.tls_cert.is_some() != self.server.tls_key.is_some() {
            return Err(TerraGraphError::config(
                "TERRAGRAPH_SERVER__TLS_CERT and TERRAGRAPH_SERVER__TLS_KEY must be set together",
            ));
        }

        Ok(())
    }
}

fn load_error(err: ConfigError) -> TerraGraphError {
    TerraGraphError::config(format!("Failed to load configuration: {err}"))
}
