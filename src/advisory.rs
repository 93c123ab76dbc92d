//! Farmer advisory derived from the rainfall prediction, with optional
//! translation and speech synthesis through the GhanaNLP API.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use crate::config::TranslationConfig;
use crate::{Result, TerraGraphError};

pub const RAIN_ADVICE: &str = "Rainfall is expected in the coming days. Consider adjusting your irrigation schedule and preparing for potential water accumulation.";
pub const DRY_ADVICE: &str = "No significant rainfall is expected. Ensure your crops have adequate irrigation and consider water conservation measures.";

const API_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
}

/// Fixed English advice for the predicted conditions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Advisory {
    pub rain_expected: bool,
    pub severity: Severity,
    pub text: String,
}

impl Advisory {
    #[must_use]
    pub fn for_prediction(rain_expected: bool) -> Self {
        if rain_expected {
            Self {
                rain_expected,
                severity: Severity::Info,
                text: RAIN_ADVICE.to_string(),
            }
        } else {
            Self {
                rain_expected,
                severity: Severity::Warning,
                text: DRY_ADVICE.to_string(),
            }
        }
    }
}

/// Translated advisory and its synthesized audio
#[derive(Debug, Clone)]
pub struct SpokenAdvisory {
    pub translated_text: String,
    pub audio: Vec<u8>,
    pub content_type: String,
}

/// Translation and speech client, available only with a caller-supplied key
pub struct AdvisoryVoice {
    client: Client,
    api_key: String,
    config: TranslationConfig,
}

impl AdvisoryVoice {
    /// `Ok(None)` when no usable key was supplied: the voice feature is
    /// simply off.
    pub fn from_key(api_key: Option<String>, config: &TranslationConfig) -> Result<Option<Self>> {
        let Some(api_key) = api_key.filter(|key| !key.trim().is_empty()) else {
            debug!("No translation API key supplied, voice advisory disabled");
            return Ok(None);
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(concat!("TerraGraph/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TerraGraphError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Some(Self {
            client,
            api_key: api_key.trim().to_string(),
            config: config.clone(),
        }))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Translate English text using the configured language pair
    #[instrument(skip(self, text))]
    pub async fn translate(&self, text: &str) -> Result<String> {
        let response = self
            .client
            .post(self.url("/v1/translate"))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&json!({ "in": text, "lang": self.config.language_pair }))
            .send()
            .await
            .map_err(|e| TerraGraphError::translation(format!("Translation request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Translation API returned an error");
            return Err(TerraGraphError::translation(format!(
                "Translation API returned {status}"
            )));
        }

        let body: Value = response.json().await.map_err(|e| {
            TerraGraphError::translation(format!("Failed to parse translation: {e}"))
        })?;

        match body {
            Value::String(translated) => Ok(translated),
            Value::Object(map) => map
                .get("translation")
                .or_else(|| map.get("out"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| TerraGraphError::translation("Translation missing in response")),
            _ => Err(TerraGraphError::translation("Unexpected translation response")),
        }
    }

    /// Synthesize speech in the configured voice language
    #[instrument(skip(self, text))]
    pub async fn synthesize(&self, text: &str) -> Result<(Vec<u8>, String)> {
        let response = self
            .client
            .post(self.url("/tts/v1/tts"))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&json!({ "text": text, "language": self.config.voice_language }))
            .send()
            .await
            .map_err(|e| TerraGraphError::translation(format!("Speech request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Speech API returned an error");
            return Err(TerraGraphError::translation(format!(
                "Speech API returned {status}"
            )));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("audio/wav")
            .to_string();
        let audio = response
            .bytes()
            .await
            .map_err(|e| TerraGraphError::translation(format!("Failed to read audio: {e}")))?;

        Ok((audio.to_vec(), content_type))
    }

    /// Translate the advisory and read it out
    pub async fn speak(&self, advisory: &Advisory) -> Result<SpokenAdvisory> {
        let translated_text = self.translate(&advisory.text).await?;
        let (audio, content_type) = self.synthesize(&translated_text).await?;
        info!("Synthesized {} bytes of advisory audio", audio.len());

        Ok(SpokenAdvisory {
            translated_text,
            audio,
            content_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TerraGraphConfig;

    fn translation_config() -> TranslationConfig {
        TerraGraphConfig::with_credentials("u", "p", "k").translation
    }

    #[test]
    fn test_advisory_for_rain() {
        let advisory = Advisory::for_prediction(true);
        assert_eq!(advisory.severity, Severity::Info);
        assert!(advisory.text.starts_with("Rainfall is expected"));
    }

    #[test]
    fn test_advisory_for_dry_weather() {
        let advisory = Advisory::for_prediction(false);
        assert_eq!(advisory.severity, Severity::Warning);
        assert!(advisory.text.contains("adequate irrigation"));
    }

    #[test]
    fn test_missing_key_disables_voice() {
        assert!(AdvisoryVoice::from_key(None, &translation_config()).unwrap().is_none());
        assert!(
            AdvisoryVoice::from_key(Some("  ".to_string()), &translation_config())
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_key_enables_voice() {
        let voice = AdvisoryVoice::from_key(Some("abc123".to_string()), &translation_config());
        assert!(voice.unwrap().is_some());
    }
}
