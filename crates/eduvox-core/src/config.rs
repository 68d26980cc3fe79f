//! Configuration models.
//!
//! `RootConfig` is the shape of `config.toml`; `SecretConfig` is the shape
//! of `secret.json`. Defaults reproduce the application's stock behavior, so
//! a missing or empty config file is fully usable.

use serde::{Deserialize, Serialize};

/// Speaking rate for synthesized voiceovers.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SpeakingRate {
    Normal,
    Slow,
}

impl Default for SpeakingRate {
    fn default() -> Self {
        SpeakingRate::Normal
    }
}

/// Root of `config.toml`.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct RootConfig {
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub voice: VoiceConfig,
    #[serde(default)]
    pub recognition: RecognitionConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// AI backend model and generation settings.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ChatConfig {
    #[serde(default = "default_model_name")]
    pub model_name: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_top_k")]
    pub top_k: i32,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: i32,
    #[serde(default = "default_response_mime_type")]
    pub response_mime_type: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model_name: default_model_name(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            top_k: default_top_k(),
            max_output_tokens: default_max_output_tokens(),
            response_mime_type: default_response_mime_type(),
        }
    }
}

fn default_model_name() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_p() -> f32 {
    0.9
}

fn default_top_k() -> i32 {
    40
}

fn default_max_output_tokens() -> i32 {
    1024
}

fn default_response_mime_type() -> String {
    "text/plain".to_string()
}

/// Voiceover synthesis settings.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct VoiceConfig {
    /// Synthesis language tag, e.g. "en"
    #[serde(default = "default_voice_language")]
    pub language: String,
    #[serde(default)]
    pub rate: SpeakingRate,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            language: default_voice_language(),
            rate: SpeakingRate::default(),
        }
    }
}

fn default_voice_language() -> String {
    "en".to_string()
}

/// Speech-recognition settings.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct RecognitionConfig {
    /// Recognition language tag, e.g. "en-US"
    #[serde(default = "default_recognition_language")]
    pub language: String,
    /// The listen window: how long one recognition attempt may block
    #[serde(default = "default_listen_timeout_secs")]
    pub listen_timeout_secs: u64,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            language: default_recognition_language(),
            listen_timeout_secs: default_listen_timeout_secs(),
        }
    }
}

fn default_recognition_language() -> String {
    "en-US".to_string()
}

fn default_listen_timeout_secs() -> u64 {
    5
}

/// Durable storage settings.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct StorageConfig {
    /// File name of the archive inside the data directory
    #[serde(default = "default_archive_file_name")]
    pub archive_file_name: String,
    /// How many synthesized voiceover files to keep before evicting oldest
    #[serde(default = "default_voiceover_cache_limit")]
    pub voiceover_cache_limit: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            archive_file_name: default_archive_file_name(),
            voiceover_cache_limit: default_voiceover_cache_limit(),
        }
    }
}

fn default_archive_file_name() -> String {
    "chat_history.json".to_string()
}

fn default_voiceover_cache_limit() -> usize {
    256
}

/// Root of `secret.json` (API keys).
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct SecretConfig {
    #[serde(default)]
    pub gemini: Option<GeminiConfig>,
    #[serde(default)]
    pub speech: Option<SpeechConfig>,
}

/// Credentials for the AI backend.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model_name: Option<String>,
}

/// Credentials for the speech-to-text backend.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SpeechConfig {
    pub api_key: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_stock_behavior() {
        let config = RootConfig::default();
        assert_eq!(config.chat.model_name, "gemini-1.5-flash");
        assert_eq!(config.chat.temperature, 0.7);
        assert_eq!(config.chat.top_p, 0.9);
        assert_eq!(config.chat.top_k, 40);
        assert_eq!(config.chat.max_output_tokens, 1024);
        assert_eq!(config.voice.language, "en");
        assert_eq!(config.voice.rate, SpeakingRate::Normal);
        assert_eq!(config.recognition.listen_timeout_secs, 5);
        assert_eq!(config.storage.archive_file_name, "chat_history.json");
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: RootConfig = toml::from_str(
            r#"
            [voice]
            rate = "slow"
            "#,
        )
        .expect("partial config should parse");

        assert_eq!(config.voice.rate, SpeakingRate::Slow);
        assert_eq!(config.voice.language, "en");
        assert_eq!(config.chat.model_name, "gemini-1.5-flash");
    }

    #[test]
    fn speaking_rate_displays_lowercase() {
        assert_eq!(SpeakingRate::Normal.to_string(), "normal");
        assert_eq!(SpeakingRate::Slow.to_string(), "slow");
    }
}
