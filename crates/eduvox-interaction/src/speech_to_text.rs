//! GoogleSpeechClient - speech recognition over the speech-api/v2 endpoint.
//!
//! Captured audio bytes are posted as-is; the response is a stream of JSON
//! lines, of which the first line carrying a result is the transcript. An
//! empty or alternative-less result means the audio was unintelligible.
//!
//! The configured listen window is enforced as the request timeout: a
//! recognition attempt either completes, times out, or errors, and there is
//! no way to cancel one mid-flight.

use async_trait::async_trait;
use eduvox_core::backend::{AudioClip, Transcriber};
use eduvox_core::config::RecognitionConfig;
use eduvox_core::error::Result;
use eduvox_core::EduvoxError;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const BASE_URL: &str = "http://www.google.com/speech-api/v2/recognize";

/// Speech-to-text client for captured microphone audio.
#[derive(Clone)]
pub struct GoogleSpeechClient {
    client: Client,
    api_key: String,
    language: String,
    listen_window: Duration,
}

impl GoogleSpeechClient {
    /// Creates a client with the provided API key and recognition settings.
    pub fn new(api_key: impl Into<String>, recognition: &RecognitionConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            language: recognition.language.clone(),
            listen_window: Duration::from_secs(recognition.listen_timeout_secs),
        }
    }
}

#[async_trait]
impl Transcriber for GoogleSpeechClient {
    async fn transcribe(&self, clip: &AudioClip) -> Result<String> {
        if self.api_key.trim().is_empty() {
            return Err(EduvoxError::RecognitionRequest(
                "speech API key not configured".to_string(),
            ));
        }

        let content_type = format!("{}; rate={}", clip.mime_type, clip.sample_rate);
        let response = self
            .client
            .post(BASE_URL)
            .timeout(self.listen_window)
            .query(&[
                ("client", "chromium"),
                ("lang", self.language.as_str()),
                ("key", self.api_key.as_str()),
                ("pFilter", "0"),
            ])
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(clip.data.clone())
            .send()
            .await
            .map_err(map_transport_error)?;

        if !response.status().is_success() {
            return Err(EduvoxError::RecognitionRequest(format!(
                "speech API returned HTTP {}",
                response.status()
            )));
        }

        let body = response.text().await.map_err(map_transport_error)?;

        let transcript = parse_transcript(&body)?;
        tracing::debug!("[GoogleSpeechClient] Recognized: {}", transcript);
        Ok(transcript)
    }
}

/// An elapsed listen window is the timeout condition; everything else about
/// the transport is a request failure.
fn map_transport_error(err: reqwest::Error) -> EduvoxError {
    if err.is_timeout() {
        EduvoxError::RecognitionTimeout
    } else {
        EduvoxError::RecognitionRequest(err.to_string())
    }
}

#[derive(Deserialize)]
struct RecognizeResponse {
    result: Vec<RecognizeResult>,
}

#[derive(Deserialize)]
struct RecognizeResult {
    #[serde(default)]
    alternative: Vec<Alternative>,
}

#[derive(Deserialize)]
struct Alternative {
    transcript: String,
    #[allow(dead_code)]
    confidence: Option<f32>,
}

/// Picks the first transcript out of the JSON-lines response body.
fn parse_transcript(body: &str) -> Result<String> {
    for line in body.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Ok(parsed) = serde_json::from_str::<RecognizeResponse>(line) else {
            continue;
        };
        for result in parsed.result {
            if let Some(alternative) = result.alternative.into_iter().next() {
                if !alternative.transcript.trim().is_empty() {
                    return Ok(alternative.transcript);
                }
            }
        }
    }
    Err(EduvoxError::Unintelligible)
}
