//! TranslateTtsClient - Google-Translate-style text-to-speech client.
//!
//! The endpoint only accepts short utterances, so reply text is split into
//! chunks of at most 100 characters on whitespace boundaries. Each chunk is
//! fetched as MP3 bytes and the streams are concatenated in order.

use async_trait::async_trait;
use eduvox_core::backend::SpeechSynthesizer;
use eduvox_core::config::{SpeakingRate, VoiceConfig};
use eduvox_core::error::Result;
use eduvox_core::EduvoxError;
use reqwest::Client;
use std::time::Duration;

const BASE_URL: &str = "https://translate.google.com/translate_tts";
const MAX_CHUNK_CHARS: usize = 100;
const CHUNK_TIMEOUT: Duration = Duration::from_secs(10);

/// Text-to-speech client speaking the translate_tts endpoint.
#[derive(Clone)]
pub struct TranslateTtsClient {
    client: Client,
    language: String,
    speed: &'static str,
}

impl TranslateTtsClient {
    /// Creates a client for the configured language and speaking rate.
    pub fn new(voice: &VoiceConfig) -> Self {
        Self {
            client: Client::new(),
            language: voice.language.clone(),
            speed: speed_param(voice.rate),
        }
    }

    async fn fetch_chunk(&self, chunk: &str, idx: usize, total: usize) -> Result<Vec<u8>> {
        let total_param = total.to_string();
        let idx_param = idx.to_string();
        let textlen_param = chunk.chars().count().to_string();

        let response = self
            .client
            .get(BASE_URL)
            .timeout(CHUNK_TIMEOUT)
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", self.language.as_str()),
                ("ttsspeed", self.speed),
                ("q", chunk),
                ("total", total_param.as_str()),
                ("idx", idx_param.as_str()),
                ("textlen", textlen_param.as_str()),
            ])
            .send()
            .await
            .map_err(|err| EduvoxError::synthesis(format!("TTS request failed: {err}")))?;

        if !response.status().is_success() {
            return Err(EduvoxError::synthesis(format!(
                "TTS endpoint returned HTTP {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| EduvoxError::synthesis(format!("Failed to read TTS audio: {err}")))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl SpeechSynthesizer for TranslateTtsClient {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let chunks = chunk_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(EduvoxError::synthesis("no text to synthesize"));
        }

        let total = chunks.len();
        let mut audio = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            let bytes = self.fetch_chunk(chunk, idx, total).await?;
            audio.extend_from_slice(&bytes);
        }

        tracing::debug!(
            "[TranslateTtsClient] Synthesized {} chunk(s), {} bytes",
            total,
            audio.len()
        );
        Ok(audio)
    }
}

fn speed_param(rate: SpeakingRate) -> &'static str {
    match rate {
        SpeakingRate::Normal => "1",
        SpeakingRate::Slow => "0.3",
    }
}

/// Splits text into whitespace-normalized chunks of at most `max_chars`
/// characters. Words longer than the limit are hard-split.
fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if current_len > 0 {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            for ch in word.chars() {
                if current_len == max_chars {
                    chunks.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                current.push(ch);
                current_len += 1;
            }
            continue;
        }

        if current_len == 0 {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= max_chars {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            chunks.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
        }
    }

    if current_len > 0 {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_a_single_chunk() {
        assert_eq!(chunk_text("Gravity pulls things down.", 100), vec![
            "Gravity pulls things down.".to_string()
        ]);
    }

    #[test]
    fn blank_text_yields_no_chunks() {
        assert!(chunk_text("", 100).is_empty());
        assert!(chunk_text("   \n\t ", 100).is_empty());
    }

    #[test]
    fn long_text_splits_on_whitespace_within_the_limit() {
        let text = "one two three four five six seven eight nine ten ".repeat(4);
        let chunks = chunk_text(&text, 100);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 100);
            assert!(!chunk.starts_with(' '));
            assert!(!chunk.ends_with(' '));
        }
        // No word is broken apart when splitting on whitespace.
        let reassembled = chunks.join(" ");
        let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
        assert_eq!(reassembled, normalized);
    }

    #[test]
    fn oversized_words_are_hard_split() {
        let word = "a".repeat(250);
        let chunks = chunk_text(&word, 100);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].chars().count(), 100);
        assert_eq!(chunks[1].chars().count(), 100);
        assert_eq!(chunks[2].chars().count(), 50);
    }

    #[test]
    fn speaking_rate_maps_to_the_endpoint_speed() {
        assert_eq!(speed_param(SpeakingRate::Normal), "1");
        assert_eq!(speed_param(SpeakingRate::Slow), "0.3");
    }
}
