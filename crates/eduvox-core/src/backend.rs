//! Ports for the three external service backends.
//!
//! The AI model, the speech-to-text service, and the speech-synthesis
//! service are external collaborators. These traits are the narrow
//! request/response contracts the rest of the application consumes them
//! through; `eduvox-interaction` provides the HTTP implementations.

use crate::error::Result;
use async_trait::async_trait;

/// Factory port for the AI backend.
///
/// A session creates exactly one conversation, lazily, on the first message
/// it sends, and reuses that handle for every later message. A failed send
/// does not invalidate the handle.
pub trait ConversationBackend: Send + Sync {
    /// Opens a new conversation primed with a system instruction.
    ///
    /// This is a local operation; no request is made until the first
    /// [`Conversation::send_message`] call.
    fn start_conversation(&self, system_instruction: &str) -> Result<Box<dyn Conversation>>;
}

/// An ongoing exchange with the AI backend.
///
/// The handle is stateful: prior turns ride along implicitly as context on
/// every send.
#[async_trait]
pub trait Conversation: Send {
    /// Sends one user message and returns the reply text.
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: the backend's reply
    /// - `Err(EduvoxError::Backend { .. })`: network, quota, or malformed
    ///   reply; the handle stays usable for a retry
    async fn send_message(&mut self, text: &str) -> Result<String>;
}

/// Port for the text-to-speech backend.
///
/// Language and speaking rate are fixed per client from configuration, so
/// the request narrows to the text alone.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesizes the text into an MP3 byte stream.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;
}

/// Captured audio samples handed to the speech-to-text backend.
///
/// Capture itself happens on the user-facing surface (a microphone widget,
/// a recorded file); by the time audio reaches this type it is already an
/// encoded clip.
#[derive(Debug, Clone)]
pub struct AudioClip {
    /// Encoded audio bytes
    pub data: Vec<u8>,
    /// MIME type of `data`, e.g. `audio/wav`
    pub mime_type: String,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl AudioClip {
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>, sample_rate: u32) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
            sample_rate,
        }
    }

    /// A WAV-encoded clip.
    pub fn wav(data: Vec<u8>, sample_rate: u32) -> Self {
        Self::new(data, "audio/wav", sample_rate)
    }
}

/// Port for the speech-to-text backend.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Recognizes speech in the clip and returns the transcript.
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: the recognized text
    /// - `Err(EduvoxError::RecognitionTimeout)`: the listen window elapsed
    /// - `Err(EduvoxError::Unintelligible)`: no recognizable speech
    /// - `Err(EduvoxError::RecognitionRequest(_))`: the service could not be
    ///   reached
    async fn transcribe(&self, clip: &AudioClip) -> Result<String>;
}
