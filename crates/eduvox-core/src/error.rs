//! Error types for the EduVox application.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire EduVox application.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait. The variant selects how a
/// surface renders the failure: speech-recognition variants are non-fatal
/// warnings, everything else is an inline error.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum EduvoxError {
    /// Archive or artifact file could not be read or written
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "JSON", "TOML", etc.
        message: String,
    },

    /// AI backend failure (network, quota, malformed reply)
    #[error("AI backend error: {message}")]
    Backend {
        status_code: Option<u16>,
        message: String,
        is_retryable: bool,
    },

    /// Speech recognition listen window elapsed without a result
    #[error("Speech recognition timed out")]
    RecognitionTimeout,

    /// Captured audio produced no recognizable transcript
    #[error("Speech was not intelligible")]
    Unintelligible,

    /// Speech recognition service could not be reached
    #[error("Speech recognition request failed: {0}")]
    RecognitionRequest(String),

    /// Text-to-speech synthesis failure
    #[error("Speech synthesis error: {0}")]
    Synthesis(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EduvoxError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a Backend error
    pub fn backend(status_code: Option<u16>, message: impl Into<String>, is_retryable: bool) -> Self {
        Self::Backend {
            status_code,
            message: message.into(),
            is_retryable,
        }
    }

    /// Creates a Synthesis error
    pub fn synthesis(message: impl Into<String>) -> Self {
        Self::Synthesis(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is any of the three speech-recognition conditions
    pub fn is_recognition(&self) -> bool {
        matches!(
            self,
            Self::RecognitionTimeout | Self::Unintelligible | Self::RecognitionRequest(_)
        )
    }

    /// Check if this is an AI backend error
    pub fn is_backend(&self) -> bool {
        matches!(self, Self::Backend { .. })
    }

    /// Check if this is a config error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Check if a retry of the same request could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Backend { is_retryable, .. } => *is_retryable,
            Self::RecognitionTimeout | Self::RecognitionRequest(_) => true,
            _ => false,
        }
    }

    /// The message a surface should show the user for this error.
    ///
    /// The speech-recognition conditions keep their fixed, distinct wording;
    /// all other variants render as an inline `Error: ...` line.
    pub fn user_message(&self) -> String {
        match self {
            Self::RecognitionTimeout => "Listening timed out. Please try again.".to_string(),
            Self::Unintelligible => "Could not understand the audio. Try speaking again.".to_string(),
            Self::RecognitionRequest(_) => {
                "Could not request results. Check your internet connection.".to_string()
            }
            other => format!("Error: {}", other),
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for EduvoxError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for EduvoxError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for EduvoxError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for EduvoxError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// Conversion from String (for error messages)
impl From<String> for EduvoxError {
    fn from(err: String) -> Self {
        Self::Internal(err)
    }
}

/// A type alias for `Result<T, EduvoxError>`.
pub type Result<T> = std::result::Result<T, EduvoxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognition_conditions_keep_distinct_user_messages() {
        assert_eq!(
            EduvoxError::RecognitionTimeout.user_message(),
            "Listening timed out. Please try again."
        );
        assert_eq!(
            EduvoxError::Unintelligible.user_message(),
            "Could not understand the audio. Try speaking again."
        );
        assert_eq!(
            EduvoxError::RecognitionRequest("dns".to_string()).user_message(),
            "Could not request results. Check your internet connection."
        );
    }

    #[test]
    fn backend_errors_render_inline() {
        let err = EduvoxError::backend(Some(429), "quota exceeded", true);
        assert!(err.user_message().starts_with("Error: "));
        assert!(err.is_backend());
        assert!(err.is_retryable());
    }

    #[test]
    fn recognition_predicate_covers_all_three_kinds() {
        assert!(EduvoxError::RecognitionTimeout.is_recognition());
        assert!(EduvoxError::Unintelligible.is_recognition());
        assert!(EduvoxError::RecognitionRequest(String::new()).is_recognition());
        assert!(!EduvoxError::internal("x").is_recognition());
    }
}
