//! Secret service implementation.
//!
//! This module provides a service for managing secret configuration (API keys)
//! stored in secret.json.

use crate::paths::EduvoxPaths;
use eduvox_core::config::SecretConfig;
use eduvox_core::secret::SecretService;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

/// Service for managing secret configuration.
///
/// This implementation reads secret configuration from a JSON file
/// and caches it to avoid repeated file I/O operations.
///
/// # Example
///
/// ```ignore
/// use eduvox_infrastructure::SecretServiceImpl;
/// use eduvox_core::secret::SecretService;
///
/// let service = SecretServiceImpl::default_location()?;
/// let secrets = service.load_secrets().await?;
/// ```
#[derive(Clone)]
pub struct SecretServiceImpl {
    /// Cached secret config loaded from storage.
    /// Uses RwLock for thread-safe lazy loading.
    secrets: Arc<RwLock<Option<SecretConfig>>>,
    /// Path of the secret.json file.
    file_path: PathBuf,
}

impl SecretServiceImpl {
    /// Creates a SecretServiceImpl over an explicit secret file path.
    pub fn new(file_path: PathBuf) -> Self {
        Self {
            secrets: Arc::new(RwLock::new(None)),
            file_path,
        }
    }

    /// Creates a SecretServiceImpl over the standard secret file location.
    ///
    /// If the file doesn't exist it is created as an empty-key template so
    /// the user has something to fill in.
    pub fn default_location() -> Result<Self, String> {
        let file_path = EduvoxPaths::ensure_secret_file()
            .map_err(|e| format!("Failed to prepare secret file: {}", e))?;
        Ok(Self::new(file_path))
    }

    /// Loads the secrets from the file if not already cached.
    fn load_secrets_internal(&self) -> Result<SecretConfig, String> {
        // Check if already cached
        {
            let read_lock = self.secrets.read().unwrap();
            if let Some(ref cached) = *read_lock {
                return Ok(cached.clone());
            }
        }

        let loaded = if self.file_path.exists() {
            let content = std::fs::read_to_string(&self.file_path)
                .map_err(|e| format!("Failed to read {}: {}", self.file_path.display(), e))?;
            serde_json::from_str(&content)
                .map_err(|e| format!("Failed to parse {}: {}", self.file_path.display(), e))?
        } else {
            SecretConfig::default()
        };

        // Cache it
        {
            let mut write_lock = self.secrets.write().unwrap();
            *write_lock = Some(loaded.clone());
        }

        Ok(loaded)
    }
}

#[async_trait::async_trait]
impl SecretService for SecretServiceImpl {
    async fn load_secrets(&self) -> Result<SecretConfig, String> {
        self.load_secrets_internal()
    }

    async fn secret_file_exists(&self) -> bool {
        self.file_path.exists()
    }
}

/// Resolves the Gemini API key from the environment or the secret file.
///
/// An explicitly exported `GEMINI_API_KEY` wins over secret.json; empty
/// strings in either place count as absent.
pub fn resolve_gemini_key(env_key: Option<String>, secrets: &SecretConfig) -> Option<String> {
    if let Some(key) = env_key {
        if !key.trim().is_empty() {
            return Some(key);
        }
    }
    secrets
        .gemini
        .as_ref()
        .map(|gemini| gemini.api_key.clone())
        .filter(|key| !key.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use eduvox_core::config::GeminiConfig;
    use tempfile::TempDir;

    fn secrets_with_key(key: &str) -> SecretConfig {
        SecretConfig {
            gemini: Some(GeminiConfig {
                api_key: key.to_string(),
                model_name: None,
            }),
            speech: None,
        }
    }

    #[tokio::test]
    async fn missing_file_loads_as_empty_secrets() {
        let dir = TempDir::new().unwrap();
        let service = SecretServiceImpl::new(dir.path().join("secret.json"));

        assert!(!service.secret_file_exists().await);
        let secrets = service.load_secrets().await.unwrap();
        assert!(secrets.gemini.is_none());
    }

    #[tokio::test]
    async fn existing_file_is_parsed_and_cached() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("secret.json");
        std::fs::write(&path, r#"{"gemini": {"api_key": "g-123"}}"#).unwrap();

        let service = SecretServiceImpl::new(path.clone());
        assert!(service.secret_file_exists().await);

        let secrets = service.load_secrets().await.unwrap();
        assert_eq!(secrets.gemini.unwrap().api_key, "g-123");

        // A later rewrite is not observed because the first load is cached.
        std::fs::write(&path, r#"{"gemini": {"api_key": "g-456"}}"#).unwrap();
        let cached = service.load_secrets().await.unwrap();
        assert_eq!(cached.gemini.unwrap().api_key, "g-123");
    }

    #[tokio::test]
    async fn malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("secret.json");
        std::fs::write(&path, "not json").unwrap();

        let service = SecretServiceImpl::new(path);
        assert!(service.load_secrets().await.is_err());
    }

    #[test]
    fn env_key_wins_over_secret_file() {
        let resolved = resolve_gemini_key(Some("env-key".to_string()), &secrets_with_key("file-key"));
        assert_eq!(resolved, Some("env-key".to_string()));
    }

    #[test]
    fn secret_file_key_is_the_fallback() {
        let resolved = resolve_gemini_key(None, &secrets_with_key("file-key"));
        assert_eq!(resolved, Some("file-key".to_string()));
    }

    #[test]
    fn empty_keys_count_as_absent() {
        assert_eq!(resolve_gemini_key(Some("  ".to_string()), &secrets_with_key("")), None);
        assert_eq!(resolve_gemini_key(None, &SecretConfig::default()), None);
    }
}
