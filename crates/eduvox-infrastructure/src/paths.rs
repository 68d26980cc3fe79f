//! Unified path management for EduVox files.
//!
//! All configuration, secrets, and durable chat data live under the
//! platform's standard directories, resolved in one place so every storage
//! component agrees on the layout.

use std::path::PathBuf;

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Unified path management for EduVox.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/eduvox/            # Config directory
/// ├── config.toml              # Application configuration
/// └── secret.json              # API keys
///
/// ~/.local/share/eduvox/       # Data directory
/// ├── chat_history.json        # The transcript archive
/// └── voiceovers/              # Synthesized audio artifacts
/// ```
pub struct EduvoxPaths;

impl EduvoxPaths {
    /// Returns the EduVox configuration directory.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: Path to config directory (e.g., `~/.config/eduvox/`)
    /// - `Err(PathError::HomeDirNotFound)`: Could not determine directory
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join("eduvox"))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the EduVox data directory.
    ///
    /// This holds the larger durable files (the archive, audio artifacts).
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: Path to data directory (e.g., `~/.local/share/eduvox/`)
    /// - `Err(PathError::HomeDirNotFound)`: Could not determine directory
    pub fn data_dir() -> Result<PathBuf, PathError> {
        dirs::data_dir()
            .map(|dir| dir.join("eduvox"))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the path to the secrets file.
    ///
    /// # Security Note
    ///
    /// Ensure this file has appropriate permissions (e.g., 600) to prevent
    /// unauthorized access.
    pub fn secret_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("secret.json"))
    }

    /// Returns the path to the transcript archive file.
    ///
    /// # Arguments
    ///
    /// * `file_name` - Archive file name from `StorageConfig`
    pub fn archive_file(file_name: &str) -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join(file_name))
    }

    /// Returns the path to the voiceover artifact directory.
    pub fn voiceovers_dir() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("voiceovers"))
    }

    /// Ensures the secret file exists, creating it with a template if it doesn't.
    ///
    /// The template contains empty API-key placeholders using the typed
    /// `SecretConfig` structure.
    ///
    /// # Security Note
    ///
    /// This function sets file permissions to 600 (user read/write only) on
    /// Unix systems.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: Path to the secret file (existing or newly created)
    /// - `Err(std::io::Error)`: If file creation or permission setting fails
    pub fn ensure_secret_file() -> Result<PathBuf, std::io::Error> {
        let secret_path = Self::secret_file()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::NotFound, e.to_string()))?;

        // If file already exists, return the path
        if secret_path.exists() {
            return Ok(secret_path);
        }

        // Ensure parent directory exists
        if let Some(parent) = secret_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        use eduvox_core::config::{GeminiConfig, SecretConfig, SpeechConfig};

        let template_config = SecretConfig {
            gemini: Some(GeminiConfig {
                api_key: String::new(),
                model_name: Some("gemini-1.5-flash".to_string()),
            }),
            speech: Some(SpeechConfig {
                api_key: String::new(),
            }),
        };

        let template_json = serde_json::to_string_pretty(&template_config)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

        std::fs::write(&secret_path, template_json)?;

        // Set file permissions to 600 (user read/write only) on Unix
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&secret_path, permissions)?;
        }

        Ok(secret_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_dir() {
        let config_dir = EduvoxPaths::config_dir().unwrap();
        assert!(config_dir.ends_with("eduvox"));
    }

    #[test]
    fn test_config_file() {
        let config_file = EduvoxPaths::config_file().unwrap();
        assert!(config_file.ends_with("config.toml"));
        // Verify it's under config_dir
        let config_dir = EduvoxPaths::config_dir().unwrap();
        assert!(config_file.starts_with(&config_dir));
    }

    #[test]
    fn test_secret_file() {
        let secret_file = EduvoxPaths::secret_file().unwrap();
        assert!(secret_file.ends_with("secret.json"));
        let config_dir = EduvoxPaths::config_dir().unwrap();
        assert!(secret_file.starts_with(&config_dir));
    }

    #[test]
    fn test_archive_file() {
        let archive_file = EduvoxPaths::archive_file("chat_history.json").unwrap();
        assert!(archive_file.ends_with("chat_history.json"));
        let data_dir = EduvoxPaths::data_dir().unwrap();
        assert!(archive_file.starts_with(&data_dir));
    }

    #[test]
    fn test_voiceovers_dir() {
        let voiceovers_dir = EduvoxPaths::voiceovers_dir().unwrap();
        assert!(voiceovers_dir.ends_with("voiceovers"));
        let data_dir = EduvoxPaths::data_dir().unwrap();
        assert!(voiceovers_dir.starts_with(&data_dir));
    }
}
