//! Configuration service implementation.
//!
//! This module provides a ConfigService that loads the root configuration
//! from the configuration file (~/.config/eduvox/config.toml).

use crate::paths::EduvoxPaths;
use eduvox_core::config::RootConfig;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

/// Configuration service that loads and caches the root configuration.
///
/// This implementation reads the configuration from config.toml
/// and caches it to avoid repeated file I/O operations.
#[derive(Debug, Clone)]
pub struct ConfigService {
    /// Cached configuration loaded from file.
    /// Uses RwLock for thread-safe lazy loading.
    config: Arc<RwLock<Option<RootConfig>>>,
}

impl ConfigService {
    /// Creates a new ConfigService.
    ///
    /// The configuration is loaded lazily on first access to avoid blocking
    /// during initialization.
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Gets the root configuration, loading from file if not cached.
    pub fn get_config(&self) -> RootConfig {
        // Check if already cached
        {
            let read_lock = self.config.read().unwrap();
            if let Some(ref cached) = *read_lock {
                return cached.clone();
            }
        }

        let loaded = Self::load_config().unwrap_or_else(|e| {
            tracing::warn!("[ConfigService] Falling back to defaults: {}", e);
            RootConfig::default()
        });

        // Cache it
        {
            let mut write_lock = self.config.write().unwrap();
            *write_lock = Some(loaded.clone());
        }

        loaded
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut write_lock = self.config.write().unwrap();
        *write_lock = None;
    }

    /// Loads RootConfig from the config file, creating it with defaults
    /// when absent.
    fn load_config() -> Result<RootConfig, String> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            let default_config = RootConfig::default();
            Self::write_default(&config_path, &default_config)?;
            return Ok(default_config);
        }

        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| format!("Failed to read {}: {}", config_path.display(), e))?;
        toml::from_str(&content)
            .map_err(|e| format!("Failed to parse {}: {}", config_path.display(), e))
    }

    fn write_default(config_path: &PathBuf, config: &RootConfig) -> Result<(), String> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {}", parent.display(), e))?;
        }
        let content = toml::to_string_pretty(config)
            .map_err(|e| format!("Failed to serialize default config: {}", e))?;
        std::fs::write(config_path, content)
            .map_err(|e| format!("Failed to write {}: {}", config_path.display(), e))?;
        tracing::info!(
            "[ConfigService] Created default config at {}",
            config_path.display()
        );
        Ok(())
    }

    fn get_config_path() -> Result<PathBuf, String> {
        EduvoxPaths::config_file().map_err(|e| e.to_string())
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}
