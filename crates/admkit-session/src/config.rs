use std::fs;
use std::path::{Path, PathBuf};

use admkit_audio::CacheConfig;
use serde::{Deserialize, Serialize};

/// Session settings, stored as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub cache: CacheConfig,
    /// Run discovery as soon as a scene is opened.
    pub discover_on_open: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            discover_on_open: true,
        }
    }
}

impl SessionConfig {
    /// `<config dir>/admkit/session.json`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir()?;
        path.push("admkit");
        path.push("session.json");
        Some(path)
    }

    /// Loads settings from the default location, falling back to defaults.
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_from_path(&path),
            None => Self::default(),
        }
    }

    /// Missing files give defaults; unreadable ones, or ones with cache
    /// margins [`CacheConfig::validate`] rejects, are logged and give
    /// defaults.
    pub fn load_from_path(path: &Path) -> Self {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(_) => return Self::default(),
        };
        let config: Self = match serde_json::from_str(&contents) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(?err, path = %path.display(), "invalid session config, using defaults");
                return Self::default();
            }
        };
        match config.cache.validate() {
            Ok(()) => config,
            Err(err) => {
                tracing::warn!(%err, path = %path.display(), "invalid cache margins, using defaults");
                Self::default()
            }
        }
    }

    pub fn save_to_path(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, json)
    }
}
