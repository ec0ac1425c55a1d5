//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::core::Workspace;

/// Default request timeout for evaluation submission
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Lower bound applied to configured timeouts
pub const MIN_TIMEOUT_SECONDS: u64 = 5;

/// Aula configuration with layered hierarchy
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the platform API
    pub api_url: Option<String>,

    /// HTTP timeout for submissions
    pub timeout_seconds: Option<u64>,

    /// Class used when none is given on the command line
    pub default_class: Option<String>,

    /// Play sound effects in mini-games
    pub sound: Option<bool>,

    /// Narrate questions in mini-games
    pub speech: Option<bool>,

    /// Author recorded on play sessions and outbox entries
    pub author: Option<String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        let workspace = Workspace::discover().ok();
        Self::load_with(Self::global_config_path().as_deref(), workspace.as_ref())
    }

    /// Load from an explicit global path and workspace, then apply the environment
    pub fn load_with(global_path: Option<&Path>, workspace: Option<&Workspace>) -> Self {
        let mut config = Config::default();

        // 1. Global user config (~/.config/aula/config.yaml)
        if let Some(global) = global_path.and_then(Self::read_file) {
            config.merge(global);
        }

        // 2. Workspace config (.aula/config.yaml)
        if let Some(ws) = workspace {
            if let Some(local) = Self::read_file(&ws.aula_dir().join("config.yaml")) {
                config.merge(local);
            }
        }

        // 3. Environment variables
        if let Ok(url) = std::env::var("AULA_API_URL") {
            config.api_url = Some(url);
        }
        if let Some(timeout) = std::env::var("AULA_TIMEOUT")
            .ok()
            .and_then(|t| t.parse().ok())
        {
            config.timeout_seconds = Some(timeout);
        }
        if let Ok(class) = std::env::var("AULA_CLASS") {
            config.default_class = Some(class);
        }

        config
    }

    fn read_file(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path).ok()?;
        match serde_yml::from_str::<Config>(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!("ignoring unreadable config {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "aula")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.api_url.is_some() {
            self.api_url = other.api_url;
        }
        if other.timeout_seconds.is_some() {
            self.timeout_seconds = other.timeout_seconds;
        }
        if other.default_class.is_some() {
            self.default_class = other.default_class;
        }
        if other.sound.is_some() {
            self.sound = other.sound;
        }
        if other.speech.is_some() {
            self.speech = other.speech;
        }
        if other.author.is_some() {
            self.author = other.author;
        }
    }

    /// API base URL without a trailing slash
    pub fn api_url(&self) -> Option<String> {
        self.api_url
            .as_deref()
            .map(|u| u.trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
    }

    /// Submission timeout, clamped to the minimum
    pub fn timeout_seconds(&self) -> u64 {
        let configured = self.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS);
        if configured < MIN_TIMEOUT_SECONDS {
            tracing::warn!(
                "configured timeout_seconds={} is too low; using minimum of {} seconds",
                configured,
                MIN_TIMEOUT_SECONDS
            );
            MIN_TIMEOUT_SECONDS
        } else {
            configured
        }
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound.unwrap_or(true)
    }

    pub fn speech_enabled(&self) -> bool {
        self.speech.unwrap_or(false)
    }

    /// Get the author name, falling back to the login name
    pub fn author(&self) -> String {
        if let Some(ref author) = self.author {
            return author.clone();
        }

        std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_merge_prefers_later_layer() {
        let mut base = Config {
            api_url: Some("http://global".to_string()),
            sound: Some(false),
            ..Config::default()
        };
        base.merge(Config {
            api_url: Some("http://workspace".to_string()),
            ..Config::default()
        });

        assert_eq!(base.api_url.as_deref(), Some("http://workspace"));
        assert_eq!(base.sound, Some(false));
    }

    #[test]
    fn test_workspace_layer_overrides_global_file() {
        let tmp = tempdir().unwrap();
        let global = tmp.path().join("global.yaml");
        std::fs::write(&global, "api_url: http://global\ndefault_class: c9\n").unwrap();

        let ws = Workspace::init(&tmp.path().join("ws")).unwrap();
        std::fs::write(ws.aula_dir().join("config.yaml"), "api_url: http://local/\n").unwrap();

        let config = Config::load_with(Some(&global), Some(&ws));
        if std::env::var("AULA_API_URL").is_err() {
            assert_eq!(config.api_url().as_deref(), Some("http://local"));
        }
        if std::env::var("AULA_CLASS").is_err() {
            assert_eq!(config.default_class.as_deref(), Some("c9"));
        }
    }

    #[test]
    fn test_timeout_is_clamped() {
        let config = Config {
            timeout_seconds: Some(1),
            ..Config::default()
        };
        assert_eq!(config.timeout_seconds(), MIN_TIMEOUT_SECONDS);
        assert_eq!(Config::default().timeout_seconds(), DEFAULT_TIMEOUT_SECONDS);
    }

    #[test]
    fn test_blank_api_url_is_none() {
        let config = Config {
            api_url: Some("/".to_string()),
            ..Config::default()
        };
        assert_eq!(config.api_url(), None);
    }
}
