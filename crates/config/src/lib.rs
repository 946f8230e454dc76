//! Configuration loading, validation, and management for chatrelay.
//!
//! Loads configuration from `~/.chatrelay/config.toml` with environment
//! variable overrides. Validates all settings at startup: an invalid history
//! bound is fatal, everything else has a default.

use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.chatrelay/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Conversation store configuration
    #[serde(default)]
    pub chat: ChatConfig,

    /// Prompt rendering configuration
    #[serde(default)]
    pub prompt: PromptConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Messages kept per chat; oldest are evicted first
    #[serde(default = "default_max_history")]
    pub max_history: usize,

    /// Directory holding one JSON record per chat
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<PathBuf>,
}

fn default_max_history() -> usize {
    20
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_history: default_max_history(),
            storage_path: None,
        }
    }
}

impl ChatConfig {
    /// The history bound as a type that cannot be zero.
    pub fn max_history_bound(&self) -> Result<NonZeroUsize, ConfigError> {
        NonZeroUsize::new(self.max_history).ok_or_else(|| {
            ConfigError::ValidationError("chat.max_history must be a positive integer".into())
        })
    }

    /// Resolved storage directory.
    pub fn storage_dir(&self) -> PathBuf {
        self.storage_path
            .clone()
            .unwrap_or_else(|| AppConfig::config_dir().join("chat_history"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Prompt template file, loaded once at startup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_path: Option<PathBuf>,

    /// Sender name recorded for the assistant's own replies
    #[serde(default = "default_assistant_name")]
    pub assistant_name: String,
}

fn default_assistant_name() -> String {
    "Assistant".into()
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            template_path: None,
            assistant_name: default_assistant_name(),
        }
    }
}

impl PromptConfig {
    /// Resolved template path.
    pub fn template_file(&self) -> PathBuf {
        self.template_path.clone().unwrap_or_else(|| {
            AppConfig::config_dir()
                .join("prompts")
                .join("default_template.txt")
        })
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.chatrelay/config.toml).
    ///
    /// Environment overrides (highest priority):
    /// - `CHATRELAY_MAX_HISTORY`
    /// - `CHATRELAY_STORAGE_PATH`
    /// - `CHATRELAY_TEMPLATE_PATH`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(raw) = lookup("CHATRELAY_MAX_HISTORY") {
            self.chat.max_history = raw.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "CHATRELAY_MAX_HISTORY must be a positive integer, got '{raw}'"
                ))
            })?;
        }

        if let Some(path) = lookup("CHATRELAY_STORAGE_PATH") {
            self.chat.storage_path = Some(PathBuf::from(path));
        }

        if let Some(path) = lookup("CHATRELAY_TEMPLATE_PATH") {
            self.prompt.template_path = Some(PathBuf::from(path));
        }

        Ok(())
    }

    /// Get the configuration directory path (`CHATRELAY_HOME` or `~/.chatrelay`).
    pub fn config_dir() -> PathBuf {
        std::env::var("CHATRELAY_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| dirs_home().join(".chatrelay"))
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        self.chat.max_history_bound()?;

        if self.prompt.assistant_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "prompt.assistant_name must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for the `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            chat: ChatConfig::default(),
            prompt: PromptConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.chat.max_history, 20);
        assert_eq!(config.prompt.assistant_name, "Assistant");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.chat.max_history, config.chat.max_history);
        assert_eq!(parsed.prompt.assistant_name, config.prompt.assistant_name);
    }

    #[test]
    fn zero_max_history_rejected() {
        let config = AppConfig {
            chat: ChatConfig {
                max_history: 0,
                storage_path: None,
            },
            ..AppConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn negative_max_history_fails_to_parse() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(tmp, "[chat]\nmax_history = -3").unwrap();
        let result = AppConfig::load_from(tmp.path());
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().chat.max_history, 20);
    }

    #[test]
    fn loads_sections_from_file() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(
            tmp,
            r#"
[chat]
max_history = 5
storage_path = "/var/lib/chatrelay/history"

[prompt]
template_path = "/etc/chatrelay/template.txt"
assistant_name = "Luna"
"#
        )
        .unwrap();

        let config = AppConfig::load_from(tmp.path()).unwrap();
        assert_eq!(config.chat.max_history, 5);
        assert_eq!(
            config.chat.storage_dir(),
            PathBuf::from("/var/lib/chatrelay/history")
        );
        assert_eq!(
            config.prompt.template_file(),
            PathBuf::from("/etc/chatrelay/template.txt")
        );
        assert_eq!(config.prompt.assistant_name, "Luna");
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("CHATRELAY_MAX_HISTORY", "7"),
            ("CHATRELAY_STORAGE_PATH", "/tmp/history"),
        ]);
        let mut config = AppConfig::default();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.chat.max_history, 7);
        assert_eq!(config.chat.storage_dir(), PathBuf::from("/tmp/history"));
        assert!(config.prompt.template_path.is_none());
    }

    #[test]
    fn invalid_env_bound_rejected() {
        let mut config = AppConfig::default();
        let result = config.apply_env(|key| {
            (key == "CHATRELAY_MAX_HISTORY").then(|| "lots".to_string())
        });
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("max_history = 20"));
        assert!(toml_str.contains("Assistant"));
    }

    #[test]
    fn bound_is_non_zero() {
        let config = ChatConfig::default();
        assert_eq!(config.max_history_bound().unwrap().get(), 20);
    }
}
