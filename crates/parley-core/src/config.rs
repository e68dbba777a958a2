use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ParleyError, Result};

/// Top-level configuration for the Parley server.
///
/// Loaded from `~/.parley/config.toml` by default. Each section corresponds
/// to a bounded context or cross-cutting concern. Provider API keys are NOT
/// stored here; only the names of the environment variables that hold them.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ParleyConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub voice: VoiceConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub uploads: UploadConfig,
}

impl ParleyConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ParleyConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ParleyError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Data directory for SQLite, uploads, and the bootstrap session token.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// API server port.
    pub port: u16,
    /// Requests per second allowed across all authenticated routes.
    pub rate_limit_per_sec: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.parley/data".to_string(),
            log_level: "info".to_string(),
            port: 3030,
            rate_limit_per_sec: 100,
        }
    }
}

/// Chat pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Model id used when the request does not name one.
    pub default_model: String,
    /// Model id used to derive chat titles from the first user message.
    pub title_model: String,
    /// Model id used by the document and suggestion tools.
    pub artifact_model: String,
    /// Maximum user message length in characters.
    pub max_message_length: usize,
    /// Maximum tool-call rounds per completion before giving up.
    pub max_tool_rounds: u32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            default_model: crate::types::DEFAULT_CHAT_MODEL.to_string(),
            title_model: "title-model".to_string(),
            artifact_model: "artifact-model".to_string(),
            max_message_length: 32_000,
            max_tool_rounds: 4,
        }
    }
}

/// Voice transcription settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Hosted multimodal model used for audio transcription.
    pub model: String,
    /// Environment variable holding the transcription API key.
    pub api_key_env: String,
    /// Maximum accepted audio clip size in bytes.
    pub max_audio_bytes: usize,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            model: "gemini-1.5-pro".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            max_audio_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Per-provider base URL overrides.
///
/// Empty strings mean "use the built-in endpoint". Overrides exist so tests
/// and self-hosted gateways can point the client elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProvidersConfig {
    pub anthropic_base_url: Option<String>,
    pub google_base_url: Option<String>,
    pub cohere_base_url: Option<String>,
    pub together_base_url: Option<String>,
}

/// Attachment upload settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Maximum accepted file size in bytes.
    pub max_file_bytes: usize,
    /// Accepted content types.
    pub allowed_content_types: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: 5 * 1024 * 1024,
            allowed_content_types: vec!["image/jpeg".to_string(), "image/png".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ParleyConfig::default();
        assert_eq!(config.general.port, 3030);
        assert_eq!(config.chat.title_model, "title-model");
        assert_eq!(config.voice.api_key_env, "GEMINI_API_KEY");
        assert!(config.providers.anthropic_base_url.is_none());
    }

    #[test]
    fn test_load_missing_file_falls_back() {
        let config = ParleyConfig::load_or_default(Path::new("/nonexistent/config.toml"));
        assert_eq!(config.general.port, 3030);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = ParleyConfig::default();
        config.general.port = 4040;
        config.chat.max_tool_rounds = 2;
        config.save(&path).unwrap();

        let loaded = ParleyConfig::load(&path).unwrap();
        assert_eq!(loaded.general.port, 4040);
        assert_eq!(loaded.chat.max_tool_rounds, 2);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ParleyConfig = toml::from_str(
            r#"
            [general]
            port = 8080
            "#,
        )
        .unwrap();
        assert_eq!(config.general.port, 8080);
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.rate_limit_per_sec, 100);
        assert_eq!(config.chat.default_model, "gemini-2-0-flash");
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "port = [[[").unwrap();
        let result = ParleyConfig::load(&path);
        assert!(result.is_err());
    }
}
