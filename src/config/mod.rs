//! Agent Configuration
//!
//! Parses and validates the agent configuration file (default `ota.toml`).
//! Every field has a built-in default, so a missing file yields the defaults.

use std::path::{Path, PathBuf};

use ota_protocol::SizeParsing;
use serde::{Deserialize, Serialize};

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "ota.toml";

/// Agent configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Job document parsing options
    #[serde(default)]
    pub parser: ParserConfig,

    /// Outbound message options
    #[serde(default)]
    pub messages: MessageConfig,
}

/// Job document parsing options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParserConfig {
    /// How the `size` field is converted (default: lenient)
    #[serde(default)]
    pub size_parsing: SizeParsing,
}

/// Outbound message options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MessageConfig {
    /// Message buffer size in bytes, terminator included (default: 256)
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Id of the first message sent (default: 1)
    #[serde(default = "default_next_id")]
    pub next_id: u32,
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            next_id: default_next_id(),
        }
    }
}

fn default_capacity() -> usize {
    256
}

fn default_next_id() -> u32 {
    1
}

/// Errors that can occur when loading or validating the configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

impl AgentConfig {
    /// Load configuration from `path`, falling back to defaults if it does not exist
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: AgentConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.messages.capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "messages.capacity".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AgentConfig::parse("").unwrap();
        assert_eq!(config, AgentConfig::default());
        assert_eq!(config.parser.size_parsing, SizeParsing::Lenient);
        assert_eq!(config.messages.capacity, 256);
        assert_eq!(config.messages.next_id, 1);
    }

    #[test]
    fn test_full_config() {
        let content = r#"
            [parser]
            size_parsing = "strict"

            [messages]
            capacity = 128
            next_id = 40
        "#;

        let config = AgentConfig::parse(content).unwrap();
        assert_eq!(config.parser.size_parsing, SizeParsing::Strict);
        assert_eq!(config.messages.capacity, 128);
        assert_eq!(config.messages.next_id, 40);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let content = r#"
            [messages]
            capacity = 0
        "#;

        let result = AgentConfig::parse(content);
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_unknown_policy_rejected() {
        let content = r#"
            [parser]
            size_parsing = "guess"
        "#;

        let result = AgentConfig::parse(content);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = AgentConfig::parse("capacity = 3");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AgentConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, AgentConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ota.toml");
        std::fs::write(&path, "[messages]\nnext_id = 7\n").unwrap();

        let config = AgentConfig::load(&path).unwrap();
        assert_eq!(config.messages.next_id, 7);
        assert_eq!(config.messages.capacity, 256);
    }
}
