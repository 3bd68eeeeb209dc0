//! Machine memory-map configuration.
//!
//! Stored as JSON. Every field is optional and falls back to the standard
//! micro0 layout:
//!
//! ```json
//! { "ram_base": 0, "char_out_base": 61440 }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Conventional address of the character output window.
pub const DEFAULT_CHAR_OUT_BASE: u16 = 0xF000;

/// Where each device sits on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Base address of RAM. Image byte 0 lives here.
    pub ram_base: u16,
    /// Base address of the character output device.
    pub char_out_base: u16,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            ram_base: 0x0000,
            char_out_base: DEFAULT_CHAR_OUT_BASE,
        }
    }
}

impl SystemConfig {
    /// Parse a configuration from JSON text.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_json(&text)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> String {
        // Two integer fields cannot fail to serialize.
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Reject layouts where two devices share a base address.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ram_base == self.char_out_base {
            return Err(ConfigError::Overlap(self.ram_base));
        }
        Ok(())
    }
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("invalid configuration: {0}")]
    Parse(String),

    #[error("RAM and character output both mapped at {0:#06x}")]
    Overlap(u16),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let config = SystemConfig::default();
        assert_eq!(config.ram_base, 0);
        assert_eq!(config.char_out_base, 0xF000);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = SystemConfig::from_json(r#"{ "char_out_base": 32768 }"#).unwrap();
        assert_eq!(config.ram_base, 0);
        assert_eq!(config.char_out_base, 0x8000);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = SystemConfig { ram_base: 0x0100, char_out_base: 0xFF00 };
        assert_eq!(SystemConfig::from_json(&config.to_json()).unwrap(), config);
    }

    #[test]
    fn test_overlap_rejected() {
        let result = SystemConfig::from_json(r#"{ "ram_base": 61440 }"#);
        assert_eq!(result, Err(ConfigError::Overlap(0xF000)));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            SystemConfig::from_json("{ ram_base: }"),
            Err(ConfigError::Parse(_))
        ));
    }
}
