//! Configuration for the directive bridge.

use crate::directive::BlinkDefaults;
use crate::dispatch::DEFAULT_LED_TOPIC;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolConfig {
    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Device addressing.
    pub device: DeviceConfig,
    /// Values filled in for missing BLINK parameters.
    pub blink: BlinkDefaults,
}

impl Default for SolConfig {
    fn default() -> Self {
        Self {
            log_filter: "info".to_owned(),
            device: DeviceConfig::default(),
            blink: BlinkDefaults::default(),
        }
    }
}

/// Where control payloads are published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Message-bus topic for the LED.
    pub topic: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            topic: DEFAULT_LED_TOPIC.to_owned(),
        }
    }
}

impl SolConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&content).map_err(|e| crate::error::SolError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise use defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> crate::error::Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::debug!(path = %path.display(), "config file not found; using defaults");
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::SolError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the bridge cannot work with.
    ///
    /// # Errors
    ///
    /// Returns a config error naming the offending field.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.device.topic.trim().is_empty() {
            return Err(crate::error::SolError::Config(
                "device.topic cannot be empty".to_owned(),
            ));
        }
        let blink = &self.blink;
        if !(blink.delay_secs.is_finite() && blink.delay_secs > 0.0) {
            return Err(crate::error::SolError::Config(format!(
                "blink.delay_secs must be positive, got {}",
                blink.delay_secs
            )));
        }
        if blink.times == 0 {
            return Err(crate::error::SolError::Config(
                "blink.times must be at least 1".to_owned(),
            ));
        }
        if !(blink.duration_secs.is_finite() && blink.duration_secs > 0.0) {
            return Err(crate::error::SolError::Config(format!(
                "blink.duration_secs must be positive, got {}",
                blink.duration_secs
            )));
        }
        Ok(())
    }

    /// Returns the default config file path: `~/.config/sol/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("sol").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("sol")
                .join("config.toml")
        } else {
            PathBuf::from("/tmp/sol-config/config.toml")
        }
    }
}
