//! # Configuration Management Module
//!
//! This module handles all configuration aspects of cmdbridge, providing a
//! centralized configuration system with defaults and persistence.
//!
//! ## Configuration Structure
//!
//! The configuration is organized into logical sections:
//!
//! - [`BridgeConfig`] - Trigger prefixes, quick-list keywords, output decoration
//! - [`ServiceConfig`] - Remote generative-language service settings
//! - [`DeliveryConfig`] - Pacing of multi-line replies
//! - [`LoggingConfig`] - Logging and debugging settings
//!
//! ## Usage
//!
//! ```rust,no_run
//! use cmdbridge::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Load configuration from file
//!     let config = Config::load("config.toml").await?;
//!     println!("Trigger: {}", config.bridge.primary_prefix);
//!
//!     // Create default configuration
//!     Config::create_default("config.toml").await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File Format
//!
//! ```toml
//! [bridge]
//! primary_prefix = "!cmd"
//! alias_prefix = "!커맨드"
//!
//! [service]
//! api_key = ""
//! model = "gemini-pro"
//! timeout_seconds = 10
//!
//! [delivery]
//! line_delay_ms = 150
//! ```
//!
//! ## Environment Integration
//!
//! `GEMINI_API_KEY` overrides `service.api_key` when set and non-empty, so the key
//! does not have to live in the config file. Precedence: Environment > Config file > Defaults.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::fs;

/// Environment variable consulted for the service API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub bridge: BridgeConfig,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Primary trigger, e.g. `!cmd <what you want>`.
    pub primary_prefix: String,
    /// Localized alias for the primary trigger.
    pub alias_prefix: String,
    /// Keywords that list the quick example queries.
    #[serde(default = "default_quick_keywords")]
    pub quick_keywords: Vec<String>,
    /// Decorate outgoing lines with Minecraft `§` colour codes.
    #[serde(default = "default_color_codes")]
    pub color_codes: bool,
    /// Longest accepted query, in characters.
    #[serde(default = "default_max_query_chars")]
    pub max_query_chars: usize,
    /// Delay before greeting a player who just joined (ms). 0 disables the greeting.
    #[serde(default = "default_welcome_delay_ms")]
    pub welcome_delay_ms: u64,
}

fn default_quick_keywords() -> Vec<String> {
    vec!["!quick".to_string(), "!퀵".to_string()]
}

fn default_color_codes() -> bool {
    true
}

fn default_max_query_chars() -> usize {
    300
}

fn default_welcome_delay_ms() -> u64 {
    2000
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            primary_prefix: "!cmd".to_string(),
            alias_prefix: "!커맨드".to_string(),
            quick_keywords: default_quick_keywords(),
            color_codes: default_color_codes(),
            max_query_chars: default_max_query_chars(),
            welcome_delay_ms: default_welcome_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// API key for the generative-language service
    pub api_key: String,
    /// Base endpoint, without the model path
    pub endpoint: String,
    /// Model name appended as `models/{model}:generateContent`
    pub model: String,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
    pub temperature: f64,
    pub max_output_tokens: u32,
    pub top_p: f64,
    pub top_k: u32,
    /// Replaces the built-in role prompt when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-pro".to_string(),
            timeout_seconds: 10,
            // Low temperature keeps command syntax precise
            temperature: 0.3,
            max_output_tokens: 1500,
            top_p: 0.8,
            top_k: 40,
            instructions: None,
        }
    }
}

impl ServiceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds as u64)
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Gap between consecutive paced lines to the same player (ms).
    pub line_delay_ms: u64,
    /// Interval (ms) for periodic delivery stats logging (0 disables).
    #[serde(default = "default_stats_interval_ms")]
    pub stats_interval_ms: u64,
}

fn default_stats_interval_ms() -> u64 {
    60_000
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            // Three game ticks at 20 TPS
            line_delay_ms: 150,
            stats_interval_ms: default_stats_interval_ms(),
        }
    }
}

impl DeliveryConfig {
    pub fn line_delay(&self) -> Duration {
        Duration::from_millis(self.line_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: Some("cmdbridge.log".to_string()),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let mut config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        config.apply_env();
        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    /// Overlay environment overrides onto the loaded file values.
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.service.api_key = key;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_service_tuning() {
        let config = ServiceConfig::default();
        assert_eq!(config.timeout_seconds, 10);
        assert_eq!(config.max_output_tokens, 1500);
        assert_eq!(config.top_k, 40);
        assert!(!config.is_configured());
        assert_eq!(config.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_default_prefixes() {
        let config = Config::default();
        assert_eq!(config.bridge.primary_prefix, "!cmd");
        assert_eq!(config.bridge.alias_prefix, "!커맨드");
        assert_eq!(config.bridge.quick_keywords, vec!["!quick", "!퀵"]);
        assert_eq!(config.delivery.line_delay(), Duration::from_millis(150));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let raw = r#"
[service]
api_key = "abc"
endpoint = "http://localhost:9000"
model = "test-model"
timeout_seconds = 3
temperature = 0.5
max_output_tokens = 200
top_p = 0.9
top_k = 10
"#;
        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.service.api_key, "abc");
        assert_eq!(config.service.timeout_seconds, 3);
        assert!(config.service.instructions.is_none());
        assert_eq!(config.bridge.primary_prefix, "!cmd");
        assert_eq!(config.delivery.line_delay_ms, 150);
    }

    #[test]
    fn test_bridge_section_optional_fields() {
        let raw = r#"
[bridge]
primary_prefix = "!ai"
alias_prefix = "!ask"
"#;
        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.bridge.primary_prefix, "!ai");
        assert!(config.bridge.color_codes);
        assert_eq!(config.bridge.max_query_chars, 300);
        assert_eq!(config.bridge.welcome_delay_ms, 2000);
    }

    #[test]
    fn test_default_serializes() {
        let serialized = toml::to_string_pretty(&Config::default()).unwrap();
        assert!(serialized.contains("[service]"));
        assert!(serialized.contains("line_delay_ms = 150"));
        assert!(!serialized.contains("instructions"));
        let back: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(back.service.model, "gemini-pro");
    }
}
