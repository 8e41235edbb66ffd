//! # Configuration Management
//!
//! Loads and manages application configuration from multiple sources:
//! - TOML configuration files (config.toml)
//! - Environment variables (with APP_ prefix)
//! - Default values (built into the code)
//!
//! ## Configuration Priority (highest to lowest):
//! 1. `HOST` / `PORT` environment variables (deployment platforms set these)
//! 2. Environment variables (APP_SERVER__HOST, APP_RELAY__MAX_FRAME_BYTES,
//!    etc. — a double underscore separates the section from the key, so keys
//!    that themselves contain underscores survive the mapping)
//! 3. Configuration file (config.toml)
//! 4. Default values (defined in the Default impl)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;

/// Default cap on a single frame's payload: 32 MiB.
///
/// The wire header is a 32-bit length read from an untrusted peer; without a
/// cap a corrupted or hostile header could demand a 4 GiB allocation.
pub const DEFAULT_MAX_FRAME_BYTES: u32 = 32 * 1024 * 1024;

/// Main application configuration that contains all settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub relay: RelayConfig,
    pub languages: LanguagesConfig,
}

/// Server-specific configuration settings.
///
/// ## Common values:
/// - `host = "127.0.0.1"`: Only accept connections from localhost (development)
/// - `host = "0.0.0.0"`: Accept connections from any IP address (production)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Relay transport tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Maximum payload size accepted in a single frame, in bytes.
    pub max_frame_bytes: u32,
}

/// The two spoken languages the relay translates between.
///
/// Each language is a pair of tags: the recognition hint handed to the
/// speech-to-text collaborator (e.g. "en-US") and the short tag used for
/// language detection, translation targets, and speech synthesis (e.g. "en").
/// Audio detected in the primary language is translated to the secondary and
/// vice versa.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguagesConfig {
    pub primary_stt: String,
    pub primary_tts: String,
    pub secondary_stt: String,
    pub secondary_tts: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(), // Accept peers from anywhere
                port: 5555,                  // Well-known local default
            },
            relay: RelayConfig {
                max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
            },
            languages: LanguagesConfig {
                primary_stt: "en-US".to_string(),
                primary_tts: "en".to_string(),
                secondary_stt: "es-ES".to_string(),
                secondary_tts: "es".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources in priority order.
    ///
    /// ## Loading Process:
    /// 1. Start with built-in defaults
    /// 2. Override with values from config.toml (if it exists)
    /// 3. Override with environment variables prefixed with APP_
    /// 4. Handle the bare `HOST` and `PORT` environment variables that
    ///    deployment platforms export without the APP_ prefix
    pub fn load() -> Result<Self> {
        let mut settings = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(config::File::with_name("config").required(false))
            // Double underscore separates section from key, so that keys like
            // max_frame_bytes keep their own underscores:
            // APP_SERVER__HOST -> server.host
            // APP_RELAY__MAX_FRAME_BYTES -> relay.max_frame_bytes
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            );

        if let Ok(host) = env::var("HOST") {
            settings = settings.set_override("server.host", host)?;
        }

        if let Ok(port) = env::var("PORT") {
            settings = settings.set_override("server.port", port)?;
        }

        let config = settings.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Validate that the configuration values make sense.
    ///
    /// Catching configuration errors at startup gives a clear message instead
    /// of a confusing runtime failure on the first connection.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(anyhow::anyhow!("Server port cannot be 0"));
        }

        if self.relay.max_frame_bytes == 0 {
            return Err(anyhow::anyhow!("Max frame bytes must be greater than 0"));
        }

        let tags = [
            ("languages.primary_stt", &self.languages.primary_stt),
            ("languages.primary_tts", &self.languages.primary_tts),
            ("languages.secondary_stt", &self.languages.secondary_stt),
            ("languages.secondary_tts", &self.languages.secondary_tts),
        ];
        for (name, value) in tags {
            if value.trim().is_empty() {
                return Err(anyhow::anyhow!("{} cannot be empty", name));
            }
        }

        if self.languages.primary_tts == self.languages.secondary_tts {
            return Err(anyhow::anyhow!(
                "Primary and secondary languages must differ (both are '{}')",
                self.languages.primary_tts
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test that the default configuration is valid and has expected values.
    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5555);
        assert_eq!(config.relay.max_frame_bytes, DEFAULT_MAX_FRAME_BYTES);
        assert!(config.validate().is_ok());
    }

    /// Test that validation catches invalid configurations.
    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();
        config.server.port = 0; // Invalid port
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.relay.max_frame_bytes = 0;
        assert!(config.validate().is_err());
    }

    /// Test that matching language pairs are rejected.
    #[test]
    fn test_config_rejects_identical_languages() {
        let mut config = AppConfig::default();
        config.languages.secondary_tts = config.languages.primary_tts.clone();
        assert!(config.validate().is_err());
    }

    /// Test that empty language tags are rejected.
    #[test]
    fn test_config_rejects_empty_language_tag() {
        let mut config = AppConfig::default();
        config.languages.secondary_stt = "  ".to_string();
        assert!(config.validate().is_err());
    }

    /// Environment overrides reach nested keys, including keys that contain
    /// underscores themselves, plus the bare PORT deployment override.
    ///
    /// Env vars are process-global, so all env-driven assertions live in this
    /// one test to avoid races with parallel test threads.
    #[test]
    fn test_env_overrides_apply_to_multiword_keys() {
        env::set_var("APP_RELAY__MAX_FRAME_BYTES", "1024");
        env::set_var("APP_LANGUAGES__SECONDARY_STT", "fr-FR");
        env::set_var("PORT", "9999");
        let config = AppConfig::load();
        env::remove_var("APP_RELAY__MAX_FRAME_BYTES");
        env::remove_var("APP_LANGUAGES__SECONDARY_STT");
        env::remove_var("PORT");

        let config = config.unwrap();
        assert_eq!(config.relay.max_frame_bytes, 1024);
        assert_eq!(config.languages.secondary_stt, "fr-FR");
        assert_eq!(config.server.port, 9999);
    }
}
