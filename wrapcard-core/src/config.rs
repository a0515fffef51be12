//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/wrapcard/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/wrapcard/` (~/.config/wrapcard/)
//! - State/Logs: `$XDG_STATE_HOME/wrapcard/` (~/.local/state/wrapcard/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Gemini autofill configuration
    #[serde(default)]
    pub autofill: AutofillConfig,

    /// Card export configuration
    #[serde(default)]
    pub export: ExportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Gemini text-completion settings used by autofill
#[derive(Debug, Deserialize, Clone)]
pub struct AutofillConfig {
    /// Model to use
    #[serde(default = "default_autofill_model")]
    pub model: String,

    /// API endpoint
    #[serde(default = "default_autofill_endpoint")]
    pub endpoint: String,

    /// API key (takes precedence over `api_key_env`)
    pub api_key: Option<String>,

    /// Environment variable consulted when `api_key` is unset
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_autofill_timeout")]
    pub timeout_secs: u64,
}

impl Default for AutofillConfig {
    fn default() -> Self {
        Self {
            model: default_autofill_model(),
            endpoint: default_autofill_endpoint(),
            api_key: None,
            api_key_env: default_api_key_env(),
            timeout_secs: default_autofill_timeout(),
        }
    }
}

impl AutofillConfig {
    /// Resolve the API key from config, then from the configured env var.
    ///
    /// Blank values count as missing.
    pub fn resolve_api_key(&self) -> Option<String> {
        let present = |key: &String| !key.trim().is_empty();
        self.api_key
            .clone()
            .filter(present)
            .or_else(|| std::env::var(&self.api_key_env).ok().filter(present))
    }
}

fn default_autofill_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_autofill_endpoint() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_autofill_timeout() -> u64 {
    60
}

/// Card export configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ExportConfig {
    /// Directory exported images are written to
    pub output_dir: Option<PathBuf>,

    /// TrueType/OpenType font used for card text
    pub font_path: Option<PathBuf>,

    /// Raster scale relative to the 400x711 logical card
    #[serde(default = "default_pixel_ratio")]
    pub pixel_ratio: u32,

    /// Timeout for fetching remote photo URLs
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            font_path: None,
            pixel_ratio: default_pixel_ratio(),
            fetch_timeout_secs: default_fetch_timeout(),
        }
    }
}

impl ExportConfig {
    /// Directory to save exports into.
    ///
    /// Falls back to the user's download directory, then the current directory.
    pub fn resolved_output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.pixel_ratio < 2 {
            return Err(Error::Config(
                "export.pixel_ratio must be at least 2".to_string(),
            ));
        }
        if self.pixel_ratio > 8 {
            return Err(Error::Config(
                "export.pixel_ratio must be at most 8".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_pixel_ratio() -> u32 {
    2
}

fn default_fetch_timeout() -> u64 {
    15
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;
        config.export.validate()?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/wrapcard/config.toml` (~/.config/wrapcard/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("wrapcard").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/wrapcard/` (~/.local/state/wrapcard/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("wrapcard")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/wrapcard/wrapcard.log` (~/.local/state/wrapcard/wrapcard.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("wrapcard.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.autofill.model, "gemini-2.5-flash");
        assert_eq!(config.autofill.api_key_env, "GEMINI_API_KEY");
        assert_eq!(config.export.pixel_ratio, 2);
        assert_eq!(config.logging.level, "info");
        assert!(config.export.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[autofill]
model = "gemini-2.0-flash"
api_key = "test-key"
timeout_secs = 10

[export]
output_dir = "/tmp/cards"
pixel_ratio = 3

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.autofill.model, "gemini-2.0-flash");
        assert_eq!(config.autofill.timeout_secs, 10);
        assert_eq!(config.autofill.resolve_api_key().as_deref(), Some("test-key"));
        assert_eq!(config.export.pixel_ratio, 3);
        assert_eq!(
            config.export.resolved_output_dir(),
            PathBuf::from("/tmp/cards")
        );
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_pixel_ratio_validation() {
        let config = ExportConfig {
            pixel_ratio: 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ExportConfig {
            pixel_ratio: 4,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_blank_api_key_counts_as_missing() {
        let config = AutofillConfig {
            api_key: Some("   ".to_string()),
            api_key_env: "WRAPCARD_TEST_UNSET_KEY".to_string(),
            ..Default::default()
        };
        assert!(config.resolve_api_key().is_none());
    }

    #[test]
    fn test_blank_api_key_falls_back_to_env() {
        std::env::set_var("WRAPCARD_TEST_FALLBACK_KEY", "env-key");
        let config = AutofillConfig {
            api_key: Some(String::new()),
            api_key_env: "WRAPCARD_TEST_FALLBACK_KEY".to_string(),
            ..Default::default()
        };
        assert_eq!(config.resolve_api_key().as_deref(), Some("env-key"));

        let configured = AutofillConfig {
            api_key: Some("config-key".to_string()),
            ..config
        };
        assert_eq!(configured.resolve_api_key().as_deref(), Some("config-key"));
        std::env::remove_var("WRAPCARD_TEST_FALLBACK_KEY");
    }

    #[test]
    fn test_load_from_rejects_bad_toml() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[export\npixel_ratio = ").unwrap();
        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }
}
