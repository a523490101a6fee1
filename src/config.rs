use crate::error::{RecapError, Result};
use crate::report::openrouter::{DEFAULT_MODEL, OPENROUTER_API_URL};
use crate::report::{ReportLanguage, ReportLength, ReportStyle};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Model identifier sent to OpenRouter
    #[serde(default = "default_model")]
    pub model: String,

    /// Chat completions endpoint
    #[serde(default = "default_api_url")]
    pub openrouter_api_url: String,

    /// Default report length
    #[serde(default)]
    pub default_length: ReportLength,

    /// Default report style
    #[serde(default)]
    pub default_style: ReportStyle,

    /// Default report language
    #[serde(default)]
    pub default_language: ReportLanguage,

    /// Default timespan in days (default: 7 days / 1 week)
    #[serde(default = "default_timespan")]
    pub default_timespan_days: u32,

    /// Directory holding the account store (None = ~/.local/share/worklog-recap)
    pub store_path: Option<PathBuf>,

    /// HTTP request timeout in seconds (None = wait indefinitely)
    pub request_timeout_secs: Option<u64>,
}

impl Config {
    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RecapError::config(format!(
                "Config file not found at: {}",
                path.display()
            )));
        }

        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| RecapError::config("Could not determine home directory"))?;
        Ok(home.join(".config").join("worklog-recap").join("config.toml"))
    }

    /// Get the default account store directory
    pub fn default_store_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| RecapError::config("Could not determine home directory"))?;
        Ok(home.join(".local").join("share").join("worklog-recap"))
    }

    /// Store directory from config, or the default one
    pub fn store_dir(&self) -> Result<PathBuf> {
        match &self.store_path {
            Some(path) => Ok(path.clone()),
            None => Self::default_store_dir(),
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Create a default configuration file at the default location
    pub fn create_default() -> Result<Self> {
        Self::create_default_at(&Self::default_config_path()?)
    }

    /// Write a default configuration file to `path`
    pub fn create_default_at(path: &Path) -> Result<Self> {
        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config = Self::default();
        let toml_string = toml::to_string_pretty(&config)?;
        fs::write(path, toml_string)?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(RecapError::MissingConfig("model is required".to_string()));
        }

        if !self.openrouter_api_url.starts_with("http") {
            return Err(RecapError::config(
                "openrouter_api_url must be an http(s) URL",
            ));
        }

        if self.default_timespan_days == 0 {
            return Err(RecapError::config("default_timespan_days must be > 0"));
        }

        if self.request_timeout_secs == Some(0) {
            return Err(RecapError::config("request_timeout_secs must be > 0"));
        }

        Ok(())
    }

    /// Load config from the default location (~/.config/worklog-recap/config.toml),
    /// or create it with defaults if it doesn't exist
    pub fn load_or_create_default() -> Result<Self> {
        Self::load_or_create_at(&Self::default_config_path()?)
    }

    /// Load config from `path`, writing defaults there only when no file exists.
    /// An existing file that fails to parse or validate is never overwritten.
    pub fn load_or_create_at(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::load_from(path);
        }

        tracing::info!(path = %path.display(), "config file not found, creating default config");
        Self::create_default_at(path)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: default_model(),
            openrouter_api_url: default_api_url(),
            default_length: ReportLength::default(),
            default_style: ReportStyle::default(),
            default_language: ReportLanguage::default(),
            default_timespan_days: default_timespan(),
            store_path: None,
            request_timeout_secs: None,
        }
    }
}

// Serde default functions
fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_api_url() -> String {
    OPENROUTER_API_URL.to_string()
}

fn default_timespan() -> u32 {
    7 // 1 week
}
