use chrono::NaiveDate;
use thiserror::Error;

/// Main error type for worklog-recap
#[derive(Error, Debug)]
pub enum RecapError {
    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML parsing errors
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Persistent store errors
    #[error("Storage error: {0}")]
    Storage(#[from] sled::Error),

    /// A stored setting has never been written
    #[error("{0} is not configured")]
    NotConfigured(String),

    /// Missing configuration
    #[error("Missing required configuration: {0}")]
    MissingConfig(String),

    /// Report generation attempted without an API key
    #[error("Please set your OpenRouter API key in the extension settings")]
    ApiKeyMissing,

    /// Neither an explicit nor a remembered account
    #[error("Please select an account")]
    NoAccountSelected,

    /// Selected account does not exist in the store
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// End date earlier than start date
    #[error("End date {end} cannot be earlier than start date {start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    /// Non-success response from the tracker
    #[error("Tracker request failed ({status}): {message}")]
    Tracker { status: u16, message: String },

    /// Top-level worklog fetch failure
    #[error("Failed to fetch worklogs: {0}")]
    FetchFailed(String),

    /// Text-generation API failure
    #[error("Failed to generate resume with AI: {0}")]
    GenerationFailed(String),
}

/// Result type alias for worklog-recap operations
pub type Result<T> = std::result::Result<T, RecapError>;

impl RecapError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new generation error
    pub fn generation<S: Into<String>>(msg: S) -> Self {
        Self::GenerationFailed(msg.into())
    }

    /// Wrap any failure of the search step
    pub fn fetch_failed(err: RecapError) -> Self {
        match err {
            already @ Self::FetchFailed(_) => already,
            other => Self::FetchFailed(other.to_string()),
        }
    }

    /// Errors caused by missing or invalid user setup
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::MissingConfig(_)
                | Self::NotConfigured(_)
                | Self::ApiKeyMissing
                | Self::NoAccountSelected
                | Self::AccountNotFound(_)
                | Self::InvalidDateRange { .. }
        )
    }

    /// Errors raised by a remote call
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::Tracker { .. } | Self::FetchFailed(_) | Self::GenerationFailed(_)
        )
    }
}
