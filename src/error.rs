/// Centralized error types for the Kite client
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KiteError {
    // Authentication Errors
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    // Network Errors
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Broker API error: {status} - {message}")]
    BrokerApiError { status: u16, message: String },

    // Data Errors
    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Instrument not found: {0}")]
    InstrumentNotFound(String),

    #[error("Deserialization failed: {0}")]
    DeserializationError(#[from] serde_json::Error),

    // Configuration Errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // File I/O Errors
    #[error("File I/O error: {0}")]
    FileError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, KiteError>;

impl KiteError {
    /// Get error code for logging/monitoring
    pub fn error_code(&self) -> &str {
        match self {
            KiteError::AuthenticationFailed(_) => "AUTH_001",
            KiteError::HttpError(_) => "NET_001",
            KiteError::BrokerApiError { .. } => "BROKER_001",
            KiteError::MissingInput(_) => "DATA_001",
            KiteError::InstrumentNotFound(_) => "DATA_002",
            KiteError::DeserializationError(_) => "DATA_003",
            KiteError::ConfigError(_) => "CFG_001",
            KiteError::FileError(_) => "FILE_001",
        }
    }
}
