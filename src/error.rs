/// Centralized error types for the recorder
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecorderError {
    // Configuration Errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Persistence Errors
    #[error("Store write failed: {0}")]
    Store(String),

    #[error("Settings persistence failed: {0}")]
    Settings(String),

    // Data Errors
    #[error("Deserialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    // File I/O Errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RecorderError>;

impl RecorderError {
    /// Get error code for logging/monitoring
    pub fn error_code(&self) -> &str {
        match self {
            RecorderError::Config(_) => "CFG_001",
            RecorderError::Store(_) => "STORE_001",
            RecorderError::Settings(_) => "STORE_002",
            RecorderError::Serialization(_) => "DATA_001",
            RecorderError::Io(_) => "FILE_001",
        }
    }
}
