//! Scanner error types

use thiserror::Error;
use shared::SharedError;

/// Result type for scanner operations
pub type ScannerResult<T> = Result<T, ScannerError>;

/// Scanner error types
#[derive(Error, Debug)]
pub enum ScannerError {
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Attendance sheet error: {message}")]
    StorageError { message: String },

    #[error("Notification failed: {message}")]
    NotificationError { message: String },

    #[error("Channel closed: {channel}")]
    ChannelClosed { channel: String },

    #[error("Shared component error: {0}")]
    SharedError(#[from] SharedError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Task join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),
}

impl ScannerError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError { message: message.into() }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::StorageError { message: message.into() }
    }

    pub fn notification(message: impl Into<String>) -> Self {
        Self::NotificationError { message: message.into() }
    }

    pub fn channel_closed(channel: impl Into<String>) -> Self {
        Self::ChannelClosed { channel: channel.into() }
    }
}
