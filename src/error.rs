//! Error types for the chat client
//!
//! Startup errors (config, credentials, connect) are fatal and abort the
//! process with a diagnostic. Steady-state errors (decode, publish) are
//! handled where they occur and never tear down the session.

use crate::config::ConfigError;
use crate::transport::mqtt::SessionError;
use thiserror::Error;

/// Top-level error type for chat client operations
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Console I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for chat client operations
pub type ChatResult<T> = Result<T, ChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_conversion() {
        let config_error = ConfigError::InvalidConfig("bad field".to_string());
        let error: ChatError = config_error.into();
        assert!(matches!(error, ChatError::Config(_)));
        assert!(error.to_string().contains("bad field"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let error: ChatError = io_error.into();
        assert!(matches!(error, ChatError::Io(_)));
    }
}
