//! Error types for Kino Tracker

use crate::player::PlayerEventKind;
use thiserror::Error;

/// Result type alias for tracker operations
pub type Result<T> = std::result::Result<T, Error>;

/// Tracker error types
#[derive(Error, Debug)]
pub enum Error {
    // Binding errors
    #[error("Failed to subscribe to {kind} events: {reason}")]
    Subscribe {
        kind: PlayerEventKind,
        reason: String,
    },

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a subscription error for the given event kind
    pub fn subscribe(kind: PlayerEventKind, reason: impl Into<String>) -> Self {
        Error::Subscribe {
            kind,
            reason: reason.into(),
        }
    }

    /// Returns true if retrying the failed operation may succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Subscribe { .. })
    }

    /// Returns the error code for analytics
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Subscribe { .. } => "SUBSCRIBE_FAILED",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::Json(_) => "JSON",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_error_message() {
        let err = Error::subscribe(PlayerEventKind::TimeUpdate, "bus closed");
        assert_eq!(err.to_string(), "Failed to subscribe to timeupdate events: bus closed");
        assert_eq!(err.error_code(), "SUBSCRIBE_FAILED");
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_config_error_not_recoverable() {
        let err = Error::InvalidConfig("empty name".into());
        assert!(!err.is_recoverable());
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_json_error_from_config_parse() {
        let err = crate::TrackerConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
        assert_eq!(err.error_code(), "JSON");
        assert!(!err.is_recoverable());
    }
}
