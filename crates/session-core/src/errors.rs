//! Error types for session orchestration

use thiserror::Error;

/// Result type for session-core operations
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors reported to the host by the orchestrator and its wrappers
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session was not started, typically because no provider was available
    #[error("Session not started: {reason}")]
    NotStarted { reason: String },

    /// Invalid configuration
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// A presentation sink call failed where the caller asked for the result
    #[error("Presentation error: {0}")]
    Presentation(#[from] PresentationError),

    /// Infrastructure failure (logging, task management)
    #[error("Infrastructure error: {0}")]
    Infra(#[from] callkeeper_infra_common::Error),
}

impl SessionError {
    /// Create a not-started error
    pub fn not_started(reason: impl Into<String>) -> Self {
        Self::NotStarted {
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Whether the caller got the setup wrong, as opposed to a runtime failure
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, SessionError::NotStarted { .. } | SessionError::Configuration { .. })
    }

    /// Whether retrying the same operation later can succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            SessionError::NotStarted { .. } => true,
            SessionError::Presentation(e) => e.is_transient(),
            _ => false,
        }
    }
}

/// Failures of a [`PresentationSink`](crate::PresentationSink) call
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PresentationError {
    /// The sink rejected or failed the refresh
    #[error("refresh failed: {message}")]
    RefreshFailed { message: String },

    /// The sink did not answer in time
    #[error("sink did not respond within {millis} ms")]
    Timeout { millis: u64 },

    /// The sink panicked
    #[error("sink panicked")]
    Panicked,
}

impl PresentationError {
    /// Create a refresh failure
    pub fn refresh_failed(message: impl Into<String>) -> Self {
        Self::RefreshFailed {
            message: message.into(),
        }
    }

    /// Every presentation failure is retried by the next tick or emission
    pub fn is_transient(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let missing = SessionError::not_started("no active call provider");
        assert!(missing.is_configuration_error());
        assert_eq!(missing.to_string(), "Session not started: no active call provider");

        let presentation: SessionError = PresentationError::Timeout { millis: 250 }.into();
        assert!(!presentation.is_configuration_error());
        assert!(presentation.is_recoverable());

        let infra: SessionError = callkeeper_infra_common::Error::config("bad level").into();
        assert!(!infra.is_recoverable());
    }
}
