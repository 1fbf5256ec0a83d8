//! Provider-reported call errors and state-publishing errors
//!
//! [`CallError`] is data: it travels inside a [`CallState`](crate::CallState)
//! and is shown to the user. [`StateError`] is control flow: it tells a
//! provider that a snapshot it tried to publish breaks a session invariant.

use thiserror::Error;

use crate::state::CallStatus;

/// Error condition reported by the provider as part of the call state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CallError {
    /// No error
    #[default]
    None,
    /// Network connectivity was lost
    NetworkError,
    /// The app may not record audio
    MicrophonePermissionDenied,
    /// Another app holds the audio hardware
    HardwareInUse,
    /// Provider-specific failure
    ProviderError {
        /// Message from the provider, may be blank
        message: String,
        /// Provider error code
        code: i32,
    },
}

impl CallError {
    /// Create a provider error
    pub fn provider(message: impl Into<String>, code: i32) -> Self {
        Self::ProviderError {
            message: message.into(),
            code,
        }
    }

    /// Whether this value carries an actual error
    pub fn is_error(&self) -> bool {
        !matches!(self, CallError::None)
    }

    /// User-facing text; empty for [`CallError::None`]
    pub fn display_text(&self) -> String {
        match self {
            CallError::None => String::new(),
            CallError::NetworkError => "Network error".to_string(),
            CallError::MicrophonePermissionDenied => "Microphone permission denied".to_string(),
            CallError::HardwareInUse => "Audio hardware is in use by another app".to_string(),
            CallError::ProviderError { message, code } => {
                if message.trim().is_empty() {
                    format!("Call failed (error {})", code)
                } else {
                    message.clone()
                }
            }
        }
    }
}

/// Reasons a provider may not publish a snapshot
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// The session already reached a terminal status
    #[error("session already terminated, refusing {attempted} state")]
    SessionTerminated {
        /// Status of the rejected snapshot
        attempted: CallStatus,
    },

    /// A connected snapshot without a connect timestamp
    #[error("connected state is missing its connect timestamp")]
    MissingConnectTimestamp,

    /// The connect timestamp moved backwards
    #[error("connect timestamp moved backwards")]
    TimestampRegressed,

    /// The provider was released and accepts no more updates
    #[error("provider has been released")]
    ProviderReleased,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_is_empty() {
        assert_eq!(CallError::None.display_text(), "");
        assert!(!CallError::None.is_error());
    }

    #[test]
    fn test_fixed_messages() {
        assert_eq!(CallError::NetworkError.display_text(), "Network error");
        assert_eq!(
            CallError::MicrophonePermissionDenied.display_text(),
            "Microphone permission denied"
        );
        assert_eq!(
            CallError::HardwareInUse.display_text(),
            "Audio hardware is in use by another app"
        );
    }

    #[test]
    fn test_provider_error_uses_custom_message() {
        let error = CallError::provider("Server Exploded", 500);
        assert_eq!(error.display_text(), "Server Exploded");
        assert!(error.is_error());
    }

    #[test]
    fn test_provider_error_blank_message_falls_back_to_code() {
        let error = CallError::provider(" ", 404);
        assert_eq!(error.display_text(), "Call failed (error 404)");
    }
}
