//! Call session snapshot types
//!
//! A [`CallState`] is never mutated in place once published: providers build
//! a new value (usually through the `with_*` helpers) and publish it as a
//! whole.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::error::CallError;

/// Lifecycle stage of a call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallStatus {
    /// No active call session exists
    #[default]
    Idle,
    /// Asking the provider to place the call
    Initiating,
    /// The call is alerting, locally or remotely
    Ringing,
    /// Accepted, media not yet established
    Connecting,
    /// Media is live
    Connected,
    /// Signal lost, trying to restore media
    Reconnecting,
    /// Hang-up requested, awaiting provider cleanup
    Disconnecting,
    /// The session has ended
    Disconnected,
}

impl CallStatus {
    /// Every status, in lifecycle order
    pub const ALL: [CallStatus; 8] = [
        CallStatus::Idle,
        CallStatus::Initiating,
        CallStatus::Ringing,
        CallStatus::Connecting,
        CallStatus::Connected,
        CallStatus::Reconnecting,
        CallStatus::Disconnecting,
        CallStatus::Disconnected,
    ];

    /// Terminal statuses end the session; nothing meaningful follows them
    pub fn is_terminal(self) -> bool {
        matches!(self, CallStatus::Disconnecting | CallStatus::Disconnected)
    }

    /// User-facing status line; empty for statuses that show nothing
    pub fn display_text(self) -> &'static str {
        match self {
            CallStatus::Ringing => "Ringing",
            CallStatus::Connecting => "Connecting",
            CallStatus::Connected => "Ongoing call",
            CallStatus::Reconnecting => "Reconnecting",
            _ => "",
        }
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CallStatus::Idle => "IDLE",
            CallStatus::Initiating => "INITIATING",
            CallStatus::Ringing => "RINGING",
            CallStatus::Connecting => "CONNECTING",
            CallStatus::Connected => "CONNECTED",
            CallStatus::Reconnecting => "RECONNECTING",
            CallStatus::Disconnecting => "DISCONNECTING",
            CallStatus::Disconnected => "DISCONNECTED",
        };
        f.write_str(name)
    }
}

/// Origin of the call relative to the local device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallDirection {
    /// Placed by a remote party
    Incoming,
    /// Placed from this device
    #[default]
    Outgoing,
}

impl fmt::Display for CallDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallDirection::Incoming => f.write_str("incoming"),
            CallDirection::Outgoing => f.write_str("outgoing"),
        }
    }
}

/// Snapshot of one call session
///
/// `connect_timestamp` is set when the status first becomes
/// [`CallStatus::Connected`] and stays untouched for the rest of the session,
/// including across a reconnect.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CallState {
    /// Display name of the remote party
    pub caller_name: String,
    /// Number or address of the remote party
    pub caller_handle: String,
    /// Current lifecycle stage
    pub status: CallStatus,
    /// Who placed the call
    pub direction: CallDirection,
    /// When the call first connected
    pub connect_timestamp: Option<Instant>,
    /// Local microphone muted
    pub is_muted: bool,
    /// Audio routed to the loudspeaker
    pub is_on_speaker: bool,
    /// Provider-reported error, [`CallError::None`] when healthy
    pub error: CallError,
}

impl CallState {
    /// Idle outgoing state for the given party
    pub fn new(caller_name: impl Into<String>, caller_handle: impl Into<String>) -> Self {
        Self {
            caller_name: caller_name.into(),
            caller_handle: caller_handle.into(),
            ..Default::default()
        }
    }

    /// Copy with a different status
    pub fn with_status(mut self, status: CallStatus) -> Self {
        self.status = status;
        self
    }

    /// Copy with a different direction
    pub fn with_direction(mut self, direction: CallDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Copy marked connected since `at`
    pub fn connected_at(mut self, at: Instant) -> Self {
        self.status = CallStatus::Connected;
        self.connect_timestamp = Some(at);
        self
    }

    /// Copy carrying an error
    pub fn with_error(mut self, error: CallError) -> Self {
        self.error = error;
        self
    }

    /// Copy with the mute flag set
    pub fn with_muted(mut self, muted: bool) -> Self {
        self.is_muted = muted;
        self
    }

    /// Copy with the speaker flag set
    pub fn with_speaker(mut self, on_speaker: bool) -> Self {
        self.is_on_speaker = on_speaker;
        self
    }

    /// Shorthand for `self.status.is_terminal()`
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Time connected as of `now`, only while the call is connected
    pub fn elapsed(&self, now: Instant) -> Option<Duration> {
        match (self.status, self.connect_timestamp) {
            (CallStatus::Connected, Some(since)) => Some(now.saturating_duration_since(since)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        let terminal: Vec<_> = CallStatus::ALL.iter().filter(|s| s.is_terminal()).collect();
        assert_eq!(terminal, vec![&CallStatus::Disconnecting, &CallStatus::Disconnected]);
    }

    #[test]
    fn test_display_text() {
        assert_eq!(CallStatus::Ringing.display_text(), "Ringing");
        assert_eq!(CallStatus::Connected.display_text(), "Ongoing call");
        assert_eq!(CallStatus::Idle.display_text(), "");
        assert_eq!(CallStatus::Disconnected.display_text(), "");
        assert_eq!(CallStatus::Reconnecting.to_string(), "RECONNECTING");
    }

    #[test]
    fn test_defaults() {
        let state = CallState::new("Ada", "+15550100");
        assert_eq!(state.status, CallStatus::Idle);
        assert_eq!(state.direction, CallDirection::Outgoing);
        assert_eq!(state.error, CallError::None);
        assert!(state.connect_timestamp.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_only_while_connected() {
        let start = Instant::now();
        let state = CallState::new("Ada", "+15550100").connected_at(start);

        tokio::time::advance(Duration::from_secs(42)).await;
        assert_eq!(state.elapsed(Instant::now()), Some(Duration::from_secs(42)));

        let reconnecting = state.clone().with_status(CallStatus::Reconnecting);
        assert_eq!(reconnecting.elapsed(Instant::now()), None);
        assert_eq!(reconnecting.connect_timestamp, Some(start));
    }
}
