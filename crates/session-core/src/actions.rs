//! Commands a host can forward into a running call session

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::SessionError;

/// A button on the call notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallAction {
    /// Accept the ringing incoming call
    Answer,
    /// End the call, or decline it while ringing
    HangUp,
    /// Flip the microphone mute flag
    ToggleMute,
    /// Flip between loudspeaker and earpiece
    ToggleSpeaker,
}

impl fmt::Display for CallAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CallAction::Answer => "answer",
            CallAction::HangUp => "hang_up",
            CallAction::ToggleMute => "toggle_mute",
            CallAction::ToggleSpeaker => "toggle_speaker",
        };
        f.write_str(name)
    }
}

impl FromStr for CallAction {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "answer" => Ok(CallAction::Answer),
            "hang_up" | "hangup" | "decline" => Ok(CallAction::HangUp),
            "toggle_mute" | "mute" => Ok(CallAction::ToggleMute),
            "toggle_speaker" | "speaker" => Ok(CallAction::ToggleSpeaker),
            other => Err(SessionError::config(format!("unknown call action: {}", other))),
        }
    }
}

/// Request delivered to the host that runs the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCommand {
    /// Begin observing the active provider
    Activate,
    /// Answer through the active provider
    Answer,
    /// Hang up through the active provider
    HangUp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_actions() {
        assert_eq!("answer".parse::<CallAction>().unwrap(), CallAction::Answer);
        assert_eq!("Hang-Up".parse::<CallAction>().unwrap(), CallAction::HangUp);
        assert_eq!("mute".parse::<CallAction>().unwrap(), CallAction::ToggleMute);
        assert!("dance".parse::<CallAction>().is_err());
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for action in [
            CallAction::Answer,
            CallAction::HangUp,
            CallAction::ToggleMute,
            CallAction::ToggleSpeaker,
        ] {
            assert_eq!(action.to_string().parse::<CallAction>().unwrap(), action);
        }
    }
}
