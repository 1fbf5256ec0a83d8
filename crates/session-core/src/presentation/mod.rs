//! Presentation of call state to the user
//!
//! The orchestrator never builds anything user-visible itself. It hands each
//! snapshot to a [`PresentationSink`], which turns it into a
//! [`CallNotification`] and publishes it however the host platform requires.
//!
//! ```text
//! ┌──────────────────────┐   refresh(&CallState)   ┌─────────────────────┐
//! │ SessionOrchestrator  │ ──────────────────────► │  PresentationSink   │
//! │  (stream + timer)    │ ◄────────────────────── │ (NotificationSink)  │
//! └──────────────────────┘     CallNotification    └─────────────────────┘
//! ```

pub mod notification;

use std::time::Duration;

use async_trait::async_trait;
use callkeeper_call_core::{CallState, CallStatus};
use serde::Serialize;

use crate::actions::CallAction;
use crate::errors::PresentationError;

pub use notification::{build_notification, ActionLabels, NotificationConfig, NotificationSink};

/// Receiver of presentation updates
///
/// The orchestrator calls `refresh` on every non-terminal state change and
/// once per timer tick while connected. Calls are serialized by the
/// orchestrator, so an implementation never sees two overlapping refreshes
/// from the same orchestrator. Both methods should return promptly; the
/// orchestrator bounds them with a timeout.
#[async_trait]
pub trait PresentationSink: Send + Sync {
    /// Build and publish the artifact for `state`
    async fn refresh(&self, state: &CallState) -> Result<CallNotification, PresentationError>;

    /// Withdraw whatever is currently published; called once per session shutdown
    async fn release(&self) -> Result<(), PresentationError> {
        Ok(())
    }
}

/// A button on the notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationAction {
    /// Button label
    pub label: String,
    /// Command sent back to the host when pressed
    pub action: CallAction,
}

/// The user-visible artifact for one call snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallNotification {
    /// Channel the notification is posted on
    pub channel: String,
    /// Remote party
    pub title: String,
    /// Status or error text, with the running duration when connected
    pub content_text: String,
    /// Status the notification was built from
    pub status: CallStatus,
    /// Time connected, for connected calls
    #[serde(serialize_with = "serialize_secs")]
    pub elapsed: Option<Duration>,
    /// Show over the lock screen (incoming ringing calls)
    pub full_screen: bool,
    /// Cannot be swiped away
    pub ongoing: bool,
    /// Buttons, in display order
    pub actions: Vec<NotificationAction>,
}

impl CallNotification {
    /// Whether the notification offers `action`
    pub fn has_action(&self, action: CallAction) -> bool {
        self.actions.iter().any(|a| a.action == action)
    }

    /// Label of the button for `action`, if present
    pub fn label_for(&self, action: CallAction) -> Option<&str> {
        self.actions
            .iter()
            .find(|a| a.action == action)
            .map(|a| a.label.as_str())
    }
}

fn serialize_secs<S>(elapsed: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match elapsed {
        Some(d) => serializer.serialize_some(&d.as_secs()),
        None => serializer.serialize_none(),
    }
}
