//! Ongoing-call notification
//!
//! [`build_notification`] is a pure function from a snapshot to a
//! [`CallNotification`]. [`NotificationSink`] wraps it as a
//! [`PresentationSink`] and posts the result into a `watch` slot the host
//! observes.

use async_trait::async_trait;
use callkeeper_call_core::{format_duration, CallDirection, CallState, CallStatus};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, trace};

use super::{CallNotification, NotificationAction, PresentationSink};
use crate::actions::CallAction;
use crate::errors::PresentationError;

/// Button labels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionLabels {
    pub mute: String,
    pub unmute: String,
    pub speaker: String,
    pub earpiece: String,
    pub answer: String,
    pub decline: String,
    pub hang_up: String,
}

impl Default for ActionLabels {
    fn default() -> Self {
        Self {
            mute: "Mute".to_string(),
            unmute: "Unmute".to_string(),
            speaker: "Speaker".to_string(),
            earpiece: "Earpiece".to_string(),
            answer: "Answer".to_string(),
            decline: "Decline".to_string(),
            hang_up: "Hang up".to_string(),
        }
    }
}

/// What the notification shows and which buttons it offers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Offer the mute toggle
    pub show_mute: bool,
    /// Offer the speaker toggle
    pub show_speaker: bool,
    /// Let incoming ringing calls take over the screen
    pub allow_full_screen: bool,
    /// Channel the notification is posted on
    pub channel_name: String,
    /// Button labels
    pub labels: ActionLabels,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            show_mute: true,
            show_speaker: true,
            allow_full_screen: true,
            channel_name: "ongoing_calls".to_string(),
            labels: ActionLabels::default(),
        }
    }
}

impl NotificationConfig {
    pub fn with_mute(mut self, show: bool) -> Self {
        self.show_mute = show;
        self
    }

    pub fn with_speaker(mut self, show: bool) -> Self {
        self.show_speaker = show;
        self
    }

    pub fn with_full_screen(mut self, allow: bool) -> Self {
        self.allow_full_screen = allow;
        self
    }

    pub fn with_channel(mut self, channel_name: impl Into<String>) -> Self {
        self.channel_name = channel_name.into();
        self
    }

    pub fn with_labels(mut self, labels: ActionLabels) -> Self {
        self.labels = labels;
        self
    }
}

/// Build the notification for `state` as of `now`
pub fn build_notification(
    state: &CallState,
    config: &NotificationConfig,
    now: Instant,
) -> CallNotification {
    let title = if !state.caller_name.trim().is_empty() {
        state.caller_name.clone()
    } else if !state.caller_handle.trim().is_empty() {
        state.caller_handle.clone()
    } else {
        "Unknown".to_string()
    };

    let elapsed = state.elapsed(now);
    let mut content_text = if state.error.is_error() {
        state.error.display_text()
    } else {
        state.status.display_text().to_string()
    };
    if let Some(elapsed) = elapsed {
        content_text.push_str(" • ");
        content_text.push_str(&format_duration(elapsed.as_secs()));
    }

    let ringing_in =
        state.status == CallStatus::Ringing && state.direction == CallDirection::Incoming;

    let labels = &config.labels;
    let mut actions = Vec::with_capacity(4);
    if config.show_mute {
        let label = if state.is_muted { &labels.unmute } else { &labels.mute };
        actions.push(action(label, CallAction::ToggleMute));
    }
    if config.show_speaker {
        let label = if state.is_on_speaker {
            &labels.earpiece
        } else {
            &labels.speaker
        };
        actions.push(action(label, CallAction::ToggleSpeaker));
    }
    if ringing_in {
        actions.push(action(&labels.answer, CallAction::Answer));
        actions.push(action(&labels.decline, CallAction::HangUp));
    } else {
        actions.push(action(&labels.hang_up, CallAction::HangUp));
    }

    CallNotification {
        channel: config.channel_name.clone(),
        title,
        content_text,
        status: state.status,
        elapsed,
        full_screen: ringing_in && config.allow_full_screen,
        ongoing: true,
        actions,
    }
}

fn action(label: &str, action: CallAction) -> NotificationAction {
    NotificationAction {
        label: label.to_string(),
        action,
    }
}

/// Presentation sink that keeps the latest notification in a `watch` slot
#[derive(Debug)]
pub struct NotificationSink {
    config: NotificationConfig,
    slot: watch::Sender<Option<CallNotification>>,
}

impl NotificationSink {
    pub fn new(config: NotificationConfig) -> Self {
        let (slot, _) = watch::channel(None);
        Self { config, slot }
    }

    /// Observe posted notifications; `None` means nothing is posted
    pub fn subscribe(&self) -> watch::Receiver<Option<CallNotification>> {
        self.slot.subscribe()
    }

    /// The notification currently posted
    pub fn current(&self) -> Option<CallNotification> {
        self.slot.borrow().clone()
    }

    pub fn config(&self) -> &NotificationConfig {
        &self.config
    }
}

impl Default for NotificationSink {
    fn default() -> Self {
        Self::new(NotificationConfig::default())
    }
}

#[async_trait]
impl PresentationSink for NotificationSink {
    async fn refresh(&self, state: &CallState) -> Result<CallNotification, PresentationError> {
        let notification = build_notification(state, &self.config, Instant::now());
        trace!(status = %notification.status, text = %notification.content_text, "Posting notification");
        self.slot.send_replace(Some(notification.clone()));
        Ok(notification)
    }

    async fn release(&self) -> Result<(), PresentationError> {
        debug!("Withdrawing call notification");
        self.slot.send_replace(None);
        Ok(())
    }
}
