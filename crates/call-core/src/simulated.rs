//! In-process call provider
//!
//! [`SimulatedProvider`] reacts to commands immediately by publishing the
//! snapshots a real provider would eventually report, and keeps a log of
//! every command it received. It backs the CLI demo and the test suites.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::error::{CallError, StateError};
use crate::provider::CallSessionProvider;
use crate::replay::{ReplayState, StateStream};
use crate::state::{CallDirection, CallState, CallStatus};

/// A command received by the simulated provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCommand {
    /// `start_call(handle)`
    StartCall(String),
    /// `answer_call()`
    Answer,
    /// `reject_call()`
    Reject,
    /// `end_call()`
    End,
    /// `toggle_mute(muted)`
    ToggleMute(bool),
    /// `toggle_speaker(enabled)`
    ToggleSpeaker(bool),
    /// `release()`
    Release,
}

/// Provider that drives its own state machine in memory
#[derive(Debug)]
pub struct SimulatedProvider {
    state: ReplayState,
    commands: Mutex<Vec<ProviderCommand>>,
    released: AtomicBool,
}

impl SimulatedProvider {
    /// Idle provider for an outgoing call to the given party
    pub fn new(caller_name: impl Into<String>, caller_handle: impl Into<String>) -> Self {
        Self::with_state(CallState::new(caller_name, caller_handle))
    }

    /// Provider with an incoming call already ringing
    pub fn incoming(caller_name: impl Into<String>, caller_handle: impl Into<String>) -> Self {
        Self::with_state(
            CallState::new(caller_name, caller_handle)
                .with_direction(CallDirection::Incoming)
                .with_status(CallStatus::Ringing),
        )
    }

    /// Provider starting from an arbitrary snapshot
    pub fn with_state(initial: CallState) -> Self {
        Self {
            state: ReplayState::new(initial),
            commands: Mutex::new(Vec::new()),
            released: AtomicBool::new(false),
        }
    }

    /// Publish a snapshot as-is
    pub fn publish(&self, state: CallState) -> Result<(), StateError> {
        self.ensure_live()?;
        self.state.publish(state)
    }

    /// Move to `status`, stamping the connect time on the first connection
    pub fn set_status(&self, status: CallStatus) -> Result<CallState, StateError> {
        self.update(|current| {
            let mut next = current.clone().with_status(status);
            if status == CallStatus::Connected && next.connect_timestamp.is_none() {
                next.connect_timestamp = Some(Instant::now());
            }
            next
        })
    }

    /// Attach a provider error to the current snapshot
    pub fn fail(&self, error: CallError) -> Result<CallState, StateError> {
        self.update(|current| current.clone().with_error(error))
    }

    /// Clear any error on the current snapshot
    pub fn clear_error(&self) -> Result<CallState, StateError> {
        self.fail(CallError::None)
    }

    /// Every command received so far, oldest first
    pub fn commands(&self) -> Vec<ProviderCommand> {
        self.commands.lock().clone()
    }

    /// How many received commands match `command`
    pub fn count(&self, command: &ProviderCommand) -> usize {
        self.commands.lock().iter().filter(|c| *c == command).count()
    }

    /// Whether `release()` has been called
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    /// Live subscribers of the state stream
    pub fn subscriber_count(&self) -> usize {
        self.state.subscriber_count()
    }

    fn ensure_live(&self) -> Result<(), StateError> {
        if self.is_released() {
            return Err(StateError::ProviderReleased);
        }
        Ok(())
    }

    /// Derive and publish the next snapshot unless the provider was released
    fn update<F>(&self, next: F) -> Result<CallState, StateError>
    where
        F: FnOnce(&CallState) -> CallState,
    {
        self.ensure_live()?;
        self.state.update(next)
    }

    fn record(&self, command: ProviderCommand) {
        debug!(?command, "Simulated provider received command");
        self.commands.lock().push(command);
    }

    fn walk(&self, steps: &[CallStatus]) {
        for status in steps {
            if let Err(e) = self.set_status(*status) {
                debug!(%status, error = %e, "Simulated provider ignored transition");
                return;
            }
        }
    }
}

impl CallSessionProvider for SimulatedProvider {
    fn subscribe(&self) -> StateStream {
        self.state.subscribe()
    }

    fn current_state(&self) -> CallState {
        self.state.current()
    }

    fn start_call(&self, handle: &str) {
        self.record(ProviderCommand::StartCall(handle.to_string()));
        let handle = handle.to_string();
        let placed = self.update(move |current| {
            let mut next = current
                .clone()
                .with_direction(CallDirection::Outgoing)
                .with_status(CallStatus::Initiating);
            next.caller_handle = handle;
            next
        });
        match placed {
            Ok(_) => self.walk(&[CallStatus::Ringing]),
            Err(e) => debug!(error = %e, "Simulated provider could not place call"),
        }
    }

    fn answer_call(&self) {
        self.record(ProviderCommand::Answer);
        if self.state.current().status == CallStatus::Ringing {
            self.walk(&[CallStatus::Connecting, CallStatus::Connected]);
        }
    }

    fn reject_call(&self) {
        self.record(ProviderCommand::Reject);
        if !self.state.current().is_terminal() {
            self.walk(&[CallStatus::Disconnected]);
        }
    }

    fn end_call(&self) {
        self.record(ProviderCommand::End);
        if !self.state.current().is_terminal() {
            self.walk(&[CallStatus::Disconnecting, CallStatus::Disconnected]);
        }
    }

    fn toggle_mute(&self, muted: bool) {
        self.record(ProviderCommand::ToggleMute(muted));
        if let Err(e) = self.update(|s| s.clone().with_muted(muted)) {
            debug!(error = %e, "Simulated provider ignored mute toggle");
        }
    }

    fn toggle_speaker(&self, enabled: bool) {
        self.record(ProviderCommand::ToggleSpeaker(enabled));
        if let Err(e) = self.update(|s| s.clone().with_speaker(enabled)) {
            debug!(error = %e, "Simulated provider ignored speaker toggle");
        }
    }

    fn release(&self) {
        self.record(ProviderCommand::Release);
        self.released.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn drain(stream: &mut StateStream, n: usize) -> Vec<CallStatus> {
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            out.push(stream.recv().await.unwrap().status);
        }
        out
    }

    #[tokio::test]
    async fn test_outgoing_call_flow() {
        let provider = SimulatedProvider::new("Ada", "");
        let mut stream = provider.subscribe();

        provider.start_call("+15550100");
        provider.set_status(CallStatus::Connected).unwrap();
        provider.end_call();

        assert_eq!(
            drain(&mut stream, 6).await,
            vec![
                CallStatus::Idle,
                CallStatus::Initiating,
                CallStatus::Ringing,
                CallStatus::Connected,
                CallStatus::Disconnecting,
                CallStatus::Disconnected,
            ]
        );
        assert_eq!(provider.current_state().caller_handle, "+15550100");
        assert_eq!(
            provider.commands(),
            vec![ProviderCommand::StartCall("+15550100".to_string()), ProviderCommand::End]
        );
    }

    #[tokio::test]
    async fn test_answer_stamps_connect_time_once() {
        let provider = SimulatedProvider::incoming("Grace", "+15550199");
        provider.answer_call();

        let connected = provider.current_state();
        assert_eq!(connected.status, CallStatus::Connected);
        let stamped = connected.connect_timestamp.unwrap();

        provider.set_status(CallStatus::Reconnecting).unwrap();
        let again = provider.set_status(CallStatus::Connected).unwrap();
        assert_eq!(again.connect_timestamp, Some(stamped));
    }

    #[tokio::test]
    async fn test_answer_ignored_unless_ringing() {
        let provider = SimulatedProvider::new("Ada", "+15550100");
        provider.answer_call();
        assert_eq!(provider.current_state().status, CallStatus::Idle);
        assert_eq!(provider.count(&ProviderCommand::Answer), 1);
    }

    #[tokio::test]
    async fn test_commands_after_hangup_do_not_revive_session() {
        let provider = SimulatedProvider::incoming("Grace", "+15550199");
        provider.reject_call();
        provider.toggle_mute(true);
        provider.start_call("+15550100");

        let state = provider.current_state();
        assert_eq!(state.status, CallStatus::Disconnected);
        assert!(!state.is_muted);
    }

    #[tokio::test]
    async fn test_toggles_and_release() {
        let provider = SimulatedProvider::incoming("Grace", "+15550199");
        provider.toggle_mute(true);
        provider.toggle_speaker(true);
        provider.release();

        let state = provider.current_state();
        assert!(state.is_muted && state.is_on_speaker);
        assert!(provider.is_released());
        assert_eq!(provider.count(&ProviderCommand::ToggleMute(true)), 1);
    }

    #[tokio::test]
    async fn test_fail_keeps_status() {
        let provider = SimulatedProvider::incoming("Grace", "+15550199");
        let failed = provider.fail(CallError::NetworkError).unwrap();
        assert_eq!(failed.status, CallStatus::Ringing);
        assert_eq!(failed.error, CallError::NetworkError);
        assert_eq!(provider.clear_error().unwrap().error, CallError::None);
    }

    #[tokio::test]
    async fn test_released_provider_rejects_updates() {
        let provider = SimulatedProvider::incoming("Grace", "+15550199");
        provider.release();

        assert_eq!(
            provider.set_status(CallStatus::Connected),
            Err(StateError::ProviderReleased)
        );
        assert_eq!(
            provider.fail(CallError::NetworkError),
            Err(StateError::ProviderReleased)
        );
        let ringing = provider.current_state();
        assert_eq!(
            provider.publish(ringing.with_muted(true)),
            Err(StateError::ProviderReleased)
        );

        provider.toggle_speaker(true);
        provider.answer_call();
        let state = provider.current_state();
        assert_eq!(state.status, CallStatus::Ringing);
        assert!(!state.is_on_speaker && !state.is_muted);
        assert_eq!(provider.count(&ProviderCommand::Answer), 1);
    }
}
