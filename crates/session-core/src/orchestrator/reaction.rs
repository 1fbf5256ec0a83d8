//! State consumer and presentation refresh

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Weak};

use callkeeper_call_core::{CallState, CallStatus, StateStream};
use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::shutdown::Caller;
use super::types::{Counters, SessionId, ShutdownTrigger};
use super::Shared;
use crate::errors::PresentationError;

/// What the consumer does after a reaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Reaction {
    Continue,
    Terminated,
}

/// Body of the state consumer task
///
/// Reads the stream strictly in order and reacts to one snapshot at a time.
/// A closed stream or a panicking reaction ends the session.
pub(super) async fn consume_states(
    shared: Weak<Shared>,
    id: SessionId,
    mut stream: StateStream,
    token: CancellationToken,
) {
    loop {
        let next = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            next = stream.recv() => next,
        };

        let Some(shared) = shared.upgrade() else {
            break;
        };

        let Some(state) = next else {
            info!(session_id = %id, "Provider state stream closed");
            shared
                .shutdown_session(Some(id), ShutdownTrigger::ProviderGone, Caller::Subscription)
                .await;
            break;
        };

        let reaction = AssertUnwindSafe(shared.react_to(id, state, &token))
            .catch_unwind()
            .await;
        match reaction {
            Ok(Reaction::Continue) => {}
            Ok(Reaction::Terminated) => break,
            Err(_) => {
                error!(session_id = %id, "State reaction panicked, shutting session down");
                shared
                    .shutdown_session(Some(id), ShutdownTrigger::TaskFailure, Caller::Subscription)
                    .await;
                break;
            }
        }
    }
    debug!(session_id = %id, "State consumer exiting");
}

impl Shared {
    /// React to one snapshot of session `id`
    pub(super) async fn react_to(
        self: &Arc<Self>,
        id: SessionId,
        state: CallState,
        token: &CancellationToken,
    ) -> Reaction {
        Counters::bump(&self.counters.reactions);
        debug!(session_id = %id, status = %state.status, "Reacting to call state");

        if state.status.is_terminal() {
            self.shutdown_session(
                Some(id),
                ShutdownTrigger::TerminalState(state.status),
                Caller::Subscription,
            )
            .await;
            return Reaction::Terminated;
        }
        if !self.is_current(id) {
            return Reaction::Terminated;
        }

        if state.status == CallStatus::Connected {
            self.start_timer(id);
        } else {
            self.stop_timer(id).await;
        }

        self.refresh(&state, token).await;
        Reaction::Continue
    }

    /// Refresh the sink, serialized with every other refresh
    ///
    /// Nothing is sent once `token` is cancelled. Failures are counted and
    /// logged only.
    pub(super) async fn refresh(&self, state: &CallState, token: &CancellationToken) {
        let _gate = tokio::select! {
            biased;
            _ = token.cancelled() => return,
            gate = self.refresh_gate.lock() => gate,
        };
        if token.is_cancelled() {
            return;
        }

        Counters::bump(&self.counters.refreshes);
        let timeout = self.config.refresh_timeout();
        let attempt = AssertUnwindSafe(self.sink.refresh(state)).catch_unwind();
        let result = match tokio::time::timeout(timeout, attempt).await {
            Ok(Ok(Ok(_))) => Ok(()),
            Ok(Ok(Err(e))) => Err(e),
            Ok(Err(_)) => Err(PresentationError::Panicked),
            Err(_) => Err(PresentationError::Timeout {
                millis: self.config.refresh_timeout_ms,
            }),
        };

        if let Err(e) = result {
            Counters::bump(&self.counters.refresh_failures);
            warn!(status = %state.status, error = %e, "Presentation refresh failed");
        }
    }
}
