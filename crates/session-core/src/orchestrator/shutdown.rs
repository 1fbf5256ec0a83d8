//! Session shutdown
//!
//! The session is claimed by taking it out of the shared state under the
//! lock. Only the trigger that took it performs the teardown. The whole
//! claim-to-release sequence runs under the lifecycle lock, so `start` and
//! later triggers wait for the teardown instead of overtaking it.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use callkeeper_infra_common::ErrorExt;
use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::types::{Counters, OrchestratorPhase, SessionId, ShutdownTrigger};
use super::{ActiveSession, Shared};
use crate::errors::PresentationError;
use crate::presentation::PresentationSink;

/// Who is running the shutdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Caller {
    /// The host, through the orchestrator handle
    Host,
    /// The session's own state consumer, which must not wait for itself
    Subscription,
}

impl Shared {
    /// Claim and tear down the running session
    ///
    /// With `expected` set, only that session may be shut down, so a
    /// consumer lagging behind a restart never ends its successor. Returns
    /// whether this call performed the teardown.
    pub(super) async fn shutdown_session(
        &self,
        expected: Option<SessionId>,
        trigger: ShutdownTrigger,
        caller: Caller,
    ) -> bool {
        let _lifecycle = match caller {
            Caller::Host => self.lifecycle.lock().await,
            Caller::Subscription => {
                // The host may hold the lock while it waits for this very
                // task, so the wait gives way to the session's cancellation.
                let Some(token) = self.session_token(expected) else {
                    debug!(%trigger, "Shutdown requested with no matching session");
                    return false;
                };
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        debug!(%trigger, "Session already being shut down");
                        return false;
                    }
                    guard = self.lifecycle.lock() => guard,
                }
            }
        };

        let Some(mut session) = self.claim(expected) else {
            debug!(%trigger, "Shutdown requested with no matching session");
            return false;
        };
        let id = session.id;
        info!(session_id = %id, %trigger, "Shutting down call session");

        session.scope.cancel();
        let wait = self.config.shutdown_timeout();

        if let Some(timer) = session.timer.take() {
            Counters::bump(&self.counters.timer_stops);
            let joined = timer.task.join(wait).await;
            if let Err(e) = joined.with_context("orchestrator", "shutdown duration timer") {
                warn!(session_id = %id, error = %e, "Duration timer ended abnormally");
            }
        }

        if let Some(subscription) = session.subscription.take() {
            match caller {
                Caller::Subscription => subscription.detach(),
                Caller::Host => {
                    let joined = subscription.join(wait).await;
                    if let Err(e) = joined.with_context("orchestrator", "shutdown state consumer") {
                        warn!(session_id = %id, error = %e, "State consumer ended abnormally");
                    }
                }
            }
        }

        release_sink(&self.sink, self.config.refresh_timeout()).await;
        self.inner.lock().phase = OrchestratorPhase::Shutdown;
        Counters::bump(&self.counters.shutdowns);
        info!(session_id = %id, %trigger, "Call session shut down");
        true
    }

    /// Synchronous teardown for when the orchestrator is dropped
    ///
    /// Cancels and aborts without waiting. The sink is released on the
    /// current runtime when there is one.
    pub(super) fn teardown(&self) {
        let Some(session) = self.claim(None) else {
            return;
        };
        self.inner.lock().phase = OrchestratorPhase::Shutdown;
        info!(session_id = %session.id, trigger = %ShutdownTrigger::Teardown, "Tearing down call session");

        session.scope.cancel();
        if let Some(timer) = &session.timer {
            timer.task.abort();
            Counters::bump(&self.counters.timer_stops);
        }
        if let Some(subscription) = &session.subscription {
            subscription.abort();
        }
        Counters::bump(&self.counters.shutdowns);

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let sink = Arc::clone(&self.sink);
                let timeout = self.config.refresh_timeout();
                runtime.spawn(async move { release_sink(&sink, timeout).await });
            }
            Err(_) => {
                warn!(session_id = %session.id, "No runtime available, presentation not released");
            }
        }
    }

    /// Cancellation token of the session matching `expected`
    fn session_token(&self, expected: Option<SessionId>) -> Option<CancellationToken> {
        let inner = self.inner.lock();
        inner
            .session
            .as_ref()
            .filter(|s| expected.map_or(true, |id| id == s.id))
            .map(|s| s.scope.token())
    }

    /// Take the session out of the shared state
    fn claim(&self, expected: Option<SessionId>) -> Option<ActiveSession> {
        let mut inner = self.inner.lock();
        let matches = inner
            .session
            .as_ref()
            .is_some_and(|s| expected.map_or(true, |id| id == s.id));
        if !matches {
            return None;
        }
        inner.phase = OrchestratorPhase::ShuttingDown;
        inner.session.take()
    }
}

async fn release_sink(sink: &Arc<dyn PresentationSink>, timeout: Duration) {
    let attempt = AssertUnwindSafe(sink.release()).catch_unwind();
    let result = match tokio::time::timeout(timeout, attempt).await {
        Ok(Ok(result)) => result,
        Ok(Err(_)) => Err(PresentationError::Panicked),
        Err(_) => Err(PresentationError::Timeout {
            millis: timeout.as_millis() as u64,
        }),
    };
    match result {
        Ok(()) => debug!("Presentation released"),
        Err(e) => warn!(error = %e, "Presentation release failed"),
    }
}
