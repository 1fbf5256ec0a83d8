//! Duration timer
//!
//! Runs only while the call is connected. Every tick re-reads the provider's
//! current snapshot, so the refreshed duration always derives from the live
//! connect timestamp rather than the snapshot that started the timer.

use std::sync::atomic::Ordering;
use std::sync::{Arc, Weak};
use std::time::Duration;

use callkeeper_call_core::{CallSessionProvider, CallStatus};
use callkeeper_infra_common::ErrorExt;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::types::{Counters, SessionId};
use super::{Shared, TimerTask};

impl Shared {
    /// Start the timer of session `id` unless it is already ticking
    pub(super) fn start_timer(self: &Arc<Self>, id: SessionId) {
        let mut inner = self.inner.lock();
        let Some(session) = inner.session.as_mut().filter(|s| s.id == id) else {
            return;
        };
        if session.timer.as_ref().is_some_and(|t| !t.task.is_finished()) {
            return;
        }

        let generation = self.timer_generation.fetch_add(1, Ordering::Relaxed) + 1;
        let scope = session.scope.child(format!("timer-{}", generation));
        let shared = Arc::downgrade(self);
        let provider = session.provider.clone();
        let period = self.config.tick_interval();
        let task = scope.spawn("duration-timer", move |token| {
            run_timer(shared, provider, id, generation, period, token)
        });

        session.timer = Some(TimerTask {
            scope,
            task,
            generation,
        });
        Counters::bump(&self.counters.timer_starts);
        info!(session_id = %id, generation, "Duration timer started");
    }

    /// Stop the timer of session `id`; a no-op when none is running
    ///
    /// Returns once the timer task has exited, so no tick refresh can follow.
    pub(super) async fn stop_timer(&self, id: SessionId) {
        let timer = {
            let mut inner = self.inner.lock();
            inner
                .session
                .as_mut()
                .filter(|s| s.id == id)
                .and_then(|s| s.timer.take())
        };
        let Some(timer) = timer else {
            return;
        };

        timer.scope.cancel();
        Counters::bump(&self.counters.timer_stops);
        info!(session_id = %id, generation = timer.generation, "Duration timer stopped");
        let joined = timer.task.join(self.config.shutdown_timeout()).await;
        if let Err(e) = joined.with_context("orchestrator", "stop duration timer") {
            warn!(session_id = %id, error = %e, "Duration timer ended abnormally");
        }
    }

    /// Clear the handle of a timer that ended on its own
    fn timer_stopped_itself(&self, id: SessionId, generation: u64) {
        let mut inner = self.inner.lock();
        let Some(session) = inner.session.as_mut().filter(|s| s.id == id) else {
            return;
        };
        if session.timer.as_ref().is_some_and(|t| t.generation == generation) {
            session.timer = None;
            Counters::bump(&self.counters.timer_stops);
        }
    }
}

async fn run_timer(
    shared: Weak<Shared>,
    provider: Weak<dyn CallSessionProvider>,
    id: SessionId,
    generation: u64,
    period: Duration,
    token: CancellationToken,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let Some(shared) = shared.upgrade() else {
            break;
        };
        let Some(provider) = provider.upgrade() else {
            info!(session_id = %id, "Provider released, duration timer stopping itself");
            shared.timer_stopped_itself(id, generation);
            break;
        };
        let state = provider.current_state();
        drop(provider);

        if state.status != CallStatus::Connected {
            trace!(session_id = %id, status = %state.status, "Skipping tick, call not connected");
            continue;
        }

        Counters::bump(&shared.counters.timer_ticks);
        trace!(
            session_id = %id,
            elapsed = ?state.elapsed(Instant::now()),
            "Duration tick"
        );
        shared.refresh(&state, &token).await;
    }
    debug!(session_id = %id, generation, "Duration timer exiting");
}
