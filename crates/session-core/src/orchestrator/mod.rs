//! Call session orchestrator
//!
//! A [`SessionOrchestrator`] turns one provider's state stream into duration
//! timer lifecycle and presentation refreshes, and tears everything down
//! exactly once when the session ends.
//!
//! Each started session owns a [`SessionScope`] with two tasks in it:
//!
//! * the state consumer, which reads the provider stream in order and
//!   reacts to every snapshot (see `reaction.rs`);
//! * the duration timer, alive only while the call is connected, which
//!   re-reads the provider's current state once per tick (see `timer.rs`).
//!
//! Both tasks refresh the sink through a single refresh gate, so the sink
//! never sees overlapping refreshes. Shutdown (see `shutdown.rs`) claims the
//! session under the state lock; whichever trigger claims it first performs
//! the teardown and every later trigger is a no-op. Start and shutdown are
//! serialized by a lifecycle lock, so a new session never begins while the
//! previous one is still releasing the sink.

mod reaction;
mod shutdown;
mod timer;
pub mod types;

use std::sync::atomic::AtomicU64;
use std::sync::{Arc, Weak};

use callkeeper_call_core::CallSessionProvider;
use callkeeper_infra_common::{SessionScope, TrackedTask};
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::config::OrchestratorConfig;
use crate::errors::{Result, SessionError};
use crate::presentation::PresentationSink;

pub use types::{OrchestratorPhase, OrchestratorStats, SessionId, ShutdownTrigger, StartOutcome};

use types::Counters;

/// Observes one call session at a time and keeps its presentation current
pub struct SessionOrchestrator {
    shared: Arc<Shared>,
}

/// State shared between the orchestrator handle and its session tasks
pub(crate) struct Shared {
    sink: Arc<dyn PresentationSink>,
    config: OrchestratorConfig,
    inner: Mutex<Inner>,
    /// Held by `start` and for a whole shutdown, from claim to sink release
    lifecycle: tokio::sync::Mutex<()>,
    /// Held for the whole duration of every sink refresh
    refresh_gate: tokio::sync::Mutex<()>,
    counters: Counters,
    timer_generation: AtomicU64,
}

#[derive(Default)]
struct Inner {
    phase: OrchestratorPhase,
    session: Option<ActiveSession>,
}

struct ActiveSession {
    id: SessionId,
    scope: SessionScope,
    provider: Weak<dyn CallSessionProvider>,
    subscription: Option<TrackedTask>,
    timer: Option<TimerTask>,
}

struct TimerTask {
    scope: SessionScope,
    task: TrackedTask,
    generation: u64,
}

impl SessionOrchestrator {
    /// Create an orchestrator publishing through `sink`
    pub fn new(sink: Arc<dyn PresentationSink>, config: OrchestratorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(sink, config))
    }

    /// Create an orchestrator with the default timing
    pub fn with_defaults(sink: Arc<dyn PresentationSink>) -> Self {
        Self::build(sink, OrchestratorConfig::default())
    }

    fn build(sink: Arc<dyn PresentationSink>, config: OrchestratorConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                sink,
                config,
                inner: Mutex::new(Inner::default()),
                lifecycle: tokio::sync::Mutex::new(()),
                refresh_gate: tokio::sync::Mutex::new(()),
                counters: Counters::default(),
                timer_generation: AtomicU64::new(0),
            }),
        }
    }

    /// Begin observing `provider`
    ///
    /// Idempotent while a session is running: a second call returns
    /// [`StartOutcome::AlreadyActive`] and creates no second subscription.
    /// Without a provider any running session is shut down and
    /// [`SessionError::NotStarted`] is returned. A start issued while the
    /// previous session is still shutting down waits for that shutdown to
    /// finish.
    ///
    /// Only a weak reference to `provider` is kept. The caller must hold the
    /// provider for as long as the session should run; once the last strong
    /// reference is dropped the session ends with
    /// [`ShutdownTrigger::ProviderGone`].
    pub async fn start(
        &self,
        provider: Option<Arc<dyn CallSessionProvider>>,
    ) -> Result<StartOutcome> {
        let Some(provider) = provider else {
            warn!("No active call provider, not starting a session");
            self.shared
                .shutdown_session(None, ShutdownTrigger::External, shutdown::Caller::Host)
                .await;
            return Err(SessionError::not_started("no active call provider"));
        };

        let _lifecycle = self.shared.lifecycle.lock().await;
        let mut inner = self.shared.inner.lock();
        if let Some(session) = &inner.session {
            info!(session_id = %session.id, "Session already active, ignoring start");
            return Ok(StartOutcome::AlreadyActive(session.id));
        }

        let id = SessionId::new();
        let scope = SessionScope::new(format!("session-{}", id.short()));
        let stream = provider.subscribe();
        let shared = Arc::downgrade(&self.shared);
        let subscription = scope.spawn("state-consumer", move |token| {
            reaction::consume_states(shared, id, stream, token)
        });

        inner.session = Some(ActiveSession {
            id,
            scope,
            provider: Arc::downgrade(&provider),
            subscription: Some(subscription),
            timer: None,
        });
        inner.phase = OrchestratorPhase::Subscribed;
        Counters::bump(&self.shared.counters.sessions_started);

        info!(session_id = %id, "Call session started");
        Ok(StartOutcome::Started(id))
    }

    /// Shut the running session down
    ///
    /// Returns `false` when there was nothing to shut down, including when
    /// another trigger got there first. In that case it still returns only
    /// after the other trigger's teardown has finished.
    pub async fn shutdown(&self) -> bool {
        self.shared
            .shutdown_session(None, ShutdownTrigger::External, shutdown::Caller::Host)
            .await
    }

    /// Whether a session is running or still being torn down
    pub fn is_active(&self) -> bool {
        let inner = self.shared.inner.lock();
        inner.session.is_some() || inner.phase == OrchestratorPhase::ShuttingDown
    }

    pub fn phase(&self) -> OrchestratorPhase {
        self.shared.inner.lock().phase
    }

    /// Identity of the running session
    pub fn session_id(&self) -> Option<SessionId> {
        self.shared.inner.lock().session.as_ref().map(|s| s.id)
    }

    /// Whether the duration timer of the running session is ticking
    pub fn is_timer_running(&self) -> bool {
        self.shared
            .inner
            .lock()
            .session
            .as_ref()
            .and_then(|s| s.timer.as_ref())
            .is_some_and(|t| !t.task.is_finished())
    }

    pub fn stats(&self) -> OrchestratorStats {
        self.shared.counters.snapshot()
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.shared.config
    }
}

impl Shared {
    /// Whether `id` is still the running session
    fn is_current(&self, id: SessionId) -> bool {
        self.inner.lock().session.as_ref().is_some_and(|s| s.id == id)
    }
}

impl Drop for SessionOrchestrator {
    fn drop(&mut self) {
        self.shared.teardown();
    }
}

impl std::fmt::Debug for SessionOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.shared.inner.lock();
        f.debug_struct("SessionOrchestrator")
            .field("phase", &inner.phase)
            .field("session_id", &inner.session.as_ref().map(|s| s.id))
            .field("config", &self.shared.config)
            .finish()
    }
}
