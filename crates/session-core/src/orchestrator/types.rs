//! Identifiers, outcomes and counters of the orchestrator

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use callkeeper_call_core::CallStatus;
use serde::Serialize;
use uuid::Uuid;

/// Identity of one started session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// First eight hex digits, for task and scope names
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Orchestrator lifecycle, independent of the call status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum OrchestratorPhase {
    /// Never started
    #[default]
    Unstarted,
    /// Consuming a provider's state stream
    Subscribed,
    /// A shutdown claimed the session and is still tearing it down
    ShuttingDown,
    /// The last session was shut down; `start` may begin a new one
    Shutdown,
}

impl fmt::Display for OrchestratorPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrchestratorPhase::Unstarted => f.write_str("unstarted"),
            OrchestratorPhase::Subscribed => f.write_str("subscribed"),
            OrchestratorPhase::ShuttingDown => f.write_str("shutting down"),
            OrchestratorPhase::Shutdown => f.write_str("shutdown"),
        }
    }
}

/// What caused a session to shut down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownTrigger {
    /// The provider reported a terminal status
    TerminalState(CallStatus),
    /// The host asked for it
    External,
    /// The provider went away while the session was running
    ProviderGone,
    /// A session task failed unexpectedly
    TaskFailure,
    /// The orchestrator itself was dropped
    Teardown,
}

impl fmt::Display for ShutdownTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownTrigger::TerminalState(status) => write!(f, "terminal state {}", status),
            ShutdownTrigger::External => f.write_str("external request"),
            ShutdownTrigger::ProviderGone => f.write_str("provider gone"),
            ShutdownTrigger::TaskFailure => f.write_str("task failure"),
            ShutdownTrigger::Teardown => f.write_str("teardown"),
        }
    }
}

/// Result of a successful `start`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new session began
    Started(SessionId),
    /// A session was already running; nothing changed
    AlreadyActive(SessionId),
}

impl StartOutcome {
    pub fn session_id(&self) -> SessionId {
        match self {
            StartOutcome::Started(id) | StartOutcome::AlreadyActive(id) => *id,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, StartOutcome::Started(_))
    }
}

/// Counters accumulated over the orchestrator's lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OrchestratorStats {
    pub sessions_started: u64,
    pub reactions: u64,
    pub timer_starts: u64,
    pub timer_stops: u64,
    pub timer_ticks: u64,
    pub refreshes: u64,
    pub refresh_failures: u64,
    pub shutdowns: u64,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub sessions_started: AtomicU64,
    pub reactions: AtomicU64,
    pub timer_starts: AtomicU64,
    pub timer_stops: AtomicU64,
    pub timer_ticks: AtomicU64,
    pub refreshes: AtomicU64,
    pub refresh_failures: AtomicU64,
    pub shutdowns: AtomicU64,
}

impl Counters {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> OrchestratorStats {
        OrchestratorStats {
            sessions_started: self.sessions_started.load(Ordering::Relaxed),
            reactions: self.reactions.load(Ordering::Relaxed),
            timer_starts: self.timer_starts.load(Ordering::Relaxed),
            timer_stops: self.timer_stops.load(Ordering::Relaxed),
            timer_ticks: self.timer_ticks.load(Ordering::Relaxed),
            refreshes: self.refreshes.load(Ordering::Relaxed),
            refresh_failures: self.refresh_failures.load(Ordering::Relaxed),
            shutdowns: self.shutdowns.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_ids_are_unique() {
        let a = SessionId::new();
        let b = SessionId::new();
        assert_ne!(a, b);
        assert_eq!(a.short().len(), 8);
        assert!(a.to_string().starts_with(&a.short()));
    }

    #[test]
    fn test_start_outcome() {
        let id = SessionId::new();
        assert!(StartOutcome::Started(id).is_new());
        assert!(!StartOutcome::AlreadyActive(id).is_new());
        assert_eq!(StartOutcome::AlreadyActive(id).session_id(), id);
    }

    #[test]
    fn test_trigger_display() {
        let trigger = ShutdownTrigger::TerminalState(CallStatus::Disconnected);
        assert_eq!(trigger.to_string(), "terminal state DISCONNECTED");
        assert_eq!(ShutdownTrigger::ProviderGone.to_string(), "provider gone");
    }
}
