//! Shared fixtures for the session-core integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use callkeeper_call_core::{CallSessionProvider, CallState, CallStatus, ReplayState, StateStream};
use callkeeper_session_core::{
    build_notification, CallNotification, NotificationConfig, NotificationSink, PresentationError,
    PresentationSink,
};
use parking_lot::Mutex;
use tokio::time::Instant;

/// One refresh as seen by the sink
#[derive(Debug, Clone)]
pub struct Refresh {
    pub status: CallStatus,
    pub elapsed: Option<Duration>,
    pub at: Instant,
}

/// How the recording sink misbehaves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailMode {
    Healthy,
    Error,
    Panic,
}

/// Sink that records every refresh and can be told to fail or stall
pub struct RecordingSink {
    refreshes: Mutex<Vec<Refresh>>,
    releases: AtomicUsize,
    mode: Mutex<FailMode>,
    delay: Mutex<Option<Duration>>,
    release_delay: Mutex<Option<Duration>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            refreshes: Mutex::new(Vec::new()),
            releases: AtomicUsize::new(0),
            mode: Mutex::new(FailMode::Healthy),
            delay: Mutex::new(None),
            release_delay: Mutex::new(None),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    pub fn set_mode(&self, mode: FailMode) {
        *self.mode.lock() = mode;
    }

    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock() = delay;
    }

    /// Stall every `release` for `delay` before it completes
    pub fn set_release_delay(&self, delay: Option<Duration>) {
        *self.release_delay.lock() = delay;
    }

    pub fn refreshes(&self) -> Vec<Refresh> {
        self.refreshes.lock().clone()
    }

    pub fn refresh_count(&self) -> usize {
        self.refreshes.lock().len()
    }

    pub fn statuses(&self) -> Vec<CallStatus> {
        self.refreshes.lock().iter().map(|r| r.status).collect()
    }

    /// Elapsed values of the refreshes made while connected
    pub fn connected_elapsed(&self) -> Vec<Duration> {
        self.refreshes
            .lock()
            .iter()
            .filter_map(|r| r.elapsed)
            .collect()
    }

    pub fn release_count(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PresentationSink for RecordingSink {
    async fn refresh(&self, state: &CallState) -> Result<CallNotification, PresentationError> {
        let now = Instant::now();
        self.refreshes.lock().push(Refresh {
            status: state.status,
            elapsed: state.elapsed(now),
            at: now,
        });

        let mode = *self.mode.lock();
        match mode {
            FailMode::Healthy => {}
            FailMode::Error => return Err(PresentationError::refresh_failed("sink unavailable")),
            FailMode::Panic => panic!("sink exploded"),
        }

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        Ok(build_notification(state, &NotificationConfig::default(), now))
    }

    async fn release(&self) -> Result<(), PresentationError> {
        let delay = *self.release_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.releases.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Notification sink whose release takes a while to land
pub struct SlowReleaseSink {
    pub notifications: NotificationSink,
    pub delay: Duration,
}

impl SlowReleaseSink {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            notifications: NotificationSink::default(),
            delay,
        })
    }

    /// Title of the notification currently posted
    pub fn posted_title(&self) -> Option<String> {
        self.notifications.current().map(|n| n.title)
    }
}

#[async_trait]
impl PresentationSink for SlowReleaseSink {
    async fn refresh(&self, state: &CallState) -> Result<CallNotification, PresentationError> {
        self.notifications.refresh(state).await
    }

    async fn release(&self) -> Result<(), PresentationError> {
        tokio::time::sleep(self.delay).await;
        self.notifications.release().await
    }
}

/// Provider whose state stream outlives the provider itself
pub struct DetachedStreamProvider {
    pub state: Arc<ReplayState>,
}

impl CallSessionProvider for DetachedStreamProvider {
    fn subscribe(&self) -> StateStream {
        self.state.subscribe()
    }

    fn current_state(&self) -> CallState {
        self.state.current()
    }

    fn start_call(&self, _handle: &str) {}
    fn answer_call(&self) {}
    fn reject_call(&self) {}
    fn end_call(&self) {}
    fn toggle_mute(&self, _muted: bool) {}
    fn toggle_speaker(&self, _enabled: bool) {}
    fn release(&self) {}
}

/// Let spawned tasks run without moving the paused clock
pub async fn settle() {
    for _ in 0..64 {
        tokio::task::yield_now().await;
    }
}

/// Yield until `condition` holds, without moving the paused clock
pub async fn eventually(what: &str, condition: impl Fn() -> bool) {
    for _ in 0..10_000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition never became true: {}", what);
}
