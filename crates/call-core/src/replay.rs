//! Replaying state stream
//!
//! [`ReplayState`] keeps the latest [`CallState`] and fans every published
//! snapshot out to all subscribers over a `tokio::sync::broadcast` channel.
//! A new subscriber first receives the latest value, then every later
//! publish in order. Snapshotting and subscribing happen under the same lock
//! as publishing, so a subscriber never misses or duplicates the value
//! current at subscription time.
//!
//! A subscriber that falls more than the channel capacity behind skips the
//! overwritten snapshots. Order is kept; only stale intermediates are lost.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tracing::warn;

use crate::error::StateError;
use crate::state::{CallState, CallStatus};

/// Latest-value cache plus ordered fan-out of call state snapshots
#[derive(Debug)]
pub struct ReplayState {
    latest: Mutex<CallState>,
    sender: broadcast::Sender<CallState>,
}

impl ReplayState {
    /// Default number of snapshots buffered per subscriber
    pub const DEFAULT_CAPACITY: usize = 64;

    /// Create a stream whose current value is `initial`
    pub fn new(initial: CallState) -> Self {
        Self::with_capacity(initial, Self::DEFAULT_CAPACITY)
    }

    /// Create a stream buffering `capacity` snapshots per subscriber
    pub fn with_capacity(initial: CallState, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            latest: Mutex::new(initial),
            sender,
        }
    }

    /// The latest published snapshot
    pub fn current(&self) -> CallState {
        self.latest.lock().clone()
    }

    /// Subscribe, starting with the latest snapshot
    pub fn subscribe(&self) -> StateStream {
        let latest = self.latest.lock();
        let receiver = self.sender.subscribe();
        StateStream::new(latest.clone(), receiver)
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Publish a new snapshot
    ///
    /// Rejected when it would break a session invariant: nothing but another
    /// terminal status may follow a terminal one, and a connected snapshot
    /// must carry a connect timestamp that never moves backwards.
    pub fn publish(&self, state: CallState) -> Result<(), StateError> {
        let mut latest = self.latest.lock();
        Self::check_transition(&latest, &state)?;
        *latest = state.clone();
        // No subscribers is fine; the value is still cached for replay.
        let _ = self.sender.send(state);
        Ok(())
    }

    /// Derive the next snapshot from the current one and publish it atomically
    pub fn update<F>(&self, f: F) -> Result<CallState, StateError>
    where
        F: FnOnce(&CallState) -> CallState,
    {
        let mut latest = self.latest.lock();
        let next = f(&latest);
        Self::check_transition(&latest, &next)?;
        *latest = next.clone();
        let _ = self.sender.send(next.clone());
        Ok(next)
    }

    fn check_transition(previous: &CallState, next: &CallState) -> Result<(), StateError> {
        if previous.status.is_terminal() && !next.status.is_terminal() {
            return Err(StateError::SessionTerminated {
                attempted: next.status,
            });
        }
        if next.status == CallStatus::Connected {
            let Some(connected_at) = next.connect_timestamp else {
                return Err(StateError::MissingConnectTimestamp);
            };
            if let Some(earlier) = previous.connect_timestamp {
                if connected_at < earlier {
                    return Err(StateError::TimestampRegressed);
                }
            }
        }
        Ok(())
    }
}

/// One subscriber's view of a [`ReplayState`]
///
/// Yields the snapshot current at subscription time, then every later
/// publish. Ends when the owning [`ReplayState`] is dropped.
pub struct StateStream {
    replay: Option<CallState>,
    inner: BroadcastStream<CallState>,
}

impl StateStream {
    fn new(current: CallState, receiver: broadcast::Receiver<CallState>) -> Self {
        Self {
            replay: Some(current),
            inner: BroadcastStream::new(receiver),
        }
    }

    /// Wait for the next snapshot; `None` once the provider is gone
    pub async fn recv(&mut self) -> Option<CallState> {
        self.next().await
    }
}

impl Stream for StateStream {
    type Item = CallState;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if let Some(state) = this.replay.take() {
            return Poll::Ready(Some(state));
        }
        loop {
            match Pin::new(&mut this.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(state))) => return Poll::Ready(Some(state)),
                Poll::Ready(Some(Err(BroadcastStreamRecvError::Lagged(skipped)))) => {
                    warn!(skipped, "State subscriber lagged behind, skipping stale snapshots");
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

impl std::fmt::Debug for StateStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateStream")
            .field("replay_pending", &self.replay.is_some())
            .finish()
    }
}
