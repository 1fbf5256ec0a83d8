//! Session-scoped task tracking with cooperative cancellation
//!
//! A [`SessionScope`] owns one cancellation token. Every task spawned through
//! the scope receives a clone of that token and is expected to observe it at
//! its own suspension points, so a task is never dropped halfway through a
//! unit of work. Child scopes get child tokens: cancelling the parent cancels
//! the children, cancelling a child leaves the parent running.

use std::future::Future;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::errors::types::{Error, Result};

/// Cancellation scope for the tasks of one session
#[derive(Debug, Clone)]
pub struct SessionScope {
    name: String,
    token: CancellationToken,
}

impl SessionScope {
    /// Create a new root scope
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            token: CancellationToken::new(),
        }
    }

    /// Create a child scope, cancelled together with this one
    pub fn child(&self, name: impl Into<String>) -> Self {
        Self {
            name: format!("{}/{}", self.name, name.into()),
            token: self.token.child_token(),
        }
    }

    /// Scope name used in log lines
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Clone of the scope's token
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Request cancellation of every task in this scope and its children
    pub fn cancel(&self) {
        if !self.token.is_cancelled() {
            debug!("Cancelling scope {}", self.name);
        }
        self.token.cancel();
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Spawn a task that observes this scope's token
    ///
    /// The closure receives the token; the task decides where it checks it.
    pub fn spawn<F, Fut>(&self, task_name: impl Into<String>, task: F) -> TrackedTask
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let task_name = task_name.into();
        let full_name = format!("{}:{}", self.name, task_name);
        let future = task(self.token.clone());

        let log_name = full_name.clone();
        let handle = tokio::spawn(async move {
            debug!("Task started: {}", log_name);
            future.await;
            debug!("Task finished: {}", log_name);
        });

        TrackedTask {
            name: full_name,
            handle,
            started_at: Instant::now(),
        }
    }
}

/// Handle to a task spawned through a [`SessionScope`]
#[derive(Debug)]
pub struct TrackedTask {
    name: String,
    handle: JoinHandle<()>,
    started_at: Instant,
}

impl TrackedTask {
    /// Task name, prefixed with its scope
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check if the task has finished
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Time since the task was spawned
    pub fn runtime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Abort the task at its next suspension point
    pub fn abort(&self) {
        self.handle.abort();
    }

    /// Wait for the task to finish, aborting it after `timeout`
    ///
    /// A task that was aborted counts as a clean exit. A panic inside the
    /// task is reported as [`Error::Task`].
    pub async fn join(mut self, timeout: Duration) -> Result<()> {
        match tokio::time::timeout(timeout, &mut self.handle).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) if e.is_cancelled() => Ok(()),
            Ok(Err(e)) => Err(Error::task(format!("task {} failed: {}", self.name, e))),
            Err(_) => {
                warn!(
                    "Task {} did not stop within {:?}, aborting",
                    self.name, timeout
                );
                self.handle.abort();
                Ok(())
            }
        }
    }

    /// Let the task run to completion on its own
    ///
    /// Used when the task itself is the one tearing its scope down and
    /// therefore cannot wait for its own completion.
    pub fn detach(self) {
        debug!("Detaching task {}", self.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_cancel_stops_cooperative_task() {
        let scope = SessionScope::new("session");
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();

        let task = scope.spawn("ticker", move |token| async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(Duration::from_millis(5)) => {
                        counter.fetch_add(1, Ordering::SeqCst);
                    }
                }
            }
        });

        tokio::time::sleep(Duration::from_millis(30)).await;
        scope.cancel();
        task.join(Duration::from_secs(1)).await.unwrap();

        let seen = ticks.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), seen);
        assert!(scope.is_cancelled());
    }

    #[tokio::test]
    async fn test_child_scope_follows_parent() {
        let parent = SessionScope::new("session");
        let child = parent.child("timer");
        assert_eq!(child.name(), "session/timer");

        child.cancel();
        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());

        let second = parent.child("timer");
        parent.cancel();
        assert!(second.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_join_aborts_after_timeout() {
        let scope = SessionScope::new("session");
        let task = scope.spawn("stubborn", |_token| async move {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        });

        let result = task.join(Duration::from_millis(50)).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_join_reports_panic() {
        let scope = SessionScope::new("session");
        let task = scope.spawn("faulty", |_token| async move {
            panic!("boom");
        });

        let result = task.join(Duration::from_secs(1)).await;
        assert!(matches!(result, Err(Error::Task(_))));
    }
}
