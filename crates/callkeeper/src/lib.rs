//! # callkeeper
//!
//! Keeps one active call session's presentation in step with its state.
//!
//! ## Overview
//!
//! - **Call Core**: call state snapshots, provider contract, replaying state
//!   stream and an in-process simulated provider
//! - **Session Core**: the orchestrator (state reactions, duration timer,
//!   presentation refresh, shutdown), the notification sink and the session
//!   host
//! - **Infra Common**: logging setup, shared errors and session-scoped tasks
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use callkeeper::prelude::*;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), SessionError> {
//! let sink = Arc::new(NotificationSink::default());
//! let host = SessionHost::new(sink.clone(), OrchestratorConfig::default())?;
//!
//! let provider = Arc::new(SimulatedProvider::incoming("Grace", "+15550199"));
//! host.start_call(provider).await?;
//! host.handle_action(CallAction::Answer);
//! host.handle_action(CallAction::HangUp);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(rust_2018_idioms)]

pub use callkeeper_call_core as call_core;
pub use callkeeper_infra_common as infra_common;
pub use callkeeper_session_core as session_core;

pub mod prelude {
    //! Common imports for callkeeper applications

    pub use crate::call_core::{
        format_duration, CallDirection, CallError, CallSessionProvider, CallState, CallStatus,
        ReplayState, SimulatedProvider, StateStream,
    };
    pub use crate::session_core::{
        CallAction, CallNotification, HostCommand, NotificationConfig, NotificationSink,
        OrchestratorConfig, PresentationError, PresentationSink, SessionConfig, SessionError,
        SessionHost, SessionOrchestrator, StartOutcome,
    };
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Crate description
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use std::sync::Arc;

    #[test]
    fn test_version_is_set() {
        assert!(!super::VERSION.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_prelude_drives_a_call() {
        let sink = Arc::new(NotificationSink::default());
        let orchestrator = SessionOrchestrator::with_defaults(sink.clone());
        let provider = Arc::new(SimulatedProvider::incoming("Grace", "+15550199"));

        orchestrator.start(Some(provider.clone())).await.unwrap();
        provider.answer_call();
        tokio::time::sleep(std::time::Duration::from_millis(2500)).await;

        let posted = sink.current().unwrap();
        assert_eq!(posted.content_text, "Ongoing call • 00:02");
        assert!(orchestrator.stats().timer_ticks >= 2);
    }
}
