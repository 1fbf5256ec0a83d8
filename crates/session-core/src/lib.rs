//! # Session core
//!
//! Orchestration of a single active call session:
//!
//! - [`SessionOrchestrator`]: consumes a provider's state stream, runs the
//!   duration timer while connected, refreshes the presentation and shuts
//!   the session down exactly once
//! - [`PresentationSink`]: where presentation updates go;
//!   [`NotificationSink`] is the ongoing-call notification implementation
//! - [`SessionHost`]: owns the active provider and the orchestrator and
//!   routes host commands and notification actions
//! - [`SessionConfig`]: TOML and environment configuration
//!
//! ```rust
//! use std::sync::Arc;
//! use callkeeper_call_core::SimulatedProvider;
//! use callkeeper_session_core::{NotificationSink, SessionHost, OrchestratorConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> callkeeper_session_core::Result<()> {
//! let sink = Arc::new(NotificationSink::default());
//! let host = SessionHost::new(sink.clone(), OrchestratorConfig::default())?;
//!
//! let provider = Arc::new(SimulatedProvider::incoming("Grace", "+15550199"));
//! let outcome = host.start_call(provider).await?;
//! assert!(outcome.is_new());
//! assert!(host.is_session_active());
//!
//! host.shutdown().await;
//! assert!(!host.is_session_active());
//! # Ok(())
//! # }
//! ```

pub mod actions;
pub mod config;
pub mod errors;
pub mod host;
pub mod orchestrator;
pub mod presentation;

pub use actions::{CallAction, HostCommand};
pub use config::{LogSettings, OrchestratorConfig, SessionConfig};
pub use errors::{PresentationError, Result, SessionError};
pub use host::{CommandOutcome, SessionHost};
pub use orchestrator::{
    OrchestratorPhase, OrchestratorStats, SessionId, SessionOrchestrator, ShutdownTrigger,
    StartOutcome,
};
pub use presentation::{
    build_notification, ActionLabels, CallNotification, NotificationAction, NotificationConfig,
    NotificationSink, PresentationSink,
};
