//! Host wrapper around the orchestrator
//!
//! [`SessionHost`] is what a service, CLI or UI talks to. It owns the active
//! provider and the orchestrator explicitly, forwards host commands and
//! notification button presses to the provider, and keeps the orchestrator
//! observing whichever provider is active.

use std::sync::Arc;

use callkeeper_call_core::CallSessionProvider;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::actions::{CallAction, HostCommand};
use crate::config::OrchestratorConfig;
use crate::errors::{Result, SessionError};
use crate::orchestrator::{SessionOrchestrator, StartOutcome};
use crate::presentation::PresentationSink;

/// Result of a handled [`HostCommand`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// `Activate` reached the orchestrator
    Session(StartOutcome),
    /// The command was forwarded to the provider
    Forwarded,
}

/// Owner of the active provider and its orchestrator
pub struct SessionHost {
    orchestrator: SessionOrchestrator,
    provider: RwLock<Option<Arc<dyn CallSessionProvider>>>,
}

impl SessionHost {
    pub fn new(sink: Arc<dyn PresentationSink>, config: OrchestratorConfig) -> Result<Self> {
        Ok(Self::with_orchestrator(SessionOrchestrator::new(sink, config)?))
    }

    pub fn with_orchestrator(orchestrator: SessionOrchestrator) -> Self {
        Self {
            orchestrator,
            provider: RwLock::new(None),
        }
    }

    /// Make `provider` the active one and start observing it
    pub async fn start_call(&self, provider: Arc<dyn CallSessionProvider>) -> Result<StartOutcome> {
        *self.provider.write() = Some(provider);
        match self.handle_command(HostCommand::Activate).await? {
            CommandOutcome::Session(outcome) => Ok(outcome),
            CommandOutcome::Forwarded => Err(SessionError::not_started("activation was not handled")),
        }
    }

    /// Handle a command addressed to the host
    ///
    /// Without an active provider any running session is shut down and
    /// [`SessionError::NotStarted`] is returned.
    pub async fn handle_command(&self, command: HostCommand) -> Result<CommandOutcome> {
        let Some(provider) = self.active_provider() else {
            info!(?command, "No active call provider, shutting down");
            self.orchestrator.shutdown().await;
            return Err(SessionError::not_started("no active call provider"));
        };

        match command {
            HostCommand::Activate => {
                let outcome = self.orchestrator.start(Some(provider)).await?;
                Ok(CommandOutcome::Session(outcome))
            }
            HostCommand::Answer => {
                provider.answer_call();
                Ok(CommandOutcome::Forwarded)
            }
            HostCommand::HangUp => {
                self.end_call();
                Ok(CommandOutcome::Forwarded)
            }
        }
    }

    /// Handle a notification button press
    ///
    /// Ignored without an active provider. Returns whether the action was
    /// forwarded.
    pub fn handle_action(&self, action: CallAction) -> bool {
        let Some(provider) = self.active_provider() else {
            debug!(%action, "No active call provider, ignoring action");
            return false;
        };

        debug!(%action, "Forwarding call action");
        match action {
            CallAction::Answer => provider.answer_call(),
            CallAction::HangUp => {
                self.end_call();
            }
            CallAction::ToggleMute => {
                let muted = provider.current_state().is_muted;
                provider.toggle_mute(!muted);
            }
            CallAction::ToggleSpeaker => {
                let on_speaker = provider.current_state().is_on_speaker;
                provider.toggle_speaker(!on_speaker);
            }
        }
        true
    }

    /// Hang up and give up the active provider
    ///
    /// Returns `false` when there was no active provider.
    pub fn end_call(&self) -> bool {
        let Some(provider) = self.provider.write().take() else {
            return false;
        };
        info!("Ending call");
        provider.end_call();
        provider.release();
        true
    }

    pub fn active_provider(&self) -> Option<Arc<dyn CallSessionProvider>> {
        self.provider.read().clone()
    }

    pub fn is_session_active(&self) -> bool {
        self.orchestrator.is_active()
    }

    /// Shut the running session down, keeping the provider
    pub async fn shutdown(&self) -> bool {
        self.orchestrator.shutdown().await
    }

    pub fn orchestrator(&self) -> &SessionOrchestrator {
        &self.orchestrator
    }
}

impl std::fmt::Debug for SessionHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHost")
            .field("orchestrator", &self.orchestrator)
            .field("has_provider", &self.provider.read().is_some())
            .finish()
    }
}
