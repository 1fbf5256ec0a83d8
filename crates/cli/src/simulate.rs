//! Scripted call against the simulated provider

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use callkeeper_call_core::{CallError, CallSessionProvider, CallStatus, SimulatedProvider};
use callkeeper_session_core::{
    CallAction, CallNotification, NotificationSink, SessionConfig, SessionHost,
};
use clap::{Args, ValueEnum};
use tokio::time::sleep;
use tracing::{debug, info, warn};

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Who places the call
    #[arg(long, value_enum, default_value_t = Direction::Incoming)]
    pub direction: Direction,

    /// Display name of the remote party
    #[arg(long, default_value = "Ada Lovelace")]
    pub caller: String,

    /// Number of the remote party
    #[arg(long, default_value = "+15550100")]
    pub handle: String,

    /// Seconds the call rings before it is answered
    #[arg(long, default_value_t = 2)]
    pub ring_secs: u64,

    /// Seconds the call stays connected
    #[arg(long, default_value_t = 5)]
    pub talk_secs: u64,

    /// Drop and restore media halfway through the call
    #[arg(long)]
    pub reconnect: bool,

    /// Report a provider error once connected
    #[arg(long, value_enum)]
    pub error: Option<ErrorKind>,

    /// TOML configuration file
    #[arg(long, env = "CALLKEEPER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print notifications as JSON
    #[arg(long)]
    pub json: bool,

    /// Log level, overriding the configuration
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Incoming,
    Outgoing,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Microphone,
    Hardware,
    Provider,
}

impl From<ErrorKind> for CallError {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Network => CallError::NetworkError,
            ErrorKind::Microphone => CallError::MicrophonePermissionDenied,
            ErrorKind::Hardware => CallError::HardwareInUse,
            ErrorKind::Provider => CallError::provider("", 503),
        }
    }
}

pub async fn run(args: SimulateArgs, config: SessionConfig) -> Result<()> {
    let sink = Arc::new(NotificationSink::new(config.notification.clone()));
    let host = SessionHost::new(sink.clone(), config.orchestrator.clone())?;

    let provider = Arc::new(match args.direction {
        Direction::Incoming => SimulatedProvider::incoming(&args.caller, &args.handle),
        Direction::Outgoing => SimulatedProvider::new(&args.caller, &args.handle),
    });

    let mut posted = sink.subscribe();
    let json = args.json;
    let printer = tokio::spawn(async move {
        while posted.changed().await.is_ok() {
            let notification = posted.borrow_and_update().clone();
            if let Err(e) = print_notification(notification.as_ref(), json) {
                warn!(error = %e, "Failed to print notification");
            }
        }
    });

    let outcome = host.start_call(provider.clone()).await?;
    info!(session_id = %outcome.session_id(), direction = ?args.direction, "Simulated call started");

    if args.direction == Direction::Outgoing {
        provider.start_call(&args.handle);
    }
    sleep(Duration::from_secs(args.ring_secs)).await;

    match args.direction {
        Direction::Incoming => {
            host.handle_action(CallAction::Answer);
        }
        Direction::Outgoing => {
            provider.set_status(CallStatus::Connecting)?;
            provider.set_status(CallStatus::Connected)?;
        }
    }
    if let Some(kind) = args.error {
        provider.fail(kind.into())?;
    }

    let first_half = args.talk_secs / 2;
    sleep(Duration::from_secs(first_half)).await;
    if args.reconnect {
        provider.set_status(CallStatus::Reconnecting)?;
        sleep(Duration::from_secs(1)).await;
        provider.set_status(CallStatus::Connected)?;
    }
    sleep(Duration::from_secs(args.talk_secs - first_half)).await;

    host.handle_action(CallAction::HangUp);
    wait_for_shutdown(&host, config.orchestrator.shutdown_timeout()).await;

    let stats = host.orchestrator().stats();
    if args.json {
        println!("{}", serde_json::to_string(&stats).context("Failed to encode stats")?);
    } else {
        info!(
            timer_ticks = stats.timer_ticks,
            refreshes = stats.refreshes,
            refresh_failures = stats.refresh_failures,
            "Simulated call finished"
        );
    }

    drop(host);
    drop(sink);
    if tokio::time::timeout(Duration::from_secs(1), printer).await.is_err() {
        debug!("Notification printer still running at exit");
    }
    Ok(())
}

async fn wait_for_shutdown(host: &SessionHost, limit: Duration) {
    let deadline = tokio::time::Instant::now() + limit;
    while host.is_session_active() {
        if tokio::time::Instant::now() >= deadline {
            warn!("Session still active after hang-up, shutting it down");
            host.shutdown().await;
            return;
        }
        sleep(Duration::from_millis(20)).await;
    }
}

fn print_notification(notification: Option<&CallNotification>, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(&notification)?);
        return Ok(());
    }
    match notification {
        Some(n) => {
            let buttons: Vec<_> = n.actions.iter().map(|a| a.label.as_str()).collect();
            let screen = if n.full_screen { " (full screen)" } else { "" };
            println!(
                "[{}] {}: {}{}  [{}]",
                n.status,
                n.title,
                n.content_text,
                screen,
                buttons.join(" | ")
            );
        }
        None => println!("[-] notification withdrawn"),
    }
    Ok(())
}
