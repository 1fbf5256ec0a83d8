//! `callkeeper` command-line driver

mod simulate;

use anyhow::{Context, Result};
use callkeeper_call_core::format_duration;
use callkeeper_infra_common::{log_welcome, setup_logging, LoggingConfig};
use callkeeper_session_core::SessionConfig;
use clap::{Parser, Subcommand};

use crate::simulate::SimulateArgs;

/// Call session orchestration toolkit
#[derive(Parser, Debug)]
#[command(name = "callkeeper", author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a scripted call against the simulated provider and print every
    /// notification the orchestrator posts
    Simulate(SimulateArgs),

    /// Print a duration in seconds the way the notification shows it
    FormatDuration {
        /// Duration in seconds
        secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Simulate(args) => {
            let config = SessionConfig::load(args.config.as_deref())
                .context("Failed to load configuration")?;
            init_logging(&config, args.log_level.as_deref())?;
            simulate::run(args, config).await
        }
        Command::FormatDuration { secs } => {
            println!("{}", format_duration(secs));
            Ok(())
        }
    }
}

fn init_logging(config: &SessionConfig, level_override: Option<&str>) -> Result<()> {
    let level = level_override.unwrap_or(&config.logging.level);
    let mut logging = LoggingConfig::from_level_str(level, "callkeeper")?;
    if config.logging.json {
        logging = logging.with_json();
    }
    if config.logging.file_info {
        logging = logging.with_file_info();
    }
    setup_logging(logging).context("Failed to initialise logging")?;
    log_welcome("callkeeper", env!("CARGO_PKG_VERSION"));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulate::{Direction, ErrorKind};
    use callkeeper_call_core::CallError;

    #[test]
    fn test_parse_simulate_flags() {
        let cli = Cli::try_parse_from([
            "callkeeper",
            "simulate",
            "--direction",
            "outgoing",
            "--talk-secs",
            "3",
            "--reconnect",
            "--error",
            "microphone",
        ])
        .unwrap();

        let Command::Simulate(args) = cli.command else {
            panic!("expected simulate");
        };
        assert_eq!(args.direction, Direction::Outgoing);
        assert_eq!(args.talk_secs, 3);
        assert_eq!(args.ring_secs, 2);
        assert!(args.reconnect);
        assert_eq!(args.error, Some(ErrorKind::Microphone));
        assert_eq!(CallError::from(ErrorKind::Microphone), CallError::MicrophonePermissionDenied);
    }

    #[test]
    fn test_parse_format_duration() {
        let cli = Cli::try_parse_from(["callkeeper", "format-duration", "3725"]).unwrap();
        assert!(matches!(cli.command, Command::FormatDuration { secs: 3725 }));
        assert_eq!(format_duration(3725), "01:02:05");
    }

    #[test]
    fn test_unknown_direction_rejected() {
        assert!(Cli::try_parse_from(["callkeeper", "simulate", "--direction", "sideways"]).is_err());
    }
}
