//! Common infrastructure shared by the callkeeper crates.
//!
//! - [`errors`]: the shared error type and error context helpers
//! - [`logging`]: `tracing-subscriber` setup
//! - [`tasks`]: session-scoped task tracking with cooperative cancellation

pub mod errors;
pub mod logging;
pub mod tasks;

pub use errors::context::{ErrorContext, ErrorExt};
pub use errors::types::{Error, Result};
pub use logging::setup::{log_welcome, parse_log_level, setup_logging, LoggingConfig};
pub use tasks::{SessionScope, TrackedTask};
