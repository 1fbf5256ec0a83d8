//! # Call core
//!
//! The data model and provider contract shared by every part of callkeeper:
//!
//! - [`CallState`]: immutable snapshot of one call session, replaced wholesale
//!   on every change
//! - [`CallSessionProvider`]: the telephony side, exposing a replaying state
//!   stream and fire-and-forget call commands
//! - [`ReplayState`] / [`StateStream`]: latest-value cache plus ordered
//!   fan-out, the building block providers publish through
//! - [`SimulatedProvider`]: an in-process provider for tests, demos and the CLI
//!
//! ```rust
//! use callkeeper_call_core::{CallSessionProvider, CallStatus, SimulatedProvider};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let provider = SimulatedProvider::new("Ada", "+15550100");
//! let mut stream = provider.subscribe();
//!
//! provider.start_call("+15550100");
//!
//! assert_eq!(stream.recv().await.unwrap().status, CallStatus::Idle);
//! assert_eq!(stream.recv().await.unwrap().status, CallStatus::Initiating);
//! assert_eq!(stream.recv().await.unwrap().status, CallStatus::Ringing);
//! # }
//! ```

pub mod duration;
pub mod error;
pub mod provider;
pub mod replay;
pub mod simulated;
pub mod state;

pub use duration::format_duration;
pub use error::{CallError, StateError};
pub use provider::CallSessionProvider;
pub use replay::{ReplayState, StateStream};
pub use simulated::{ProviderCommand, SimulatedProvider};
pub use state::{CallDirection, CallState, CallStatus};
