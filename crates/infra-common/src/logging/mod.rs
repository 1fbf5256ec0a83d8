//! Logging setup built on `tracing-subscriber`

pub mod setup;
