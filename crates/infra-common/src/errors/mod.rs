//! Error handling shared across the stack

pub mod context;
pub mod types;
