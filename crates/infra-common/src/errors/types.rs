use thiserror::Error;

/// Result alias for infrastructure operations
pub type Result<T> = std::result::Result<T, Error>;

/// Infrastructure-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Logging subsystem could not be initialized
    #[error("Logging error: {0}")]
    Logging(String),

    /// A tracked task failed or could not be joined
    #[error("Task error: {0}")]
    Task(String),

    /// Free-form error, usually carrying context
    #[error("{0}")]
    Custom(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a task error
    pub fn task(message: impl Into<String>) -> Self {
        Self::Task(message.into())
    }
}
