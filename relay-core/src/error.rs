//! Error types.
//!
//! Cache and queue operations cannot fail. Errors only come from the edges:
//! parsing configuration and starting background observers.

use thiserror::Error;

/// Errors produced by this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The configuration document could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// A background observer was started outside of a tokio runtime.
    #[error("no tokio runtime available to run the observer task")]
    NoRuntime,
}

/// Convenience alias for results carrying [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
