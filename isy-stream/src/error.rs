//! Error types for the isy-stream crate.

use std::time::Duration;

use soap_client::SoapError;

/// Errors surfaced by the subscription layer.
///
/// Failures inside a running subscriber never show up here: the worker logs
/// them and reconnects. These are errors from starting, configuring and
/// stopping subscribers.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// Invalid configuration provided
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A one-off exchange with the hub failed
    #[error("Transport error: {0}")]
    Transport(#[from] SoapError),

    /// The worker thread could not be started
    #[error("Failed to spawn subscriber thread: {0}")]
    Spawn(std::io::Error),

    /// The worker thread panicked
    #[error("Subscriber worker panicked")]
    WorkerPanicked,

    /// The worker did not exit within the shutdown grace period
    #[error("Subscriber did not stop within {0:?}")]
    ShutdownTimeout(Duration),

    /// A subscriber is already running for this hub
    #[error("Hub already running: {0}")]
    HubAlreadyRunning(String),

    /// No subscriber is running for this hub
    #[error("Hub not found: {0}")]
    HubNotFound(String),
}

/// Type alias for results in this crate
pub type Result<T> = std::result::Result<T, StreamError>;
