//! Error types for the SOAP client

use thiserror::Error;

/// Errors that can occur while talking to the hub over the subscription socket
#[derive(Debug, Error)]
pub enum SoapError {
    /// The hub closed the connection before a frame was complete
    #[error("hub closed subscription connection")]
    Closed,

    /// A read did not complete within the socket timeout
    #[error("timed out waiting for data from hub")]
    Timeout,

    /// Any other socket failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The frame could not be interpreted (bad headers, bad Content-Length)
    #[error("malformed frame: {0}")]
    Parse(String),

    /// The hub answered the subscribe request without a subscription id
    #[error("subscription rejected by hub (status {status})")]
    HandshakeRejected {
        /// Status code from the response line, 0 if absent
        status: u16,
    },
}

impl SoapError {
    /// Whether this error is a plain read timeout rather than a broken connection
    pub fn is_timeout(&self) -> bool {
        matches!(self, SoapError::Timeout)
    }
}

/// Result alias for SOAP client operations
pub type Result<T> = std::result::Result<T, SoapError>;
