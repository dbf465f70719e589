use thiserror::Error;

/// Errors returned by REST commands sent to the hub
#[derive(Debug, Error)]
pub enum ApiError {
    /// The hub could not be reached or the connection failed mid-request
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The hub answered with a non-success HTTP status
    #[error("HTTP status {0}")]
    HttpStatus(u16),

    /// The hub accepted the request but reported that the command failed
    #[error("Command rejected by hub: {0}")]
    CommandRejected(String),

    /// The response body could not be interpreted
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The hub address does not form a valid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Type alias for results that can return an ApiError
pub type Result<T> = std::result::Result<T, ApiError>;

impl From<url::ParseError> for ApiError {
    fn from(err: url::ParseError) -> Self {
        ApiError::InvalidUrl(err.to_string())
    }
}

impl From<ureq::Error> for ApiError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, _) => ApiError::HttpStatus(code),
            ureq::Error::Transport(transport) => ApiError::NetworkError(transport.to_string()),
        }
    }
}
