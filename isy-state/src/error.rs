//! Error types for isy-state

use thiserror::Error;

/// Result type for state translation
pub type Result<T> = std::result::Result<T, TranslateError>;

/// Reasons a status event could not be turned into a state update
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    /// The device class has no meaning for this control code
    #[error("unhandled {class} event control {control}")]
    UnhandledControl { class: &'static str, control: String },

    /// The control is known but the action value is not one the hub documents
    #[error("invalid {control} action parameter: {action:?}")]
    InvalidParameter { control: String, action: String },

    /// The action should have been a number
    #[error("{control} action is not a number: {action:?}")]
    InvalidNumber { control: String, action: String },
}
