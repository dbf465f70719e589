//! Error types for event parsing

use thiserror::Error;

/// Errors that can occur while parsing a hub event
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The body contains no `<Event>` element
    #[error("body does not contain an <Event> element")]
    MissingEvent,

    /// A required attribute of `<Event>` is absent
    #[error("missing attribute on <Event>: {0}")]
    MissingAttribute(&'static str),

    /// The `seqnum` attribute is not a non-negative integer
    #[error("invalid seqnum: {0:?}")]
    InvalidSeqnum(String),

    /// The XML itself is broken
    #[error("malformed XML: {0}")]
    Xml(String),

    /// XML deserialization failed
    #[error("XML deserialization failed: {0}")]
    XmlDeserializationFailed(String),

    /// Missing required element
    #[error("missing required element: {0}")]
    MissingRequiredElement(String),
}

impl From<quick_xml::Error> for ParseError {
    fn from(e: quick_xml::Error) -> Self {
        ParseError::Xml(e.to_string())
    }
}

/// Result type alias for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;
