//! Program status records carried in `_1`/`0` trigger events
//!
//! The event's `eventInfo` holds `<id>` and `<s>` elements (sometimes along
//! with other bookkeeping fields that are ignored here). `s` encodes which
//! branch of the program ran and whether it started or finished.

use std::fmt;

use serde::Deserialize;

use crate::error::{ParseError, ParseResult};
use crate::xml_decode;

/// Which branch of a program an update refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fork {
    Then,
    Else,
    Unknown,
}

impl Fork {
    pub fn as_str(&self) -> &'static str {
        match self {
            Fork::Then => "then",
            Fork::Else => "else",
            Fork::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Fork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the branch started or finished running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Started,
    Finished,
    Unknown,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Started => "started",
            Phase::Finished => "finished",
            Phase::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decode the hub's program status code into a branch and phase
pub fn decode_status(code: &str) -> (Fork, Phase) {
    match code.trim() {
        "22" => (Fork::Then, Phase::Started),
        "21" => (Fork::Then, Phase::Finished),
        "33" => (Fork::Else, Phase::Started),
        "31" => (Fork::Else, Phase::Finished),
        _ => (Fork::Unknown, Phase::Unknown),
    }
}

/// Externally visible program id: hub id in brackets plus the 4-digit program number
pub fn program_id(hub_id: u32, program: u32) -> String {
    format!("[{}]{:04}", hub_id, program)
}

#[derive(Debug, Deserialize)]
#[serde(rename = "prg")]
struct ProgramRecord {
    id: Option<String>,
    s: Option<String>,
}

/// A decoded program status update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramStatus {
    /// Hub-internal program number
    pub program: u32,
    pub fork: Fork,
    pub phase: Phase,
}

impl ProgramStatus {
    /// Parse the `eventInfo` of a program status event
    pub fn from_event_info(event_info: &str) -> ParseResult<Self> {
        let record: ProgramRecord = xml_decode::parse(&xml_decode::wrap(event_info, "prg"))?;

        let raw_id = record
            .id
            .ok_or_else(|| ParseError::MissingRequiredElement("id".to_string()))?;
        let program = raw_id.trim().parse().map_err(|_| {
            ParseError::XmlDeserializationFailed(format!("program id is not a number: {:?}", raw_id))
        })?;
        let (fork, phase) = decode_status(record.s.as_deref().unwrap_or_default());

        Ok(Self {
            program,
            fork,
            phase,
        })
    }

    /// Program id as reported for the hub with `hub_id`
    pub fn program_id(&self, hub_id: u32) -> String {
        program_id(hub_id, self.program)
    }
}
