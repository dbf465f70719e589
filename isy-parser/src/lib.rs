//! # isy-parser
//!
//! Parsing for the XML the hub pushes over its event subscription: the
//! `<Event>` envelope, program status records, and node-change payloads.
//!
//! ```rust,ignore
//! use isy_parser::{Event, ProgramStatus};
//!
//! let event = Event::from_xml(body)?;
//! if event.control == "_1" && event.action == "0" {
//!     let status = ProgramStatus::from_event_info(&event.event_info)?;
//! }
//! ```

pub mod error;
pub mod event;
pub mod node;
pub mod program;
pub mod xml_decode;

pub use error::{ParseError, ParseResult};
pub use event::Event;
pub use node::{extract_new_name, NodeAddress};
pub use program::{decode_status, program_id, Fork, Phase, ProgramStatus};
