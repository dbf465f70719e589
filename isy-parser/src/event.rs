//! Parsing of the `<Event>` envelope pushed by the hub
//!
//! Every message on the subscription socket carries one element shaped like:
//!
//! ```xml
//! <?xml version="1.0"?>
//! <Event seqnum="12" sid="uuid:74">
//!   <control>ST</control>
//!   <action>255</action>
//!   <node>1A 2B 3C 1</node>
//!   <eventInfo></eventInfo>
//! </Event>
//! ```
//!
//! `control`, `action` and `node` are unescaped text. `eventInfo` is kept
//! as the raw inner markup because it frequently holds a nested record
//! (program status, renamed node, added node definition).

use std::borrow::Cow;

use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event as XmlEvent};
use quick_xml::Reader;

use crate::error::{ParseError, ParseResult};

/// One event received from the hub
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Subscription id the hub stamped on this event
    pub sid: String,
    /// Sequence number within the subscription
    pub seqnum: u64,
    /// Event category, e.g. `_0`, `_3`, `ST`, `DON`
    pub control: String,
    /// Value whose meaning depends on `control`
    pub action: String,
    /// Node address, empty for system events
    pub node: String,
    /// Free-form extra data, often XML
    pub event_info: String,
}

#[derive(Clone, Copy)]
enum Field {
    Control,
    Action,
    Node,
    EventInfo,
}

impl Field {
    fn from_local_name(name: &[u8]) -> Option<Self> {
        match name {
            b"control" => Some(Field::Control),
            b"action" => Some(Field::Action),
            b"node" => Some(Field::Node),
            b"eventInfo" => Some(Field::EventInfo),
            _ => None,
        }
    }
}

#[derive(Default)]
struct Fields {
    control: Option<String>,
    action: Option<String>,
    node: Option<String>,
    event_info: Option<String>,
}

impl Fields {
    fn set(&mut self, field: Field, raw: &str) -> ParseResult<()> {
        match field {
            Field::Control => self.control = Some(unescape_text(raw)?),
            Field::Action => self.action = Some(unescape_text(raw)?),
            Field::Node => self.node = Some(unescape_text(raw)?),
            Field::EventInfo => self.event_info = Some(raw.to_string()),
        }
        Ok(())
    }
}

impl Event {
    /// Parse the first `<Event>` element found in a message body.
    ///
    /// `control` is required; the other children default to empty strings
    /// when the hub leaves them out.
    pub fn from_xml(body: &str) -> ParseResult<Self> {
        if !body.contains("<Event") {
            return Err(ParseError::MissingEvent);
        }

        let mut reader = Reader::from_str(body);
        loop {
            match reader.read_event()? {
                XmlEvent::Start(start) if start.local_name().as_ref() == b"Event" => {
                    let (sid, seqnum) = header_attributes(&start)?;
                    let fields = read_children(&mut reader)?;
                    return Self::assemble(sid, seqnum, fields);
                }
                XmlEvent::Empty(start) if start.local_name().as_ref() == b"Event" => {
                    let (sid, seqnum) = header_attributes(&start)?;
                    return Self::assemble(sid, seqnum, Fields::default());
                }
                XmlEvent::Eof => return Err(ParseError::MissingEvent),
                _ => {}
            }
        }
    }

    fn assemble(sid: String, seqnum: u64, fields: Fields) -> ParseResult<Self> {
        let control = fields
            .control
            .ok_or_else(|| ParseError::MissingRequiredElement("control".to_string()))?;
        Ok(Self {
            sid,
            seqnum,
            control,
            action: fields.action.unwrap_or_default(),
            node: fields.node.unwrap_or_default(),
            event_info: fields.event_info.unwrap_or_default(),
        })
    }

    /// Whether this is a control-plane event (`_`-prefixed control)
    pub fn is_control_event(&self) -> bool {
        self.control.starts_with('_')
    }
}

fn header_attributes(start: &BytesStart<'_>) -> ParseResult<(String, u64)> {
    let sid = attribute(start, "sid")?.ok_or(ParseError::MissingAttribute("sid"))?;
    let raw_seq = attribute(start, "seqnum")?.ok_or(ParseError::MissingAttribute("seqnum"))?;
    let seqnum = raw_seq
        .trim()
        .parse()
        .map_err(|_| ParseError::InvalidSeqnum(raw_seq.clone()))?;
    Ok((sid, seqnum))
}

fn attribute(start: &BytesStart<'_>, name: &str) -> ParseResult<Option<String>> {
    let attr = start
        .try_get_attribute(name)
        .map_err(|e| ParseError::Xml(e.to_string()))?;
    match attr {
        Some(attr) => Ok(Some(attr.unescape_value()?.into_owned())),
        None => Ok(None),
    }
}

fn read_children(reader: &mut Reader<&[u8]>) -> ParseResult<Fields> {
    let mut fields = Fields::default();
    loop {
        match reader.read_event()? {
            XmlEvent::Start(child) => {
                let end = child.to_end().into_owned();
                let raw = reader.read_text(end.name())?;
                if let Some(field) = Field::from_local_name(child.local_name().as_ref()) {
                    fields.set(field, &raw)?;
                }
            }
            XmlEvent::Empty(child) => {
                if let Some(field) = Field::from_local_name(child.local_name().as_ref()) {
                    fields.set(field, "")?;
                }
            }
            XmlEvent::End(end) if end.local_name().as_ref() == b"Event" => return Ok(fields),
            XmlEvent::Eof => return Ok(fields),
            _ => {}
        }
    }
}

fn unescape_text(raw: &str) -> ParseResult<String> {
    let text: Cow<'_, str> = unescape(raw).map_err(|e| ParseError::Xml(e.to_string()))?;
    Ok(text.trim().to_string())
}
