//! Small serde helpers for the XML fragments embedded in `eventInfo`

use serde::de::DeserializeOwned;

use crate::error::{ParseError, ParseResult};

/// Deserialize an XML document into `T`
pub fn parse<T: DeserializeOwned>(xml: &str) -> ParseResult<T> {
    quick_xml::de::from_str(xml).map_err(|e| ParseError::XmlDeserializationFailed(e.to_string()))
}

/// Give a bare fragment (`<id>1</id><s>21</s>`) a single root element named
/// `root`, unless it already has one
pub fn wrap(fragment: &str, root: &str) -> String {
    let trimmed = fragment.trim();
    let open = format!("<{}", root);
    let already_wrapped = trimmed
        .strip_prefix(open.as_str())
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c == '>' || c == '/' || c.is_whitespace())
        && trimmed.ends_with(&format!("</{}>", root));

    if already_wrapped {
        trimmed.to_string()
    } else {
        format!("<{root}>{trimmed}</{root}>")
    }
}

/// Text between the first `<tag>` and the following `</tag>`, without any XML
/// parsing. Used for fields the hub embeds in otherwise irregular payloads.
pub fn between_tags<'a>(text: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let start = text.find(&open)? + open.len();
    let len = text[start..].find(&close)?;
    Some(&text[start..start + len])
}
