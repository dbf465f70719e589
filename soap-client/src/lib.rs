//! Private SOAP client for the hub's event subscription socket
//!
//! The hub pushes events over the same TCP connection that carried the
//! subscribe request (`reportURL` = `REUSE_SOCKET`), so this crate works on a
//! caller-owned stream rather than an HTTP client: it writes the SOAP
//! envelopes by hand and reads responses and events through a
//! [`FrameReader`].

mod error;
mod frame;

pub use error::{Result, SoapError};
pub use frame::{FrameReader, HttpMessage, MAX_BODY_LEN, MAX_HEADER_LEN};

use std::io::{Read, Write};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use xmltree::{Element, XMLNode};

const SERVICE_PATH: &str = "/services";
const SERVICE_URN: &str = "urn:udi-com:service:X_Insteon_Lighting_Service:1";

/// Username and password for the hub's Basic authentication
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Value for the `Authorization` header, e.g. `Basic YWRtaW46YWRtaW4=`
    pub fn basic_auth_header(&self) -> String {
        let raw = format!("{}:{}", self.username, self.password);
        format!("Basic {}", BASE64.encode(raw))
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Hub's answer to a subscribe request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribeResponse {
    /// Status code from the response line, 0 if there was none
    pub status: u16,
    /// Subscription id; `None` means the hub refused the subscription
    pub sid: Option<String>,
}

impl SubscribeResponse {
    /// Interpret a framed response from the hub
    pub fn from_message(message: &HttpMessage) -> Self {
        Self {
            status: message.status_code(),
            sid: extract_sid(&message.body),
        }
    }
}

/// Build the full subscribe request (headers and body) for `host`
pub fn subscribe_request(host: &str, credentials: &Credentials) -> String {
    let body = format!(
        "<s:Envelope><s:Body><u:Subscribe xmlns:u='{}'><reportURL>REUSE_SOCKET</reportURL><duration>infinite</duration></u:Subscribe></s:Body></s:Envelope>\r\n",
        SERVICE_URN
    );
    with_headers(host, credentials, &body)
}

/// Build the full unsubscribe request for the subscription `sid`
pub fn unsubscribe_request(host: &str, credentials: &Credentials, sid: &str) -> String {
    let body = format!(
        "<s:Envelope><s:Body><u:Unsubscribe xmlns:u='{}'><SID>{}</SID></u:Unsubscribe></s:Body></s:Envelope>\r\n",
        SERVICE_URN, sid
    );
    with_headers(host, credentials, &body)
}

fn with_headers(host: &str, credentials: &Credentials, body: &str) -> String {
    format!(
        "POST {} HTTP/1.1\r\nHost: {}\r\nAuthorization: {}\r\nContent-Length: {}\r\nContent-Type: text/xml; charset='utf-8'\r\n\r\n{}",
        SERVICE_PATH,
        host,
        credentials.basic_auth_header(),
        body.len(),
        body
    )
}

/// Send a subscribe request over `reader`'s stream and wait for the answer.
///
/// Returns the subscription id on success. A read timeout while waiting for
/// the answer is reported as [`SoapError::Timeout`]; an answer with no SID is
/// [`SoapError::HandshakeRejected`].
pub fn subscribe<S: Read + Write>(
    reader: &mut FrameReader<S>,
    host: &str,
    credentials: &Credentials,
) -> Result<String> {
    let request = subscribe_request(host, credentials);
    reader.get_mut().write_all(request.as_bytes())?;
    reader.get_mut().flush()?;

    let message = reader.read_message()?;
    let response = SubscribeResponse::from_message(&message);
    tracing::debug!(status = response.status, sid = ?response.sid, "subscribe response");

    match response.sid {
        Some(sid) => Ok(sid),
        None => {
            tracing::debug!(headers = ?message.headers, body = %message.body, "subscription refused");
            Err(SoapError::HandshakeRejected {
                status: response.status,
            })
        }
    }
}

/// Send an unsubscribe request and return the status code of the hub's answer
pub fn unsubscribe<S: Read + Write>(
    reader: &mut FrameReader<S>,
    host: &str,
    credentials: &Credentials,
    sid: &str,
) -> Result<u16> {
    let request = unsubscribe_request(host, credentials, sid);
    reader.get_mut().write_all(request.as_bytes())?;
    reader.get_mut().flush()?;

    let message = reader.read_message()?;
    Ok(message.status_code())
}

/// Pull the `<SID>` text out of a subscribe response body.
///
/// The body is parsed as XML when possible; hubs have been seen to append
/// trailing bytes after the envelope, so a plain substring scan is the fallback.
fn extract_sid(body: &str) -> Option<String> {
    let sid = match Element::parse(body.trim().as_bytes()) {
        Ok(root) => find_text(&root, "SID").or_else(|| scan_sid(body)),
        Err(_) => scan_sid(body),
    }?;

    let sid = sid.trim().to_string();
    (!sid.is_empty()).then_some(sid)
}

fn find_text(element: &Element, name: &str) -> Option<String> {
    if element.name == name {
        return Some(
            element
                .get_text()
                .map(|text| text.into_owned())
                .unwrap_or_default(),
        );
    }
    element.children.iter().find_map(|child| match child {
        XMLNode::Element(child) => find_text(child, name),
        _ => None,
    })
}

fn scan_sid(body: &str) -> Option<String> {
    let start = body.find("<SID>")? + "<SID>".len();
    let len = body[start..].find("</SID>")?;
    Some(body[start..start + len].to_string())
}
