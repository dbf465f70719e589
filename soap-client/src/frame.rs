//! Pseudo-HTTP frame reader
//!
//! The hub speaks something that looks like HTTP on the subscription socket:
//! a header block terminated by a blank line, followed by a body whose length
//! is given by `Content-Length`. The same framing is used for the subscribe
//! response and for every event pushed afterwards, so one reader serves both.

use std::io::{ErrorKind, Read};

use crate::error::{Result, SoapError};

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";
const READ_CHUNK: usize = 1024;

/// Upper bound on a single frame body; the hub never sends anything close to this
pub const MAX_BODY_LEN: usize = 1024 * 1024;

/// Upper bound on a header block, terminator included
pub const MAX_HEADER_LEN: usize = 64 * 1024;

/// One complete frame received from the hub
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpMessage {
    /// First line of the header block, e.g. `HTTP/1.1 200 OK` or `POST reuse_socket HTTP/1.1`
    pub start_line: String,
    /// Remaining header lines as `(name, value)` pairs, in arrival order
    pub headers: Vec<(String, String)>,
    /// Message body, exactly `Content-Length` bytes decoded as UTF-8
    pub body: String,
}

impl HttpMessage {
    /// Look up a header value by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Status code of a response frame (`HTTP/1.1 <code> ...`), 0 when the
    /// start line is not a status line
    pub fn status_code(&self) -> u16 {
        let mut parts = self.start_line.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some(version), Some(code)) if version.starts_with("HTTP/") => {
                code.parse().unwrap_or(0)
            }
            _ => 0,
        }
    }
}

/// Slices a byte stream into [`HttpMessage`] frames.
///
/// Bytes of a partially received frame are kept across calls, so a read
/// timeout in the middle of a frame does not lose data: the next call picks
/// up where the last one stopped.
#[derive(Debug)]
pub struct FrameReader<S> {
    stream: S,
    pending: Vec<u8>,
    /// Prefix of `pending` already searched for the header terminator
    scanned: usize,
}

impl<S> FrameReader<S> {
    /// Wrap a stream
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            pending: Vec::new(),
            scanned: 0,
        }
    }

    /// Access the underlying stream, e.g. to write a reply on the same socket
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Access the underlying stream
    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Whether part of a frame has been received but not yet returned
    pub fn has_partial_frame(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Unwrap the reader, discarding any partial frame
    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl<S: Read> FrameReader<S> {
    /// Read the next complete frame, blocking across reads until one arrives.
    ///
    /// Returns [`SoapError::Timeout`] if the stream's read timeout elapses and
    /// [`SoapError::Closed`] if the peer closes the connection before a frame
    /// completes.
    pub fn read_message(&mut self) -> Result<HttpMessage> {
        loop {
            if let Some(message) = self.poll_message()? {
                return Ok(message);
            }
        }
    }

    /// Perform at most one read and return a frame if one is now complete.
    ///
    /// `Ok(None)` means bytes arrived but the frame is still partial. Callers
    /// that must react to outside conditions while a slow peer trickles data
    /// loop on this instead of [`read_message`](Self::read_message).
    pub fn poll_message(&mut self) -> Result<Option<HttpMessage>> {
        if let Some(message) = self.take_frame()? {
            return Ok(Some(message));
        }

        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match self.stream.read(&mut chunk) {
                Ok(0) => return Err(SoapError::Closed),
                Ok(n) => {
                    self.pending.extend_from_slice(&chunk[..n]);
                    return self.take_frame();
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    return Err(SoapError::Timeout)
                }
                Err(e) => return Err(SoapError::Io(e)),
            }
        }
    }

    /// Split a complete frame off the front of the pending buffer, if there is one
    fn take_frame(&mut self) -> Result<Option<HttpMessage>> {
        let Some(header_end) = self.find_header_end()? else {
            return Ok(None);
        };

        let header_text = std::str::from_utf8(&self.pending[..header_end])
            .map_err(|e| SoapError::Parse(format!("header block is not UTF-8: {}", e)))?;
        let (start_line, headers) = parse_header_block(header_text);
        let body_len = content_length(&headers)?;

        let body_start = header_end + HEADER_TERMINATOR.len();
        let frame_end = body_start + body_len;
        if self.pending.len() < frame_end {
            return Ok(None);
        }

        let body = String::from_utf8_lossy(&self.pending[body_start..frame_end]).into_owned();
        self.pending.drain(..frame_end);
        self.scanned = 0;

        Ok(Some(HttpMessage {
            start_line,
            headers,
            body,
        }))
    }

    /// Offset of the header terminator, searching only bytes not seen before
    fn find_header_end(&mut self) -> Result<Option<usize>> {
        // A terminator may straddle the previous scan boundary.
        let from = self.scanned.saturating_sub(HEADER_TERMINATOR.len() - 1);
        let found = find_terminator(&self.pending[from..]).map(|pos| from + pos);

        match found {
            Some(end) if end + HEADER_TERMINATOR.len() > MAX_HEADER_LEN => {}
            Some(end) => {
                self.scanned = end;
                return Ok(Some(end));
            }
            None if self.pending.len() > MAX_HEADER_LEN => {}
            None => {
                self.scanned = self.pending.len();
                return Ok(None);
            }
        }

        Err(SoapError::Parse(format!(
            "header block exceeds limit of {} bytes",
            MAX_HEADER_LEN
        )))
    }
}

fn find_terminator(buf: &[u8]) -> Option<usize> {
    buf.windows(HEADER_TERMINATOR.len())
        .position(|window| window == HEADER_TERMINATOR)
}

fn parse_header_block(text: &str) -> (String, Vec<(String, String)>) {
    let mut lines = text.split("\r\n");
    let start_line = lines.next().unwrap_or_default().trim().to_string();
    let headers = lines
        .filter_map(|line| {
            let (name, value) = line.split_once(':')?;
            Some((name.trim().to_string(), value.trim().to_string()))
        })
        .collect();
    (start_line, headers)
}

fn content_length(headers: &[(String, String)]) -> Result<usize> {
    let Some((_, value)) = headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
    else {
        return Ok(0);
    };

    let len: usize = value
        .parse()
        .map_err(|_| SoapError::Parse(format!("invalid Content-Length: {:?}", value)))?;
    if len > MAX_BODY_LEN {
        return Err(SoapError::Parse(format!(
            "Content-Length {} exceeds limit of {} bytes",
            len, MAX_BODY_LEN
        )));
    }
    Ok(len)
}
