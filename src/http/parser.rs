//! Incremental HTTP/1 message parsing
//!
//! One parser handles both directions, selected by a [`Direction`]
//! parameter. Bytes are fed in arbitrary-sized chunks; the parser
//! buffers until the header-terminating blank line, then streams the
//! body through the transfer-coding decoder chosen by the message's
//! length policy.

use super::body::Body;
use super::coding::BodyDecoder;
use super::field::Field;
use super::headers::Header;
use super::message::{Direction, Message, StartLine};
use super::{Error, Result};
use crate::config::CodecConfig;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Prefix,
    Body,
    Complete,
}

/// Incremental parser for one HTTP/1 message.
///
/// Feed bytes with [`parse`]; [`message`] becomes non-`None` once the
/// header section is complete, and the message's body becomes
/// non-`None` once body presence is determined. The parser never loses
/// partial input: whatever cannot be consumed yet is buffered for the
/// next call.
///
/// [`parse`]: MessageParser::parse
/// [`message`]: MessageParser::message
#[derive(Debug)]
pub struct MessageParser {
    direction: Direction,
    config: CodecConfig,
    phase: Phase,
    buf: Vec<u8>,
    decoder: Option<BodyDecoder>,
    message: Option<Message>,
}

impl MessageParser {
    /// Create a parser with the default configuration.
    pub fn new(direction: Direction) -> Self {
        MessageParser::with_config(direction, CodecConfig::default())
    }

    /// Create a parser with an explicit configuration.
    pub fn with_config(direction: Direction, config: CodecConfig) -> Self {
        MessageParser {
            direction,
            config,
            phase: Phase::Prefix,
            buf: Vec::new(),
            decoder: None,
            message: None,
        }
    }

    /// Feed raw bytes to the parser.
    ///
    /// Malformed start lines are fatal for the message; everything else
    /// that cannot be parsed is tolerated as raw bytes.
    pub fn parse(&mut self, data: &[u8]) -> Result<()> {
        match self.phase {
            Phase::Prefix => {
                self.buf.extend_from_slice(data);
                let Some((fields_end, delim_len)) = find_header_end(&self.buf) else {
                    return Ok(());
                };
                let rest = self.buf.split_off(fields_end + delim_len);
                let delimiter = self.buf.split_off(fields_end);
                let prefix = std::mem::take(&mut self.buf);
                self.finish_prefix(prefix, delimiter)?;
                if self.phase == Phase::Body {
                    self.feed_body(&rest)?;
                }
                Ok(())
            }
            Phase::Body => self.feed_body(data),
            Phase::Complete => Ok(()),
        }
    }

    /// The parsed message, once the header section is complete.
    pub fn message(&self) -> Option<&Message> {
        self.message.as_ref()
    }

    pub fn message_mut(&mut self) -> Option<&mut Message> {
        self.message.as_mut()
    }

    /// Take ownership of the parsed message, resetting nothing else.
    pub fn take_message(&mut self) -> Option<Message> {
        self.message.take()
    }

    /// True once the message, including any body, is fully parsed.
    pub fn is_complete(&self) -> bool {
        self.phase == Phase::Complete
    }

    /// Signal end of input (connection close). Completes an unbounded
    /// response body.
    pub fn close(&mut self) {
        if self.phase != Phase::Body {
            return;
        }
        if let (Some(decoder), Some(message)) = (&mut self.decoder, &mut self.message) {
            if let Some(body) = message.body_mut() {
                decoder.finish(body);
            }
            if decoder.decoded_all() {
                self.phase = Phase::Complete;
            }
        }
    }

    fn finish_prefix(&mut self, prefix: Vec<u8>, delimiter: Vec<u8>) -> Result<()> {
        let (start_bytes, field_bytes) = split_first_line(&prefix);
        let start_line = parse_start_line(start_bytes)?;

        let mut header = Header::with_limit(self.config.max_headers);
        let mut pos = 0;
        while pos < field_bytes.len() {
            let (line, next) = take_line(&field_bytes[pos..]);
            header.push(parse_field_line(line));
            pos += next;
        }
        header.set_raw(field_bytes.to_vec());

        let mut message =
            Message::from_parts(self.direction, start_line, header, delimiter);

        let (body, decoder) = self.body_policy(&message);
        message.set_body_opt(body);
        self.decoder = decoder;
        self.phase = if self.decoder.is_some() {
            Phase::Body
        } else {
            Phase::Complete
        };
        trace!(direction = ?self.direction, has_body = self.decoder.is_some(), "header section parsed");
        self.message = Some(message);

        // A zero-length body is already fully decoded.
        if let Some(decoder) = &self.decoder {
            if decoder.decoded_all() {
                self.phase = Phase::Complete;
            }
        }
        Ok(())
    }

    /// Decide body presence and pick the decoder.
    ///
    /// Declared chunked coding overrides Content-Length; a well-formed,
    /// unambiguous Content-Length bounds an identity body; anything
    /// else means "length unknown": requests default to no body,
    /// responses read until connection close.
    fn body_policy(&self, message: &Message) -> (Option<Body>, Option<BodyDecoder>) {
        if message.is_chunked() {
            return (Some(Body::new()), Some(BodyDecoder::chunked()));
        }
        if let Some(length) = content_length(message) {
            return (
                Some(Body::with_expected_len(length)),
                Some(BodyDecoder::identity(Some(length))),
            );
        }
        match self.direction {
            Direction::Request => (None, None),
            Direction::Response => (Some(Body::new()), Some(BodyDecoder::identity(None))),
        }
    }

    fn feed_body(&mut self, data: &[u8]) -> Result<()> {
        let decoder = self.decoder.as_mut().expect("body phase without decoder");
        let message = self.message.as_mut().expect("body phase without message");
        let body = message.body_mut().expect("body phase without body");
        decoder.decode(data, body)?;
        if decoder.decoded_all() {
            self.phase = Phase::Complete;
        }
        Ok(())
    }
}

/// Unambiguous, well-formed Content-Length, or `None`.
///
/// Multiple differing values or unparseable digits never produce a
/// guessed number - the length propagates as unknown.
fn content_length(message: &Message) -> Option<usize> {
    let values = message.header().get_all("content-length");
    let first = values.first()?;
    let length: usize = match first.trim().parse() {
        Ok(n) => n,
        Err(_) => {
            debug!(value = %first, "unparseable Content-Length, treating as unknown");
            return None;
        }
    };
    if values.iter().any(|v| v.trim() != first.trim()) {
        debug!("conflicting Content-Length values, treating as unknown");
        return None;
    }
    Some(length)
}

/// Find the blank line ending the header section.
///
/// Returns the offset just past the last field line's terminator and
/// the length of the blank-line delimiter. Bare-LF line endings are
/// tolerated alongside CRLF.
fn find_header_end(buf: &[u8]) -> Option<(usize, usize)> {
    for (i, &byte) in buf.iter().enumerate() {
        if byte != b'\n' {
            continue;
        }
        let rest = &buf[i + 1..];
        if rest.starts_with(b"\r\n") {
            return Some((i + 1, 2));
        }
        if rest.first() == Some(&b'\n') {
            return Some((i + 1, 1));
        }
    }
    None
}

/// Split off the first line (terminator included) from a prefix block.
fn split_first_line(prefix: &[u8]) -> (&[u8], &[u8]) {
    match prefix.iter().position(|&b| b == b'\n') {
        Some(lf) => prefix.split_at(lf + 1),
        None => (prefix, &[]),
    }
}

/// Take one terminated line from the front of `buf`, returning the line
/// (terminator included) and the offset past it.
fn take_line(buf: &[u8]) -> (&[u8], usize) {
    match buf.iter().position(|&b| b == b'\n') {
        Some(lf) => (&buf[..=lf], lf + 1),
        None => (buf, buf.len()),
    }
}

/// Split a line into content and terminator bytes.
fn split_terminator(line: &[u8]) -> (&[u8], &[u8]) {
    if line.ends_with(b"\r\n") {
        line.split_at(line.len() - 2)
    } else if line.ends_with(b"\n") {
        line.split_at(line.len() - 1)
    } else {
        (line, &[])
    }
}

fn is_ws(byte: u8) -> bool {
    byte == b' ' || byte == b'\t'
}

/// Parse a start line, preserving every delimiter byte.
///
/// Pattern: first token, whitespace run, second token, whitespace run,
/// rest of line. A line without any whitespace is malformed and fatal.
pub(crate) fn parse_start_line(line: &[u8]) -> Result<StartLine> {
    let (content, terminator) = split_terminator(line);

    let ws1 = content
        .iter()
        .position(|&b| is_ws(b))
        .ok_or_else(|| Error::Parse(format!(
            "malformed start line: {:?}",
            String::from_utf8_lossy(content)
        )))?;
    if ws1 == 0 {
        return Err(Error::Parse("start line begins with whitespace".into()));
    }
    let token0 = &content[..ws1];

    let mut pos = ws1;
    while pos < content.len() && is_ws(content[pos]) {
        pos += 1;
    }
    let delim0 = &content[ws1..pos];

    let token1_start = pos;
    while pos < content.len() && !is_ws(content[pos]) {
        pos += 1;
    }
    let token1 = &content[token1_start..pos];
    if token1.is_empty() {
        return Err(Error::Parse("start line has a single token".into()));
    }

    let delim1_start = pos;
    while pos < content.len() && is_ws(content[pos]) {
        pos += 1;
    }
    let delim1 = &content[delim1_start..pos];
    let token2 = &content[pos..];

    let opt = |bytes: &[u8]| {
        if bytes.is_empty() {
            None
        } else {
            Some(bytes.to_vec())
        }
    };

    Ok(StartLine::from_parts(
        [Some(token0.to_vec()), Some(token1.to_vec()), opt(token2)],
        [Some(delim0.to_vec()), opt(delim1)],
        opt(terminator),
    ))
}

/// Parse one header field line into a [`Field`].
///
/// Pattern: name, optional horizontal whitespace, `:`, optional
/// whitespace, value, trailing whitespace folded into the terminator.
/// A line with no colon or an empty name becomes a raw placeholder
/// field instead of failing the message.
pub(crate) fn parse_field_line(line: &[u8]) -> Field {
    let (content, terminator) = split_terminator(line);

    let Some(colon) = content.iter().position(|&b| b == b':') else {
        debug!(
            line = %String::from_utf8_lossy(content),
            "unparseable header line kept as raw bytes"
        );
        return Field::raw_line(content.to_vec(), terminator.to_vec());
    };

    let mut name_end = colon;
    while name_end > 0 && is_ws(content[name_end - 1]) {
        name_end -= 1;
    }
    if name_end == 0 {
        debug!("header line with empty name kept as raw bytes");
        return Field::raw_line(content.to_vec(), terminator.to_vec());
    }

    let mut value_start = colon + 1;
    while value_start < content.len() && is_ws(content[value_start]) {
        value_start += 1;
    }

    let mut value_end = content.len();
    while value_end > value_start && is_ws(content[value_end - 1]) {
        value_end -= 1;
    }

    let mut term = content[value_end..].to_vec();
    term.extend_from_slice(terminator);

    Field::from_parts(
        content[..name_end].to_vec(),
        content[name_end..value_start].to_vec(),
        content[value_start..value_end].to_vec(),
        term,
    )
}
