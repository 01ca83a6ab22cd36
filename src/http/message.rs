//! HTTP message model
//!
//! Start line, header and body of a request or response. Every token
//! and delimiter of the start line is kept independently so messages
//! can be reconstructed byte-for-byte - including deliberately
//! malformed ones.

use super::body::Body;
use super::headers::Header;
use std::fmt;

/// Which side of the wire a message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Request,
    Response,
}

/// Get the canonical reason phrase for a status code.
pub fn reason_phrase(code: u16) -> &'static str {
    match code {
        100 => "Continue",
        101 => "Switching Protocols",
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        206 => "Partial Content",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        304 => "Not Modified",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        408 => "Request Timeout",
        411 => "Length Required",
        413 => "Payload Too Large",
        414 => "URI Too Long",
        417 => "Expectation Failed",
        426 => "Upgrade Required",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        505 => "HTTP Version Not Supported",
        _ => "Unknown",
    }
}

/// Request or status line with every token and delimiter preserved.
///
/// Tokens are, in order: method / URI / rest for requests, protocol /
/// code / reason for responses. Each token and each inter-token
/// whitespace run is independently nullable, which allows building
/// start lines a well-behaved client would never produce.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartLine {
    tokens: [Option<Vec<u8>>; 3],
    delimiters: [Option<Vec<u8>>; 2],
    terminator: Option<Vec<u8>>,
}

impl StartLine {
    /// Create an empty start line.
    pub fn new() -> Self {
        StartLine::default()
    }

    pub(crate) fn from_parts(
        tokens: [Option<Vec<u8>>; 3],
        delimiters: [Option<Vec<u8>>; 2],
        terminator: Option<Vec<u8>>,
    ) -> Self {
        StartLine {
            tokens,
            delimiters,
            terminator,
        }
    }

    /// Raw bytes of token `index` (0..3).
    pub fn token(&self, index: usize) -> Option<&[u8]> {
        self.tokens.get(index)?.as_deref()
    }

    fn token_str(&self, index: usize) -> Option<&str> {
        self.token(index).and_then(|t| std::str::from_utf8(t).ok())
    }

    /// Set token `index`, leaving delimiters untouched.
    pub fn set_token(&mut self, index: usize, token: impl Into<String>) {
        if index < 3 {
            self.tokens[index] = Some(token.into().into_bytes());
        }
    }

    /// Set the whitespace run before token `index + 1`.
    pub fn set_delimiter(&mut self, index: usize, bytes: impl Into<Vec<u8>>) {
        if index < 2 {
            self.delimiters[index] = Some(bytes.into());
        }
    }

    /// Set the line terminator.
    pub fn set_terminator(&mut self, bytes: impl Into<Vec<u8>>) {
        self.terminator = Some(bytes.into());
    }

    /// Request method (token 0).
    pub fn method(&self) -> Option<&str> {
        self.token_str(0)
    }

    /// Request URI (token 1).
    pub fn uri(&self) -> Option<&str> {
        self.token_str(1)
    }

    /// Trailing token: protocol version for requests, reason phrase for
    /// responses.
    pub fn rest(&self) -> Option<&str> {
        self.token_str(2)
    }

    /// Response protocol (token 0).
    pub fn protocol(&self) -> Option<&str> {
        self.token_str(0)
    }

    /// Response status code (token 1), if it parses as one.
    pub fn status_code(&self) -> Option<u16> {
        self.token_str(1)?.trim().parse().ok()
    }

    /// Response reason phrase (token 2).
    pub fn reason(&self) -> Option<&str> {
        self.token_str(2)
    }

    /// Fill unset tokens and delimiters with defaults for `direction`.
    pub(crate) fn finalize(&mut self, direction: Direction) {
        let defaults: [String; 3] = match direction {
            Direction::Request => ["GET".into(), "/".into(), "HTTP/1.1".into()],
            Direction::Response => {
                let code = self.status_code().unwrap_or(200);
                [
                    "HTTP/1.1".into(),
                    code.to_string(),
                    reason_phrase(code).into(),
                ]
            }
        };
        for (token, default) in self.tokens.iter_mut().zip(defaults) {
            if token.is_none() {
                *token = Some(default.into_bytes());
            }
        }
        for delimiter in &mut self.delimiters {
            if delimiter.is_none() {
                *delimiter = Some(b" ".to_vec());
            }
        }
        if self.terminator.is_none() {
            self.terminator = Some(b"\r\n".to_vec());
        }
    }

    /// Serialize into `out`, emitting only the parts that are set.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        let parts = [
            &self.tokens[0],
            &self.delimiters[0],
            &self.tokens[1],
            &self.delimiters[1],
            &self.tokens[2],
            &self.terminator,
        ];
        for part in parts {
            if let Some(bytes) = part {
                out.extend_from_slice(bytes);
            }
        }
    }
}

impl fmt::Display for StartLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut bytes = Vec::new();
        self.write_to(&mut bytes);
        write!(f, "{}", String::from_utf8_lossy(&bytes))
    }
}

/// A complete HTTP message.
///
/// `body` is `None` for header-only messages - the default for
/// requests - which is distinct from a present body of length zero.
///
/// # Lifecycle
///
/// Created empty ([`Message::request`]/[`Message::response`]) or by the
/// parser; [`Message::finalize`] fills remaining start-line and header
/// defaults and synchronizes `Content-Length` with the body exactly
/// once, never overwriting an explicit value. A second `finalize` call
/// is a guarded no-op, so serialization cannot double-insert headers.
#[derive(Debug, Clone)]
pub struct Message {
    direction: Direction,
    start_line: StartLine,
    header: Header,
    header_delimiter: Option<Vec<u8>>,
    body: Option<Body>,
    finalized: bool,
}

impl Message {
    fn new(direction: Direction) -> Self {
        Message {
            direction,
            start_line: StartLine::new(),
            header: Header::new(),
            header_delimiter: None,
            body: None,
            finalized: false,
        }
    }

    /// Create an empty request message.
    pub fn request() -> Self {
        Message::new(Direction::Request)
    }

    /// Create an empty response message.
    pub fn response() -> Self {
        Message::new(Direction::Response)
    }

    /// Create a GET request for `uri`.
    pub fn get(uri: impl Into<String>) -> Self {
        let mut message = Message::request();
        message.start_line.set_token(0, "GET");
        message.start_line.set_token(1, uri);
        message
    }

    /// Create a POST request for `uri` carrying `body`.
    pub fn post(uri: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        let mut message = Message::request();
        message.start_line.set_token(0, "POST");
        message.start_line.set_token(1, uri);
        message.body = Some(Body::from_bytes(body.into()));
        message
    }

    /// Create a response with the given status code.
    pub fn with_status(code: u16) -> Self {
        let mut message = Message::response();
        message.start_line.set_token(1, code.to_string());
        message
    }

    pub(crate) fn from_parts(
        direction: Direction,
        start_line: StartLine,
        header: Header,
        header_delimiter: Vec<u8>,
    ) -> Self {
        Message {
            direction,
            start_line,
            header,
            header_delimiter: Some(header_delimiter),
            body: None,
            finalized: false,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn start_line(&self) -> &StartLine {
        &self.start_line
    }

    pub fn start_line_mut(&mut self) -> &mut StartLine {
        &mut self.start_line
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }

    /// The blank line separating header section from body.
    pub fn header_delimiter(&self) -> &[u8] {
        self.header_delimiter.as_deref().unwrap_or(b"\r\n")
    }

    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    pub fn body_mut(&mut self) -> Option<&mut Body> {
        self.body.as_mut()
    }

    /// Attach a body, replacing any existing one.
    pub fn set_body(&mut self, body: Body) {
        self.body = Some(body);
    }

    pub(crate) fn set_body_opt(&mut self, body: Option<Body>) {
        self.body = body;
    }

    /// True if the message declares chunked transfer-coding.
    pub fn is_chunked(&self) -> bool {
        self.header
            .get_all("transfer-encoding")
            .iter()
            .any(|v| v.to_ascii_lowercase().contains("chunked"))
    }

    /// Fill defaults and synchronize `Content-Length`, exactly once.
    pub fn finalize(&mut self) {
        if self.finalized {
            return;
        }
        self.finalized = true;

        self.start_line.finalize(self.direction);
        self.header.finalize();
        if self.header_delimiter.is_none() {
            self.header_delimiter = Some(b"\r\n".to_vec());
        }

        if let Some(body) = &self.body {
            if !self.is_chunked() && !self.header.contains("content-length") {
                self.header
                    .add("Content-Length", body.appended().to_string());
                self.header.finalize();
            }
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_finalize_defaults() {
        let mut message = Message::request();
        message.finalize();
        let mut out = Vec::new();
        message.start_line().write_to(&mut out);
        assert_eq!(out, b"GET / HTTP/1.1\r\n");
    }

    #[test]
    fn test_response_finalize_defaults() {
        let mut message = Message::with_status(404);
        message.finalize();
        let mut out = Vec::new();
        message.start_line().write_to(&mut out);
        assert_eq!(out, b"HTTP/1.1 404 Not Found\r\n");
    }

    #[test]
    fn test_finalize_sets_content_length_once() {
        let mut message = Message::post("/submit", b"hello".to_vec());
        message.finalize();
        assert_eq!(message.header().get("content-length"), Some("5"));

        // Second finalize must not duplicate the header.
        message.finalize();
        assert_eq!(message.header().count("content-length"), 1);
    }

    #[test]
    fn test_finalize_keeps_explicit_content_length() {
        let mut message = Message::post("/submit", b"hello".to_vec());
        message.header_mut().add("Content-Length", "999");
        message.finalize();
        assert_eq!(message.header().get("content-length"), Some("999"));
        assert_eq!(message.header().count("content-length"), 1);
    }

    #[test]
    fn test_chunked_suppresses_content_length() {
        let mut message = Message::post("/submit", b"hello".to_vec());
        message.header_mut().add("Transfer-Encoding", "chunked");
        message.finalize();
        assert!(!message.header().contains("content-length"));
    }

    #[test]
    fn test_clone_is_deep() {
        let mut original = Message::post("/a", b"body".to_vec());
        let mut copy = original.clone();

        copy.start_line_mut().set_token(1, "/b");
        copy.header_mut().add("X-Copy", "1");
        copy.body_mut().unwrap().append(b" more");

        assert_eq!(original.start_line().uri(), Some("/a"));
        assert!(!original.header().contains("X-Copy"));
        assert_eq!(original.body().unwrap().bytes(), b"body");
        original.finalize();
        assert_eq!(original.header().get("content-length"), Some("4"));
    }

    #[test]
    fn test_header_only_vs_zero_length_body() {
        let no_body = Message::request();
        assert!(no_body.body().is_none());

        let mut zero = Message::request();
        zero.set_body(Body::with_expected_len(0));
        assert!(zero.body().is_some());
    }

    #[test]
    fn test_malformed_start_line_round_trip() {
        let mut message = Message::request();
        message.start_line_mut().set_token(0, "GET");
        message.start_line_mut().set_delimiter(0, b"\t\t".to_vec());
        message.start_line_mut().set_token(1, "/odd uri");
        message.start_line_mut().set_delimiter(1, b" ".to_vec());
        message.start_line_mut().set_token(2, "HTTP/9.9");
        message.start_line_mut().set_terminator(b"\n".to_vec());

        let mut out = Vec::new();
        message.start_line().write_to(&mut out);
        assert_eq!(out, b"GET\t\t/odd uri HTTP/9.9\n");
    }

    #[test]
    fn test_reason_phrase() {
        assert_eq!(reason_phrase(200), "OK");
        assert_eq!(reason_phrase(404), "Not Found");
        assert_eq!(reason_phrase(599), "Unknown");
    }
}
