//! HTTP/1.x message codec
//!
//! This module provides the HTTP/1.x half of the protocol engine: a
//! byte-preserving message model and an incremental parser/writer pair.
//! It is deliberately permissive - the point is to construct and send
//! unusual messages at a device under test and to parse whatever comes
//! back, so unparseable header fields are kept as raw bytes instead of
//! aborting the message.
//!
//! # Architecture
//!
//! Parsing is sans-I/O and incremental: feed [`parser::MessageParser`]
//! arbitrary-sized byte chunks; the structured [`message::Message`]
//! appears once the header section is complete and its body fills as
//! more bytes arrive. Serialization is the reverse path through
//! [`writer`] plus the transfer codecs in [`coding`].
//!
//! # Examples
//!
//! ```
//! use wireprobe::http::{Direction, MessageParser};
//!
//! let mut parser = MessageParser::new(Direction::Request);
//! parser.parse(b"GET / HTTP/1.1\r\nHost: x\r\n\r\n").unwrap();
//!
//! let message = parser.message().unwrap();
//! assert_eq!(message.start_line().method(), Some("GET"));
//! assert_eq!(message.header().get("host"), Some("x"));
//! ```

pub mod body;
pub mod coding;
pub mod field;
pub mod headers;
pub mod message;
pub mod parser;
pub mod writer;

pub use body::Body;
pub use field::Field;
pub use headers::Header;
pub use message::{Direction, Message, StartLine};
pub use parser::MessageParser;

/// Result type for HTTP operations
pub type Result<T> = std::result::Result<T, Error>;

/// HTTP codec errors
///
/// Insufficient input is not an error on this side of the engine: the
/// parser simply buffers and waits, so the taxonomy here is structural
/// failures only.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid chunk size: {0}")]
    InvalidChunkSize(String),

    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// CRLF line ending
pub const CRLF: &str = "\r\n";
