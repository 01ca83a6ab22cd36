//! HTTP/2 binary codec
//!
//! Frame-level parsing/packing, HPACK header compression and a
//! connection-level driver, all sans-I/O. The layer gives callers the
//! same byte-level control as the HTTP/1 side: frames can be built with
//! arbitrary lengths, flags and stream ids, and header blocks can be
//! packed representation by representation.
//!
//! # Architecture
//!
//! - [`wire`] - big-endian tokenizer/packer primitives with rollback,
//!   underlying every HTTP/2 structure
//! - [`frame`] - the 9-byte frame header, frame model and incremental
//!   [`frame::FrameParser`]
//! - [`hpack`] - static/dynamic tables, integer and string primitives,
//!   Huffman coding, [`hpack::HeadersParser`] and
//!   [`hpack::HeaderPacker`]
//! - [`settings`] - SETTINGS parameter map and its wire form
//! - [`connection`] - preface validation, frame dispatch, and
//!   HEADERS/CONTINUATION assembly into structured messages

pub mod connection;
pub mod error;
pub mod frame;
pub mod hpack;
pub mod settings;
pub mod wire;

pub use connection::{ConnectionEvent, ConnectionParser, Role};
pub use error::{Error, ErrorCode, Result};
pub use frame::{Frame, FrameFlags, FrameParser, FrameType};
pub use hpack::{HeaderPacker, HeadersParser};
pub use settings::Settings;

/// HTTP/2 connection preface that must be sent by clients
///
/// From RFC 7540 Section 3.5:
/// "PRI * HTTP/2.0\r\n\r\nSM\r\n\r\n"
pub const CONNECTION_PREFACE: &[u8] = b"PRI * HTTP/2.0\r\n\r\nSM\r\n\r\n";

/// Default initial window size (65535 bytes)
pub const DEFAULT_INITIAL_WINDOW_SIZE: u32 = 65535;

/// Default maximum frame size (16384 bytes)
pub const DEFAULT_MAX_FRAME_SIZE: u32 = 16384;

/// Default header table size (4096 bytes)
pub const DEFAULT_HEADER_TABLE_SIZE: u32 = 4096;

/// Maximum stream ID value (2^31 - 1)
pub const MAX_STREAM_ID: u32 = 0x7FFFFFFF;

/// Stream ID 0 (connection-level)
pub const CONNECTION_STREAM_ID: u32 = 0;
