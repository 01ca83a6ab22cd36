//! HTTP/2 frame layer
//!
//! Frame model and the incremental frame parser, built on the
//! tokenizer/packer in [`wire`](super::wire). Frames are always fully
//! buffered before being handed to the caller; no length validation is
//! done here beyond what the tokenizer guarantees, so the layer above
//! owns `SETTINGS_MAX_FRAME_SIZE` semantics - and a test agent can pack
//! frames that violate them on purpose.

use super::error::{Error, Result};
use super::wire::{Packer, Tokenizer};
use bytes::Bytes;
use std::fmt;

/// HTTP/2 frame header size (9 bytes)
pub const FRAME_HEADER_SIZE: usize = 9;

/// HTTP/2 frame types (RFC 7540 Section 6)
///
/// Unknown type bytes are preserved rather than rejected: the driver
/// logs and ignores them, and a parsed frame can be re-packed with the
/// same unknown type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameType {
    Data,
    Headers,
    Priority,
    RstStream,
    Settings,
    PushPromise,
    Ping,
    Goaway,
    WindowUpdate,
    Continuation,
    Unknown(u8),
}

impl FrameType {
    /// Convert frame type to u8
    pub fn as_u8(self) -> u8 {
        match self {
            FrameType::Data => 0x0,
            FrameType::Headers => 0x1,
            FrameType::Priority => 0x2,
            FrameType::RstStream => 0x3,
            FrameType::Settings => 0x4,
            FrameType::PushPromise => 0x5,
            FrameType::Ping => 0x6,
            FrameType::Goaway => 0x7,
            FrameType::WindowUpdate => 0x8,
            FrameType::Continuation => 0x9,
            FrameType::Unknown(byte) => byte,
        }
    }

    /// Create frame type from u8
    pub fn from_u8(byte: u8) -> Self {
        match byte {
            0x0 => FrameType::Data,
            0x1 => FrameType::Headers,
            0x2 => FrameType::Priority,
            0x3 => FrameType::RstStream,
            0x4 => FrameType::Settings,
            0x5 => FrameType::PushPromise,
            0x6 => FrameType::Ping,
            0x7 => FrameType::Goaway,
            0x8 => FrameType::WindowUpdate,
            0x9 => FrameType::Continuation,
            other => FrameType::Unknown(other),
        }
    }

    /// Get frame type name
    pub fn name(&self) -> &'static str {
        match self {
            FrameType::Data => "DATA",
            FrameType::Headers => "HEADERS",
            FrameType::Priority => "PRIORITY",
            FrameType::RstStream => "RST_STREAM",
            FrameType::Settings => "SETTINGS",
            FrameType::PushPromise => "PUSH_PROMISE",
            FrameType::Ping => "PING",
            FrameType::Goaway => "GOAWAY",
            FrameType::WindowUpdate => "WINDOW_UPDATE",
            FrameType::Continuation => "CONTINUATION",
            FrameType::Unknown(_) => "UNKNOWN",
        }
    }
}

impl fmt::Display for FrameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:x})", self.name(), self.as_u8())
    }
}

/// HTTP/2 frame flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameFlags(u8);

impl FrameFlags {
    /// END_STREAM flag (0x1)
    pub const END_STREAM: u8 = 0x1;

    /// ACK flag (0x1) - used for SETTINGS and PING
    pub const ACK: u8 = 0x1;

    /// END_HEADERS flag (0x4)
    pub const END_HEADERS: u8 = 0x4;

    /// PADDED flag (0x8)
    pub const PADDED: u8 = 0x8;

    /// PRIORITY flag (0x20)
    pub const PRIORITY: u8 = 0x20;

    /// Create empty flags
    pub fn empty() -> Self {
        FrameFlags(0)
    }

    /// Create from u8
    pub fn from_u8(flags: u8) -> Self {
        FrameFlags(flags)
    }

    /// Get raw u8 value
    pub fn as_u8(&self) -> u8 {
        self.0
    }

    /// Set a flag
    pub fn set(&mut self, flag: u8) {
        self.0 |= flag;
    }

    /// Check if a flag is set
    pub fn is_set(&self, flag: u8) -> bool {
        (self.0 & flag) != 0
    }

    pub fn is_end_stream(&self) -> bool {
        self.is_set(Self::END_STREAM)
    }

    pub fn is_ack(&self) -> bool {
        self.is_set(Self::ACK)
    }

    pub fn is_end_headers(&self) -> bool {
        self.is_set(Self::END_HEADERS)
    }

    pub fn is_padded(&self) -> bool {
        self.is_set(Self::PADDED)
    }

    pub fn is_priority(&self) -> bool {
        self.is_set(Self::PRIORITY)
    }
}

/// A complete HTTP/2 frame: typed, flagged, stream-scoped payload.
#[derive(Debug, Clone)]
pub struct Frame {
    pub frame_type: FrameType,
    pub flags: FrameFlags,
    pub stream_id: u32,
    pub payload: Bytes,
}

impl Frame {
    pub fn new(frame_type: FrameType, flags: FrameFlags, stream_id: u32, payload: Bytes) -> Self {
        Frame {
            frame_type,
            flags,
            stream_id,
            payload,
        }
    }

    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }
}

/// Serialize a frame: 9-byte header plus payload.
///
/// The declared length is taken from the payload; for a frame whose
/// declared length deliberately disagrees with its payload, pack the
/// header with [`pack_frame_header`] and append bytes manually.
pub fn pack_frame(
    frame_type: FrameType,
    flags: FrameFlags,
    stream_id: u32,
    payload: &[u8],
) -> Bytes {
    let mut packer = Packer::new();
    pack_frame_header_into(&mut packer, frame_type, flags, stream_id, payload.len() as u32);
    packer.area(payload);
    packer.into_bytes()
}

/// Serialize just a frame header with an arbitrary declared length.
pub fn pack_frame_header(
    frame_type: FrameType,
    flags: FrameFlags,
    stream_id: u32,
    length: u32,
) -> Bytes {
    let mut packer = Packer::new();
    pack_frame_header_into(&mut packer, frame_type, flags, stream_id, length);
    packer.into_bytes()
}

fn pack_frame_header_into(
    packer: &mut Packer,
    frame_type: FrameType,
    flags: FrameFlags,
    stream_id: u32,
    length: u32,
) {
    packer
        .u24(length)
        .u8(frame_type.as_u8())
        .u8(flags.as_u8())
        .u1p31(false, stream_id);
}

/// Read one complete frame from the tokenizer.
///
/// Raises `Incomplete` (cursor untouched by the tokenizer contract
/// after rollback in [`FrameParser::feed`]) when the header or payload
/// is not fully buffered yet.
pub(crate) fn read_frame(tok: &mut Tokenizer) -> Result<Frame> {
    let length = tok.u24()? as usize;
    let frame_type = FrameType::from_u8(tok.u8()?);
    let flags = FrameFlags::from_u8(tok.u8()?);
    let (_reserved, stream_id) = tok.u1p31()?;
    let payload = Bytes::copy_from_slice(tok.area(length)?);
    Ok(Frame::new(frame_type, flags, stream_id, payload))
}

/// Incremental frame parser.
///
/// Feed arbitrary-sized chunks; each complete frame is dispatched to
/// the handler, and unconsumed bytes are retained for the next call.
#[derive(Debug, Default)]
pub struct FrameParser {
    tok: Tokenizer,
}

impl FrameParser {
    pub fn new() -> Self {
        FrameParser::default()
    }

    /// Feed bytes, dispatching every complete frame to `handler`.
    ///
    /// A handler error aborts the loop and propagates; an incomplete
    /// trailing frame is kept buffered and is not an error.
    pub fn feed<F>(&mut self, data: &[u8], mut handler: F) -> Result<()>
    where
        F: FnMut(Frame) -> Result<()>,
    {
        self.tok.feed(data);
        loop {
            let checkpoint = self.tok.checkpoint();
            match read_frame(&mut self.tok) {
                Ok(frame) => handler(frame)?,
                Err(Error::Incomplete) => {
                    self.tok.rollback(checkpoint);
                    break;
                }
                Err(err) => return Err(err),
            }
        }
        self.tok.compact();
        Ok(())
    }

    /// Bytes buffered but not yet parsed into a frame.
    pub fn buffered(&self) -> usize {
        self.tok.remaining()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_type_conversion() {
        assert_eq!(FrameType::Data.as_u8(), 0x0);
        assert_eq!(FrameType::Continuation.as_u8(), 0x9);
        assert_eq!(FrameType::from_u8(0x4), FrameType::Settings);
        assert_eq!(FrameType::from_u8(0xff), FrameType::Unknown(0xff));
        assert_eq!(FrameType::Unknown(0xff).as_u8(), 0xff);
    }

    #[test]
    fn test_frame_flags() {
        let mut flags = FrameFlags::empty();
        assert!(!flags.is_end_stream());
        flags.set(FrameFlags::END_STREAM);
        flags.set(FrameFlags::END_HEADERS);
        assert!(flags.is_end_stream());
        assert!(flags.is_end_headers());
        assert!(!flags.is_padded());
    }

    #[test]
    fn test_pack_frame_layout() {
        let wire = pack_frame(
            FrameType::Data,
            FrameFlags::from_u8(FrameFlags::END_STREAM),
            1,
            b"Hello",
        );
        assert_eq!(&wire[0..3], &[0, 0, 5]);
        assert_eq!(wire[3], 0x0);
        assert_eq!(wire[4], 0x1);
        assert_eq!(&wire[5..9], &[0, 0, 0, 1]);
        assert_eq!(&wire[9..], b"Hello");
    }

    #[test]
    fn test_pack_parse_round_trip() {
        let wire = pack_frame(
            FrameType::Headers,
            FrameFlags::from_u8(FrameFlags::END_HEADERS),
            42,
            &[0x82, 0x86],
        );

        let mut parser = FrameParser::new();
        let mut frames = Vec::new();
        parser
            .feed(&wire, |frame| {
                frames.push(frame);
                Ok(())
            })
            .unwrap();

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].frame_type, FrameType::Headers);
        assert!(frames[0].flags.is_end_headers());
        assert_eq!(frames[0].stream_id, 42);
        assert_eq!(&frames[0].payload[..], &[0x82, 0x86]);
    }

    #[test]
    fn test_split_feed_retains_partial_frame() {
        let wire = pack_frame(FrameType::Data, FrameFlags::empty(), 1, b"hello");
        let mut parser = FrameParser::new();
        let mut count = 0;

        for byte in wire.iter() {
            parser
                .feed(std::slice::from_ref(byte), |_| {
                    count += 1;
                    Ok(())
                })
                .unwrap();
        }
        assert_eq!(count, 1);
        assert_eq!(parser.buffered(), 0);
    }

    #[test]
    fn test_multiple_frames_single_feed() {
        let mut wire = pack_frame(FrameType::Data, FrameFlags::empty(), 1, b"a").to_vec();
        wire.extend_from_slice(&pack_frame(FrameType::Ping, FrameFlags::empty(), 0, &[0; 8]));

        let mut parser = FrameParser::new();
        let mut types = Vec::new();
        parser
            .feed(&wire, |frame| {
                types.push(frame.frame_type);
                Ok(())
            })
            .unwrap();
        assert_eq!(types, vec![FrameType::Data, FrameType::Ping]);
    }

    #[test]
    fn test_reserved_stream_bit_masked() {
        let mut wire = pack_frame(FrameType::Data, FrameFlags::empty(), 0, b"").to_vec();
        // Force the reserved bit on stream id 5.
        wire[5] = 0x80;
        wire[8] = 0x05;

        let mut parser = FrameParser::new();
        let mut stream_id = None;
        parser
            .feed(&wire, |frame| {
                stream_id = Some(frame.stream_id);
                Ok(())
            })
            .unwrap();
        assert_eq!(stream_id, Some(5));
    }

    #[test]
    fn test_declared_length_mismatch_header() {
        // A header claiming 100 payload bytes can be packed standalone.
        let header = pack_frame_header(FrameType::Data, FrameFlags::empty(), 1, 100);
        assert_eq!(&header[0..3], &[0, 0, 100]);
        assert_eq!(header.len(), FRAME_HEADER_SIZE);
    }
}
