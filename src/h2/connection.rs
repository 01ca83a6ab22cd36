//! Connection-level HTTP/2 driver
//!
//! Preface validation, frame dispatch and HEADERS/CONTINUATION
//! assembly into structured messages. The driver is sans-I/O: feed it
//! bytes, collect events. Stream lifecycle, flow-control accounting
//! and transaction scheduling belong to the layer above.

use super::error::{Error, ErrorCode, Result};
use super::frame::{pack_frame, read_frame, Frame, FrameFlags, FrameType};
use super::hpack::HeadersParser;
use super::settings::Settings;
use super::wire::{Packer, Tokenizer};
use super::CONNECTION_PREFACE;
use crate::config::CodecConfig;
use crate::http::Message;
use bytes::Bytes;
use tracing::{debug, trace};

/// Which end of the connection this driver models.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Server side: expects the client preface, decodes requests.
    Server,
    /// Client side: no preface expected, decodes responses.
    Client,
}

/// Events produced while consuming connection bytes.
#[derive(Debug)]
pub enum ConnectionEvent {
    /// A complete header block decoded into a structured message.
    Message {
        stream_id: u32,
        end_stream: bool,
        message: Message,
    },
    /// DATA frame payload, padding stripped.
    Data {
        stream_id: u32,
        data: Bytes,
        end_stream: bool,
    },
    /// SETTINGS frame applied to [`ConnectionParser::remote_settings`].
    Settings { ack: bool },
    /// PING frame.
    Ping { ack: bool, data: [u8; 8] },
    /// RST_STREAM frame.
    RstStream { stream_id: u32, error_code: u32 },
    /// GOAWAY frame.
    GoAway {
        last_stream_id: u32,
        error_code: u32,
    },
    /// WINDOW_UPDATE frame.
    WindowUpdate { stream_id: u32, increment: u32 },
}

/// Sans-I/O driver for one HTTP/2 connection direction.
#[derive(Debug)]
pub struct ConnectionParser {
    role: Role,
    config: CodecConfig,
    tok: Tokenizer,
    preface_done: bool,
    hpack: HeadersParser,
    settings: Settings,
    pending_block: Vec<u8>,
    pending_stream: Option<u32>,
    pending_end_stream: bool,
}

impl ConnectionParser {
    pub fn new(role: Role, config: CodecConfig) -> Self {
        ConnectionParser {
            role,
            config,
            tok: Tokenizer::new(),
            preface_done: role == Role::Client,
            hpack: HeadersParser::new(&config),
            settings: Settings::new(),
            pending_block: Vec::new(),
            pending_stream: None,
            pending_end_stream: false,
        }
    }

    /// Server-side driver with default configuration.
    pub fn server() -> Self {
        ConnectionParser::new(Role::Server, CodecConfig::default())
    }

    /// Client-side driver with default configuration.
    pub fn client() -> Self {
        ConnectionParser::new(Role::Client, CodecConfig::default())
    }

    /// Settings the peer has declared so far.
    pub fn remote_settings(&self) -> &Settings {
        &self.settings
    }

    /// The HPACK decoder state for this connection.
    pub fn hpack(&self) -> &HeadersParser {
        &self.hpack
    }

    /// Feed connection bytes, returning the events they complete.
    ///
    /// A wrong preface is a protocol-level rejection
    /// ([`Error::InvalidPreface`]), not a parse wait: answer with
    /// [`ConnectionParser::rejection_goaway`] and tear down. Any error
    /// drops events parsed earlier in the same call; the connection is
    /// being torn down at that point anyway.
    pub fn feed(&mut self, data: &[u8]) -> Result<Vec<ConnectionEvent>> {
        self.tok.feed(data);
        let mut events = Vec::new();

        if !self.preface_done {
            match self.tok.skip_exact(CONNECTION_PREFACE) {
                Ok(()) => {
                    trace!("connection preface received");
                    self.preface_done = true;
                }
                Err(Error::Incomplete) => return Ok(events),
                Err(_) => return Err(Error::InvalidPreface),
            }
        }

        loop {
            let checkpoint = self.tok.checkpoint();
            let frame = match read_frame(&mut self.tok) {
                Ok(frame) => frame,
                Err(Error::Incomplete) => {
                    self.tok.rollback(checkpoint);
                    break;
                }
                Err(err) => return Err(err),
            };
            self.handle_frame(frame, &mut events)?;
        }
        self.tok.compact();
        Ok(events)
    }

    /// GOAWAY bytes for rejecting a connection at stream 0.
    pub fn rejection_goaway(&self) -> Bytes {
        pack_goaway(0, ErrorCode::ProtocolError, b"")
    }

    fn handle_frame(&mut self, frame: Frame, events: &mut Vec<ConnectionEvent>) -> Result<()> {
        trace!(
            frame_type = %frame.frame_type,
            stream_id = frame.stream_id,
            len = frame.payload_len(),
            "frame received"
        );

        if self.pending_stream.is_some() && frame.frame_type != FrameType::Continuation {
            return Err(Error::Protocol(
                "expected CONTINUATION while header block is open".into(),
            ));
        }

        match frame.frame_type {
            FrameType::Settings => self.on_settings(frame, events),
            FrameType::Headers => self.on_headers(frame, events),
            FrameType::Continuation => self.on_continuation(frame, events),
            FrameType::Data => {
                if frame.stream_id == 0 {
                    return Err(Error::Protocol("DATA frame on stream 0".into()));
                }
                let data = strip_padding(&frame)?;
                events.push(ConnectionEvent::Data {
                    stream_id: frame.stream_id,
                    data,
                    end_stream: frame.flags.is_end_stream(),
                });
                Ok(())
            }
            FrameType::RstStream => {
                let mut tok = Tokenizer::from_bytes(&frame.payload);
                let error_code = tok
                    .u32()
                    .map_err(|_| Error::FrameSize("RST_STREAM payload too short".into()))?;
                events.push(ConnectionEvent::RstStream {
                    stream_id: frame.stream_id,
                    error_code,
                });
                Ok(())
            }
            FrameType::Goaway => {
                let mut tok = Tokenizer::from_bytes(&frame.payload);
                let (last_stream_id, error_code) = (|| -> Result<(u32, u32)> {
                    let (_, last) = tok.u1p31()?;
                    Ok((last, tok.u32()?))
                })()
                .map_err(|_| Error::FrameSize("GOAWAY payload too short".into()))?;
                events.push(ConnectionEvent::GoAway {
                    last_stream_id,
                    error_code,
                });
                Ok(())
            }
            FrameType::WindowUpdate => {
                let mut tok = Tokenizer::from_bytes(&frame.payload);
                let (_, increment) = tok
                    .u1p31()
                    .map_err(|_| Error::FrameSize("WINDOW_UPDATE payload too short".into()))?;
                events.push(ConnectionEvent::WindowUpdate {
                    stream_id: frame.stream_id,
                    increment,
                });
                Ok(())
            }
            FrameType::Ping => {
                if frame.payload.len() < 8 {
                    return Err(Error::FrameSize("PING payload too short".into()));
                }
                let mut data = [0u8; 8];
                data.copy_from_slice(&frame.payload[..8]);
                events.push(ConnectionEvent::Ping {
                    ack: frame.flags.is_ack(),
                    data,
                });
                Ok(())
            }
            FrameType::Priority | FrameType::PushPromise => {
                trace!(frame_type = %frame.frame_type, "ignoring frame");
                Ok(())
            }
            FrameType::Unknown(byte) => {
                debug!(frame_type = byte, "ignoring unknown frame type");
                Ok(())
            }
        }
    }

    fn on_settings(&mut self, frame: Frame, events: &mut Vec<ConnectionEvent>) -> Result<()> {
        if frame.stream_id != 0 {
            return Err(Error::Protocol("SETTINGS frame on nonzero stream".into()));
        }
        if frame.flags.is_ack() {
            if !frame.payload.is_empty() {
                return Err(Error::FrameSize("SETTINGS ACK with payload".into()));
            }
            events.push(ConnectionEvent::Settings { ack: true });
            return Ok(());
        }
        if frame.payload.len() % 6 != 0 {
            return Err(Error::FrameSize(format!(
                "SETTINGS payload length {} not a multiple of 6",
                frame.payload.len()
            )));
        }
        self.settings.apply_payload(&frame.payload)?;
        events.push(ConnectionEvent::Settings { ack: false });
        Ok(())
    }

    fn on_headers(&mut self, frame: Frame, events: &mut Vec<ConnectionEvent>) -> Result<()> {
        if frame.stream_id == 0 {
            return Err(Error::Protocol("HEADERS frame on stream 0".into()));
        }
        let fragment = strip_headers_payload(&frame)?;

        if frame.flags.is_end_headers() {
            let message = self.decode_message(&fragment)?;
            events.push(ConnectionEvent::Message {
                stream_id: frame.stream_id,
                end_stream: frame.flags.is_end_stream(),
                message,
            });
        } else {
            self.check_block_limit(fragment.len())?;
            self.pending_stream = Some(frame.stream_id);
            self.pending_end_stream = frame.flags.is_end_stream();
            self.pending_block = fragment.to_vec();
        }
        Ok(())
    }

    fn on_continuation(&mut self, frame: Frame, events: &mut Vec<ConnectionEvent>) -> Result<()> {
        let Some(pending) = self.pending_stream else {
            return Err(Error::Protocol(format!(
                "CONTINUATION without open header block on stream {}",
                frame.stream_id
            )));
        };
        if pending != frame.stream_id {
            return Err(Error::Protocol(format!(
                "CONTINUATION for stream {} while header block open on stream {}",
                frame.stream_id, pending
            )));
        }
        self.check_block_limit(self.pending_block.len() + frame.payload.len())?;
        self.pending_block.extend_from_slice(&frame.payload);

        if frame.flags.is_end_headers() {
            let block = std::mem::take(&mut self.pending_block);
            let end_stream = self.pending_end_stream;
            self.pending_stream = None;
            self.pending_end_stream = false;
            let message = self.decode_message(&block)?;
            events.push(ConnectionEvent::Message {
                stream_id: frame.stream_id,
                end_stream,
                message,
            });
        }
        Ok(())
    }

    fn check_block_limit(&self, size: usize) -> Result<()> {
        if size > self.config.max_header_block {
            return Err(Error::Protocol(format!(
                "header block exceeds {} bytes",
                self.config.max_header_block
            )));
        }
        Ok(())
    }

    /// HPACK-decode a complete block into a structured message.
    ///
    /// Pseudo-headers populate the start line; `:scheme`, `:authority`
    /// and all regular fields land in the header section.
    fn decode_message(&mut self, block: &[u8]) -> Result<Message> {
        let fields = self.hpack.decode_block(block)?;
        let mut message = match self.role {
            Role::Server => Message::request(),
            Role::Client => Message::response(),
        };
        for (name, value) in fields {
            match (self.role, name.as_str()) {
                (Role::Server, ":method") => message.start_line_mut().set_token(0, value),
                (Role::Server, ":path") => message.start_line_mut().set_token(1, value),
                (Role::Client, ":status") => message.start_line_mut().set_token(1, value),
                _ => message.header_mut().add(name, value),
            }
        }
        Ok(message)
    }
}

/// Pack a GOAWAY frame.
pub fn pack_goaway(last_stream_id: u32, error_code: ErrorCode, debug_data: &[u8]) -> Bytes {
    let mut payload = Packer::new();
    payload
        .u1p31(false, last_stream_id)
        .u32(error_code.as_u32())
        .area(debug_data);
    pack_frame(
        FrameType::Goaway,
        FrameFlags::empty(),
        0,
        payload.as_slice(),
    )
}

/// Strip the PADDED envelope from a DATA payload.
fn strip_padding(frame: &Frame) -> Result<Bytes> {
    if !frame.flags.is_padded() {
        return Ok(frame.payload.clone());
    }
    if frame.payload.is_empty() {
        return Err(Error::Protocol("PADDED frame with no payload".into()));
    }
    let pad_len = frame.payload[0] as usize;
    let body = &frame.payload[1..];
    if pad_len > body.len() {
        return Err(Error::Protocol("padding longer than payload".into()));
    }
    Ok(frame.payload.slice(1..1 + (body.len() - pad_len)))
}

/// Strip PADDED and PRIORITY envelopes from a HEADERS payload.
fn strip_headers_payload(frame: &Frame) -> Result<Bytes> {
    let mut start = 0;
    let mut end = frame.payload.len();

    if frame.flags.is_padded() {
        if frame.payload.is_empty() {
            return Err(Error::Protocol("PADDED HEADERS with no payload".into()));
        }
        let pad_len = frame.payload[0] as usize;
        start = 1;
        if pad_len > end - start {
            return Err(Error::Protocol("padding longer than payload".into()));
        }
        end -= pad_len;
    }
    if frame.flags.is_priority() {
        // Stream dependency (4 bytes) + weight (1 byte).
        if end - start < 5 {
            return Err(Error::Protocol("HEADERS too short for priority".into()));
        }
        start += 5;
    }
    Ok(frame.payload.slice(start..end))
}
