//! Transfer-coding codecs
//!
//! Chunked and identity encoders/decoders operating on top of the body
//! buffer. Decoders are resumable: a state that cannot match against
//! the bytes buffered so far defers without consuming anything, and the
//! caller simply feeds more bytes later.

use super::body::Body;
use super::{Error, Result, CRLF};
use tracing::trace;

/// Find the next LF in a buffer, returning the index past it and the
/// length of the line's content (terminator excluded).
fn find_line(buf: &[u8]) -> Option<(usize, usize)> {
    let lf = buf.iter().position(|&b| b == b'\n')?;
    let content_len = if lf > 0 && buf[lf - 1] == b'\r' { lf - 1 } else { lf };
    Some((lf + 1, content_len))
}

/// Body decoder selected by the parser's length policy.
#[derive(Debug)]
pub enum BodyDecoder {
    Chunked(ChunkedDecoder),
    Identity(IdentityDecoder),
}

impl BodyDecoder {
    /// Chunked transfer-coding decoder.
    pub fn chunked() -> Self {
        BodyDecoder::Chunked(ChunkedDecoder::new())
    }

    /// Identity decoder, bounded by a known length or unbounded.
    pub fn identity(limit: Option<usize>) -> Self {
        BodyDecoder::Identity(IdentityDecoder::new(limit))
    }

    /// Feed raw bytes, decoding into `body` as far as possible.
    pub fn decode(&mut self, input: &[u8], body: &mut Body) -> Result<()> {
        match self {
            BodyDecoder::Chunked(d) => d.decode(input, body),
            BodyDecoder::Identity(d) => d.decode(input, body),
        }
    }

    /// True once the coded body has been fully decoded.
    pub fn decoded_all(&self) -> bool {
        match self {
            BodyDecoder::Chunked(d) => d.decoded_all(),
            BodyDecoder::Identity(d) => d.decoded_all(),
        }
    }

    /// Deliver the EOF signal for an unbounded identity body.
    pub fn finish(&mut self, body: &mut Body) {
        if let BodyDecoder::Identity(d) = self {
            d.finish(body);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkedState {
    SizeLine,
    Data,
    Delimiter,
    Trailers,
    Done,
}

/// Chunked transfer-coding decoder.
///
/// States: read a hex size line, read that many data bytes, read the
/// CRLF delimiter, repeat; a zero-size chunk switches to the trailer
/// section, which ends at the first empty line. Chunk extensions after
/// `;` are ignored, trailer fields are skipped.
#[derive(Debug)]
pub struct ChunkedDecoder {
    buf: Vec<u8>,
    state: ChunkedState,
    remaining: usize,
}

impl ChunkedDecoder {
    pub fn new() -> Self {
        ChunkedDecoder {
            buf: Vec::new(),
            state: ChunkedState::SizeLine,
            remaining: 0,
        }
    }

    pub fn decode(&mut self, input: &[u8], body: &mut Body) -> Result<()> {
        self.buf.extend_from_slice(input);

        loop {
            match self.state {
                ChunkedState::SizeLine => {
                    let Some((line_end, content_len)) = find_line(&self.buf) else {
                        return Ok(());
                    };
                    let line = String::from_utf8_lossy(&self.buf[..content_len]).to_string();
                    let size_str = line.split(';').next().unwrap_or("").trim();
                    let size = usize::from_str_radix(size_str, 16)
                        .map_err(|_| Error::InvalidChunkSize(size_str.to_string()))?;
                    self.buf.drain(..line_end);
                    if size == 0 {
                        self.state = ChunkedState::Trailers;
                    } else {
                        self.remaining = size;
                        self.state = ChunkedState::Data;
                    }
                }

                ChunkedState::Data => {
                    let take = self.remaining.min(self.buf.len());
                    body.append(&self.buf[..take]);
                    self.buf.drain(..take);
                    self.remaining -= take;
                    if self.remaining > 0 {
                        return Ok(());
                    }
                    self.state = ChunkedState::Delimiter;
                }

                ChunkedState::Delimiter => {
                    if self.buf.len() < 2 {
                        return Ok(());
                    }
                    if &self.buf[..2] != b"\r\n" {
                        return Err(Error::Protocol("expected CRLF after chunk data".into()));
                    }
                    self.buf.drain(..2);
                    self.state = ChunkedState::SizeLine;
                }

                ChunkedState::Trailers => {
                    let Some((line_end, content_len)) = find_line(&self.buf) else {
                        return Ok(());
                    };
                    if content_len == 0 {
                        self.buf.drain(..line_end);
                        self.state = ChunkedState::Done;
                        body.mark_complete();
                    } else {
                        trace!(len = content_len, "skipping chunked trailer line");
                        self.buf.drain(..line_end);
                    }
                }

                ChunkedState::Done => return Ok(()),
            }
        }
    }

    pub fn decoded_all(&self) -> bool {
        self.state == ChunkedState::Done
    }
}

impl Default for ChunkedDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Identity (pass-through) decoder.
///
/// Bounded by a known content length, or unbounded until [`finish`]
/// delivers the connection-close EOF signal.
///
/// [`finish`]: IdentityDecoder::finish
#[derive(Debug)]
pub struct IdentityDecoder {
    limit: Option<usize>,
    seen: usize,
    done: bool,
}

impl IdentityDecoder {
    pub fn new(limit: Option<usize>) -> Self {
        IdentityDecoder {
            limit,
            seen: 0,
            done: limit == Some(0),
        }
    }

    pub fn decode(&mut self, input: &[u8], body: &mut Body) -> Result<()> {
        let take = match self.limit {
            Some(limit) => input.len().min(limit - self.seen),
            None => input.len(),
        };
        body.append(&input[..take]);
        self.seen += take;
        if self.limit == Some(self.seen) {
            self.done = true;
        }
        Ok(())
    }

    pub fn decoded_all(&self) -> bool {
        self.done
    }

    pub fn finish(&mut self, body: &mut Body) {
        if self.limit.is_none() {
            body.mark_complete();
            self.done = true;
        }
    }
}

/// Chunked transfer-coding encoder.
///
/// `encode()` may be called repeatedly; `finish()` emits the zero-size
/// last chunk and permanently closes the encoder. Encoding after close
/// is a caller defect and panics.
#[derive(Debug, Default)]
pub struct ChunkedEncoder {
    closed: bool,
}

impl ChunkedEncoder {
    pub fn new() -> Self {
        ChunkedEncoder::default()
    }

    /// Encode one chunk. Empty input produces no output: a bare zero
    /// size line would terminate the body early.
    pub fn encode(&mut self, data: &[u8]) -> Vec<u8> {
        assert!(!self.closed, "encode on a finished ChunkedEncoder");
        if data.is_empty() {
            return Vec::new();
        }
        let mut out = format!("{:x}{}", data.len(), CRLF).into_bytes();
        out.extend_from_slice(data);
        out.extend_from_slice(CRLF.as_bytes());
        out
    }

    /// Emit the terminating zero-size chunk and close the encoder.
    pub fn finish(&mut self) -> Vec<u8> {
        assert!(!self.closed, "finish on a finished ChunkedEncoder");
        self.closed = true;
        format!("0{}{}", CRLF, CRLF).into_bytes()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Identity (pass-through) encoder, for symmetry with the decoder side.
#[derive(Debug, Default)]
pub struct IdentityEncoder {
    closed: bool,
}

impl IdentityEncoder {
    pub fn new() -> Self {
        IdentityEncoder::default()
    }

    pub fn encode(&mut self, data: &[u8]) -> Vec<u8> {
        assert!(!self.closed, "encode on a finished IdentityEncoder");
        data.to_vec()
    }

    pub fn finish(&mut self) -> Vec<u8> {
        assert!(!self.closed, "finish on a finished IdentityEncoder");
        self.closed = true;
        Vec::new()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}
