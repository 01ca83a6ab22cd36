//! HTTP/1 message serialization
//!
//! Prefix serialization (start line + header section + blank line) for
//! finalized messages. Body bytes are pulled separately through
//! [`Body::emit`](super::body::Body::emit) or one of the encoders in
//! [`coding`](super::coding), so the caller controls body framing and
//! pacing independently of the prefix.

use super::message::{Direction, Message};

fn prefix(message: &Message) -> Vec<u8> {
    let mut out = Vec::new();
    message.start_line().write_to(&mut out);
    out.extend_from_slice(&message.header().raw());
    out.extend_from_slice(message.header_delimiter());
    out
}

/// Serialize the prefix of a request message.
pub fn request_prefix(message: &Message) -> Vec<u8> {
    debug_assert_eq!(message.direction(), Direction::Request);
    prefix(message)
}

/// Serialize the prefix of a response message.
pub fn response_prefix(message: &Message) -> Vec<u8> {
    debug_assert_eq!(message.direction(), Direction::Response);
    prefix(message)
}

/// Serialize prefix plus all body bytes appended so far.
///
/// Convenience for tests and one-shot senders; streaming senders pull
/// the body themselves.
pub fn message_bytes(message: &Message) -> Vec<u8> {
    let mut out = prefix(message);
    if let Some(body) = message.body() {
        out.extend_from_slice(body.bytes());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Message;

    #[test]
    fn test_request_prefix() {
        let mut message = Message::get("/test");
        message.header_mut().add("Host", "example.com");
        message.finalize();

        let wire = request_prefix(&message);
        let text = String::from_utf8(wire).unwrap();
        assert!(text.starts_with("GET /test HTTP/1.1\r\n"));
        assert!(text.contains("Host: example.com\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_response_prefix() {
        let mut message = Message::with_status(200);
        message.header_mut().add("Content-Length", "0");
        message.finalize();

        let wire = response_prefix(&message);
        let text = String::from_utf8(wire).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Content-Length: 0\r\n"));
    }

    #[test]
    fn test_message_bytes_includes_body() {
        let mut message = Message::post("/data", b"hello".to_vec());
        message.finalize();

        let wire = message_bytes(&message);
        assert!(wire.ends_with(b"\r\n\r\nhello"));
    }
}
