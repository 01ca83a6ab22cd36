//! wireprobe - programmable HTTP protocol engine
//!
//! This crate provides the message codec underneath HTTP test agents:
//! incremental parsing and generation of HTTP/1.x messages and HTTP/2
//! binary framing with HPACK header compression. It gives the caller
//! byte-level control over every part of a message, including the
//! ability to construct intentionally malformed traffic, while still
//! parsing whatever a peer sends back.
//!
//! # Architecture
//!
//! The codec is sans-I/O: raw bytes are fed in arbitrary-sized chunks
//! and structured messages come out. Anything that cannot complete with
//! the bytes buffered so far signals "insufficient input" without
//! consuming state, and the caller retries after appending more bytes.
//! Socket wiring, transaction lifecycle and test scheduling live in the
//! layer above this crate.
//!
//! - [`http`] - HTTP/1.x message model, incremental parser and writer,
//!   chunked/identity transfer codecs
//! - [`h2`] - HTTP/2 frame layer, HPACK compression and the
//!   connection-level driver
//! - [`config`] - explicit codec configuration passed into constructors

pub mod config;
pub mod h2;
pub mod http;
