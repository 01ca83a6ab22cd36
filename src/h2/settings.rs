//! HTTP/2 settings management
//!
//! SETTINGS parameters and their wire form as defined in RFC 7540
//! Section 6.5. Unknown parameter ids are retained rather than
//! rejected - a probing tool wants to see what the peer sent.

use super::error::{Error, Result};
use super::wire::{Packer, Tokenizer};
use std::fmt;
use tracing::debug;

/// HTTP/2 settings parameters (RFC 7540 Section 6.5.2)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum SettingsParameter {
    /// SETTINGS_HEADER_TABLE_SIZE (0x1)
    HeaderTableSize = 0x1,

    /// SETTINGS_ENABLE_PUSH (0x2)
    EnablePush = 0x2,

    /// SETTINGS_MAX_CONCURRENT_STREAMS (0x3)
    MaxConcurrentStreams = 0x3,

    /// SETTINGS_INITIAL_WINDOW_SIZE (0x4)
    InitialWindowSize = 0x4,

    /// SETTINGS_MAX_FRAME_SIZE (0x5)
    MaxFrameSize = 0x5,

    /// SETTINGS_MAX_HEADER_LIST_SIZE (0x6)
    MaxHeaderListSize = 0x6,
}

impl SettingsParameter {
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x1 => Some(SettingsParameter::HeaderTableSize),
            0x2 => Some(SettingsParameter::EnablePush),
            0x3 => Some(SettingsParameter::MaxConcurrentStreams),
            0x4 => Some(SettingsParameter::InitialWindowSize),
            0x5 => Some(SettingsParameter::MaxFrameSize),
            0x6 => Some(SettingsParameter::MaxHeaderListSize),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SettingsParameter::HeaderTableSize => "HEADER_TABLE_SIZE",
            SettingsParameter::EnablePush => "ENABLE_PUSH",
            SettingsParameter::MaxConcurrentStreams => "MAX_CONCURRENT_STREAMS",
            SettingsParameter::InitialWindowSize => "INITIAL_WINDOW_SIZE",
            SettingsParameter::MaxFrameSize => "MAX_FRAME_SIZE",
            SettingsParameter::MaxHeaderListSize => "MAX_HEADER_LIST_SIZE",
        }
    }
}

impl fmt::Display for SettingsParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:x})", self.name(), self.as_u16())
    }
}

/// HTTP/2 settings map.
///
/// Known parameters are typed; unknown ids are kept in arrival order.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub header_table_size: Option<u32>,
    pub enable_push: Option<bool>,
    pub max_concurrent_streams: Option<u32>,
    pub initial_window_size: Option<u32>,
    pub max_frame_size: Option<u32>,
    pub max_header_list_size: Option<u32>,
    unknown: Vec<(u16, u32)>,
}

impl Settings {
    /// Create empty settings
    pub fn new() -> Self {
        Settings::default()
    }

    /// Get header table size (with protocol default)
    pub fn get_header_table_size(&self) -> u32 {
        self.header_table_size.unwrap_or(4096)
    }

    /// Get enable push (with protocol default)
    pub fn get_enable_push(&self) -> bool {
        self.enable_push.unwrap_or(true)
    }

    /// Get initial window size (with protocol default)
    pub fn get_initial_window_size(&self) -> u32 {
        self.initial_window_size.unwrap_or(65535)
    }

    /// Get max frame size (with protocol default)
    pub fn get_max_frame_size(&self) -> u32 {
        self.max_frame_size.unwrap_or(16384)
    }

    /// Unknown parameter ids received, in arrival order.
    pub fn unknown(&self) -> &[(u16, u32)] {
        &self.unknown
    }

    /// Apply one parameter, validating the value ranges the RFC
    /// defines. Unknown ids are retained and logged.
    pub fn apply(&mut self, id: u16, value: u32) -> Result<()> {
        match SettingsParameter::from_u16(id) {
            Some(SettingsParameter::HeaderTableSize) => self.header_table_size = Some(value),
            Some(SettingsParameter::EnablePush) => {
                if value > 1 {
                    return Err(Error::InvalidSettings(format!(
                        "ENABLE_PUSH must be 0 or 1, got {}",
                        value
                    )));
                }
                self.enable_push = Some(value == 1);
            }
            Some(SettingsParameter::MaxConcurrentStreams) => {
                self.max_concurrent_streams = Some(value)
            }
            Some(SettingsParameter::InitialWindowSize) => {
                if value > 0x7FFF_FFFF {
                    return Err(Error::InvalidSettings(format!(
                        "initial window size {} exceeds maximum (2^31-1)",
                        value
                    )));
                }
                self.initial_window_size = Some(value);
            }
            Some(SettingsParameter::MaxFrameSize) => {
                if !(16384..=16_777_215).contains(&value) {
                    return Err(Error::InvalidSettings(format!(
                        "max frame size {} outside 2^14..2^24-1",
                        value
                    )));
                }
                self.max_frame_size = Some(value);
            }
            Some(SettingsParameter::MaxHeaderListSize) => self.max_header_list_size = Some(value),
            None => {
                debug!(id, value, "retaining unknown settings parameter");
                self.unknown.push((id, value));
            }
        }
        Ok(())
    }

    /// Apply a SETTINGS frame payload (6 bytes per entry).
    ///
    /// The caller has already verified the payload length is a
    /// multiple of 6.
    pub fn apply_payload(&mut self, payload: &[u8]) -> Result<()> {
        let mut tok = Tokenizer::from_bytes(payload);
        while !tok.is_empty() {
            let id = tok.u16()?;
            let value = tok.u32()?;
            self.apply(id, value)?;
        }
        Ok(())
    }

    /// Serialize every set parameter into SETTINGS payload form.
    pub fn encode_payload(&self) -> Vec<u8> {
        let entries = [
            (SettingsParameter::HeaderTableSize, self.header_table_size),
            (
                SettingsParameter::EnablePush,
                self.enable_push.map(u32::from),
            ),
            (
                SettingsParameter::MaxConcurrentStreams,
                self.max_concurrent_streams,
            ),
            (
                SettingsParameter::InitialWindowSize,
                self.initial_window_size,
            ),
            (SettingsParameter::MaxFrameSize, self.max_frame_size),
            (
                SettingsParameter::MaxHeaderListSize,
                self.max_header_list_size,
            ),
        ];
        let mut packer = Packer::new();
        for (id, value) in entries {
            if let Some(value) = value {
                packer.u16(id.as_u16()).u32(value);
            }
        }
        for (id, value) in &self.unknown {
            packer.u16(*id).u32(*value);
        }
        packer.into_bytes().to_vec()
    }
}
