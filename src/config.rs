//! Codec configuration
//!
//! All tunables are carried in an explicit, immutable value handed to
//! codec constructors. There is no global configuration state.

/// Configuration shared by the HTTP/1 and HTTP/2 codecs.
///
/// The defaults match the protocol defaults (RFC 7540 Section 6.5.2 for
/// the HPACK table size) and the limits the test framework has always
/// used for HTTP/1 headers.
#[derive(Debug, Clone, Copy)]
pub struct CodecConfig {
    /// Capacity of the HPACK dynamic table in octets.
    pub header_table_size: usize,

    /// Whether the HPACK packer Huffman-codes string literals.
    pub huffman: bool,

    /// Upper bound on an accumulated HEADERS+CONTINUATION block.
    pub max_header_block: usize,

    /// Maximum number of header fields per HTTP/1 message.
    pub max_headers: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        CodecConfig {
            header_table_size: 4096,
            huffman: true,
            max_header_block: 256 * 1024,
            max_headers: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CodecConfig::default();
        assert_eq!(config.header_table_size, 4096);
        assert!(config.huffman);
        assert_eq!(config.max_headers, 64);
    }
}
