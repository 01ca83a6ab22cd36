//! HPACK header-block decoding
//!
//! The representation state machine: one leading byte selects the
//! representation by its high bits, the rest is prefix integers and
//! string literals. The decoder owns the connection's dynamic table;
//! only this decode path mutates it.

use super::super::error::{Error, Result};
use super::super::wire::Tokenizer;
use super::table::{static_entry, DynamicTable, TableEntry, STATIC_TABLE_LEN};
use super::{decode_integer, decode_string};
use crate::config::CodecConfig;
use tracing::trace;

/// A decoded header field.
pub type HeaderField = (String, String);

/// HPACK decoder for one connection direction.
///
/// `decode_block` consumes a complete header block (the frame layer
/// has already assembled HEADERS + CONTINUATION fragments) and returns
/// the ordered field list. The dynamic table persists across blocks on
/// the same connection.
#[derive(Debug)]
pub struct HeadersParser {
    table: DynamicTable,
    /// Ceiling for dynamic-table-size updates from the peer.
    max_capacity: usize,
}

impl HeadersParser {
    pub fn new(config: &CodecConfig) -> Self {
        HeadersParser {
            table: DynamicTable::new(config.header_table_size),
            max_capacity: config.header_table_size,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        HeadersParser {
            table: DynamicTable::new(capacity),
            max_capacity: capacity,
        }
    }

    /// The decoder's dynamic table.
    pub fn table(&self) -> &DynamicTable {
        &self.table
    }

    /// Decode one complete header block.
    pub fn decode_block(&mut self, block: &[u8]) -> Result<Vec<HeaderField>> {
        let mut tok = Tokenizer::from_bytes(block);
        let mut fields = Vec::new();

        while let Some(first) = tok.peek() {
            if first & 0x80 != 0 {
                // Indexed header field.
                let index = decode_integer(&mut tok, 7)? as usize;
                fields.push(self.lookup(index)?);
            } else if first & 0xC0 == 0x40 {
                // Literal with incremental indexing.
                let (name, value) = self.literal(&mut tok, 6)?;
                self.table.insert(TableEntry::new(name.clone(), value.clone()));
                fields.push((name, value));
            } else if first & 0xE0 == 0x20 {
                // Dynamic table size update.
                let capacity = decode_integer(&mut tok, 5)? as usize;
                if capacity > self.max_capacity {
                    return Err(Error::compression(format!(
                        "table size update {} exceeds allowed {}",
                        capacity, self.max_capacity
                    )));
                }
                trace!(capacity, "dynamic table size update");
                self.table.set_capacity(capacity);
            } else {
                // Literal without indexing (0000xxxx) or never indexed
                // (0001xxxx): identical except for forwarding rules the
                // codec does not enforce.
                let (name, value) = self.literal(&mut tok, 4)?;
                fields.push((name, value));
            }
        }

        Ok(fields)
    }

    fn literal(&self, tok: &mut Tokenizer, prefix_bits: u8) -> Result<HeaderField> {
        let name_index = decode_integer(tok, prefix_bits)? as usize;
        let name = if name_index == 0 {
            String::from_utf8_lossy(&decode_string(tok)?).into_owned()
        } else {
            self.lookup(name_index)?.0
        };
        let value = String::from_utf8_lossy(&decode_string(tok)?).into_owned();
        Ok((name, value))
    }

    fn lookup(&self, index: usize) -> Result<HeaderField> {
        if index == 0 {
            return Err(Error::InvalidIndex(0));
        }
        if index <= STATIC_TABLE_LEN {
            let (name, value) = static_entry(index).ok_or(Error::InvalidIndex(index))?;
            return Ok((name.to_string(), value.to_string()));
        }
        self.table
            .get(index - STATIC_TABLE_LEN - 1)
            .map(|e| (e.name.clone(), e.value.clone()))
            .ok_or(Error::InvalidIndex(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> HeadersParser {
        HeadersParser::with_capacity(4096)
    }

    #[test]
    fn test_indexed_static_field() {
        // 0x82 = indexed, index 2 = (:method, GET).
        let fields = parser().decode_block(&[0x82]).unwrap();
        assert_eq!(fields, vec![(":method".to_string(), "GET".to_string())]);
    }

    #[test]
    fn test_rfc_c3_requests() {
        // RFC 7541 Appendix C.3: three requests on one connection,
        // without Huffman coding.
        let mut parser = parser();

        // C.3.1
        let block1 = [
            0x82, 0x86, 0x84, 0x41, 0x0f, 0x77, 0x77, 0x77, 0x2e, 0x65, 0x78, 0x61, 0x6d,
            0x70, 0x6c, 0x65, 0x2e, 0x63, 0x6f, 0x6d,
        ];
        let fields = parser.decode_block(&block1).unwrap();
        assert_eq!(
            fields,
            vec![
                (":method".into(), "GET".into()),
                (":scheme".into(), "http".into()),
                (":path".into(), "/".into()),
                (":authority".into(), "www.example.com".into()),
            ]
        );
        assert_eq!(parser.table().len(), 1);
        assert_eq!(parser.table().size(), 57);

        // C.3.2: the authority is now index 62.
        let block2 = [
            0x82, 0x86, 0x84, 0xbe, 0x58, 0x08, 0x6e, 0x6f, 0x2d, 0x63, 0x61, 0x63, 0x68,
            0x65,
        ];
        let fields = parser.decode_block(&block2).unwrap();
        assert_eq!(fields[3], (":authority".into(), "www.example.com".into()));
        assert_eq!(fields[4], ("cache-control".into(), "no-cache".into()));
        assert_eq!(parser.table().len(), 2);
    }

    #[test]
    fn test_literal_never_indexed() {
        // 0x10 prefix: literal never indexed with literal name.
        let mut block = vec![0x10];
        block.extend_from_slice(&[0x08]);
        block.extend_from_slice(b"password");
        block.extend_from_slice(&[0x06]);
        block.extend_from_slice(b"secret");

        let mut p = parser();
        let fields = p.decode_block(&block).unwrap();
        assert_eq!(fields, vec![("password".into(), "secret".into())]);
        assert_eq!(p.table().len(), 0);
    }

    #[test]
    fn test_index_zero_rejected() {
        assert!(matches!(
            parser().decode_block(&[0x80]),
            Err(Error::InvalidIndex(0))
        ));
    }

    #[test]
    fn test_index_out_of_bounds_rejected() {
        // Index 62 with an empty dynamic table.
        assert!(matches!(
            parser().decode_block(&[0xbe]),
            Err(Error::InvalidIndex(62))
        ));
    }

    #[test]
    fn test_size_update_evicts() {
        let mut p = parser();
        // Insert one entry via literal-with-indexing.
        let mut block = vec![0x40, 0x01, b'a', 0x01, b'1'];
        // Then a size update to zero (0x20 = update, value 0).
        block.push(0x20);
        p.decode_block(&block).unwrap();
        assert_eq!(p.table().len(), 0);
        assert_eq!(p.table().capacity(), 0);
    }

    #[test]
    fn test_size_update_above_limit_rejected() {
        let mut p = HeadersParser::with_capacity(256);
        // 0x3f + continuation encodes a 5-bit-prefix integer > 256.
        let block = [0x3f, 0xe1, 0x1f];
        assert!(p.decode_block(&block).is_err());
    }

    #[test]
    fn test_truncated_block_is_incomplete() {
        // Literal with indexing whose value string is cut off.
        let block = [0x40, 0x03, b'k', b'e', b'y', 0x05, b'v'];
        assert!(matches!(
            parser().decode_block(&block),
            Err(Error::Incomplete)
        ));
    }
}
