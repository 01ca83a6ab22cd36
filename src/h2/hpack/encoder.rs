//! HPACK header-block encoding
//!
//! `HeaderPacker` mirrors the decoder: it keeps its own private dynamic
//! table and appends representations to an internal block. The
//! automatic path picks the most compact representation; the explicit
//! per-representation methods exist so a test agent can emit exactly
//! the bytes it wants, including representations a sane encoder never
//! would.

use super::super::error::{Error, Result};
use super::table::{find_static, find_static_name, DynamicTable, TableEntry, STATIC_TABLE_LEN};
use super::{encode_integer, encode_string};
use crate::config::CodecConfig;

/// Literal representation flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indexing {
    /// Literal with incremental indexing (01xxxxxx): inserts into the
    /// dynamic table.
    Incremental,
    /// Literal without indexing (0000xxxx).
    None,
    /// Literal never indexed (0001xxxx).
    Never,
}

/// HPACK encoder for one connection direction.
#[derive(Debug)]
pub struct HeaderPacker {
    table: DynamicTable,
    use_huffman: bool,
    block: Vec<u8>,
}

impl HeaderPacker {
    pub fn new(config: &CodecConfig) -> Self {
        HeaderPacker {
            table: DynamicTable::new(config.header_table_size),
            use_huffman: config.huffman,
            block: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        HeaderPacker {
            table: DynamicTable::new(capacity),
            use_huffman: true,
            block: Vec::new(),
        }
    }

    /// The packer's dynamic table.
    pub fn table(&self) -> &DynamicTable {
        &self.table
    }

    /// Pack one field, picking the most compact representation: an
    /// exact table match becomes an indexed field, anything else a
    /// literal with incremental indexing.
    pub fn pack_field(&mut self, name: &str, value: &str) {
        if let Some(index) = find_static(name, value).or_else(|| self.table.find(name, value)) {
            encode_integer(&mut self.block, index as u64, 7, 0x80);
            return;
        }
        self.pack_literal(name, value, Indexing::Incremental);
    }

    /// Pack every field of a list in order.
    pub fn pack_fields<'a, I>(&mut self, fields: I)
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (name, value) in fields {
            self.pack_field(name, value);
        }
    }

    /// Pack an indexed-field representation for a table index.
    ///
    /// The index must address an existing static or dynamic entry.
    pub fn pack_indexed(&mut self, index: usize) -> Result<()> {
        let valid = index >= 1
            && (index <= STATIC_TABLE_LEN
                || self.table.get(index - STATIC_TABLE_LEN - 1).is_some());
        if !valid {
            return Err(Error::InvalidIndex(index));
        }
        encode_integer(&mut self.block, index as u64, 7, 0x80);
        Ok(())
    }

    /// Pack a literal representation of the requested flavor.
    ///
    /// The name is index-referenced when the tables already know it.
    pub fn pack_literal(&mut self, name: &str, value: &str, indexing: Indexing) {
        let (prefix_bits, flags) = match indexing {
            Indexing::Incremental => (6, 0x40),
            Indexing::None => (4, 0x00),
            Indexing::Never => (4, 0x10),
        };

        let name_index = find_static_name(name).or_else(|| self.table.find_name(name));
        match name_index {
            Some(index) => {
                encode_integer(&mut self.block, index as u64, prefix_bits, flags);
            }
            None => {
                self.block.push(flags);
                encode_string(&mut self.block, name.as_bytes(), self.use_huffman);
            }
        }
        encode_string(&mut self.block, value.as_bytes(), self.use_huffman);

        if indexing == Indexing::Incremental {
            self.table.insert(TableEntry::new(name, value));
        }
    }

    /// Pack a dynamic-table-size update, resizing the packer's table.
    pub fn pack_size_update(&mut self, capacity: usize) {
        encode_integer(&mut self.block, capacity as u64, 5, 0x20);
        self.table.set_capacity(capacity);
    }

    /// Take the accumulated header block, leaving the packer ready for
    /// the next one.
    pub fn take_block(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.block)
    }

    pub fn block_len(&self) -> usize {
        self.block.len()
    }
}
