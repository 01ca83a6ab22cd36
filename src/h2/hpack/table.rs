//! HPACK indexing tables
//!
//! The RFC 7541 Appendix A static table and the per-connection,
//! capacity-bounded dynamic table. Indexing is unified and 1-based:
//! 1..=61 address the static table, 62.. the dynamic table from its
//! most recently added entry.

use std::collections::VecDeque;

/// Number of entries in the static table.
pub const STATIC_TABLE_LEN: usize = 61;

/// Per-entry size overhead (RFC 7541 Section 4.1).
pub const ENTRY_OVERHEAD: usize = 32;

/// Static table entries as defined in RFC 7541 Appendix A.
pub static STATIC_TABLE: [(&str, &str); STATIC_TABLE_LEN] = [
    (":authority", ""),                   // 1
    (":method", "GET"),                   // 2
    (":method", "POST"),                  // 3
    (":path", "/"),                       // 4
    (":path", "/index.html"),             // 5
    (":scheme", "http"),                  // 6
    (":scheme", "https"),                 // 7
    (":status", "200"),                   // 8
    (":status", "204"),                   // 9
    (":status", "206"),                   // 10
    (":status", "304"),                   // 11
    (":status", "400"),                   // 12
    (":status", "404"),                   // 13
    (":status", "500"),                   // 14
    ("accept-charset", ""),               // 15
    ("accept-encoding", "gzip, deflate"), // 16
    ("accept-language", ""),              // 17
    ("accept-ranges", ""),                // 18
    ("accept", ""),                       // 19
    ("access-control-allow-origin", ""),  // 20
    ("age", ""),                          // 21
    ("allow", ""),                        // 22
    ("authorization", ""),                // 23
    ("cache-control", ""),                // 24
    ("content-disposition", ""),          // 25
    ("content-encoding", ""),             // 26
    ("content-language", ""),             // 27
    ("content-length", ""),               // 28
    ("content-location", ""),             // 29
    ("content-range", ""),                // 30
    ("content-type", ""),                 // 31
    ("cookie", ""),                       // 32
    ("date", ""),                         // 33
    ("etag", ""),                         // 34
    ("expect", ""),                       // 35
    ("expires", ""),                      // 36
    ("from", ""),                         // 37
    ("host", ""),                         // 38
    ("if-match", ""),                     // 39
    ("if-modified-since", ""),            // 40
    ("if-none-match", ""),                // 41
    ("if-range", ""),                     // 42
    ("if-unmodified-since", ""),          // 43
    ("last-modified", ""),                // 44
    ("link", ""),                         // 45
    ("location", ""),                     // 46
    ("max-forwards", ""),                 // 47
    ("proxy-authenticate", ""),           // 48
    ("proxy-authorization", ""),          // 49
    ("range", ""),                        // 50
    ("referer", ""),                      // 51
    ("refresh", ""),                      // 52
    ("retry-after", ""),                  // 53
    ("server", ""),                       // 54
    ("set-cookie", ""),                   // 55
    ("strict-transport-security", ""),    // 56
    ("transfer-encoding", ""),            // 57
    ("user-agent", ""),                   // 58
    ("vary", ""),                         // 59
    ("via", ""),                          // 60
    ("www-authenticate", ""),             // 61
];

/// Look up a static table entry by its 1-based index.
pub fn static_entry(index: usize) -> Option<(&'static str, &'static str)> {
    if index == 0 || index > STATIC_TABLE_LEN {
        None
    } else {
        Some(STATIC_TABLE[index - 1])
    }
}

/// One dynamic-table entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableEntry {
    pub name: String,
    pub value: String,
}

impl TableEntry {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        TableEntry {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Table size contribution (RFC 7541 Section 4.1).
    pub fn size(&self) -> usize {
        self.name.len() + self.value.len() + ENTRY_OVERHEAD
    }
}

/// Capacity-bounded dynamic table, most recently added entry first.
///
/// The running size never exceeds the configured capacity; inserting an
/// entry that alone exceeds capacity empties the table (RFC 7541
/// Section 4.4).
#[derive(Debug)]
pub struct DynamicTable {
    entries: VecDeque<TableEntry>,
    size: usize,
    capacity: usize,
}

impl DynamicTable {
    pub fn new(capacity: usize) -> Self {
        DynamicTable {
            entries: VecDeque::new(),
            size: 0,
            capacity,
        }
    }

    /// Current running size in octets.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Configured capacity in octets.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Update the capacity, evicting oldest entries until within it.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        self.evict();
    }

    /// Insert at the front, evicting from the back to make room.
    pub fn insert(&mut self, entry: TableEntry) {
        let entry_size = entry.size();
        if entry_size > self.capacity {
            self.entries.clear();
            self.size = 0;
            return;
        }
        while self.size + entry_size > self.capacity {
            if let Some(evicted) = self.entries.pop_back() {
                self.size -= evicted.size();
            }
        }
        self.size += entry_size;
        self.entries.push_front(entry);
    }

    /// Entry by 0-based dynamic offset (0 = most recently added).
    pub fn get(&self, offset: usize) -> Option<&TableEntry> {
        self.entries.get(offset)
    }

    /// Unified 1-based index of an exact name/value match, if any.
    pub fn find(&self, name: &str, value: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.name == name && e.value == value)
            .map(|i| STATIC_TABLE_LEN + i + 1)
    }

    /// Unified 1-based index of a name-only match, if any.
    pub fn find_name(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.name == name)
            .map(|i| STATIC_TABLE_LEN + i + 1)
    }

    fn evict(&mut self) {
        while self.size > self.capacity {
            if let Some(evicted) = self.entries.pop_back() {
                self.size -= evicted.size();
            } else {
                break;
            }
        }
    }
}

/// Find an exact name/value match in the static table (1-based).
pub fn find_static(name: &str, value: &str) -> Option<usize> {
    STATIC_TABLE
        .iter()
        .position(|(n, v)| *n == name && *v == value)
        .map(|i| i + 1)
}

/// Find a name-only match in the static table (1-based).
pub fn find_static_name(name: &str) -> Option<usize> {
    STATIC_TABLE
        .iter()
        .position(|(n, _)| *n == name)
        .map(|i| i + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_lookups() {
        assert_eq!(static_entry(2), Some((":method", "GET")));
        assert_eq!(static_entry(61), Some(("www-authenticate", "")));
        assert_eq!(static_entry(0), None);
        assert_eq!(static_entry(62), None);

        assert_eq!(find_static(":method", "GET"), Some(2));
        assert_eq!(find_static_name("content-length"), Some(28));
        assert_eq!(find_static("x-custom", "v"), None);
    }

    #[test]
    fn test_insert_most_recent_first() {
        let mut table = DynamicTable::new(4096);
        table.insert(TableEntry::new("a", "1"));
        table.insert(TableEntry::new("b", "2"));

        assert_eq!(table.get(0).unwrap().name, "b");
        assert_eq!(table.get(1).unwrap().name, "a");
        assert_eq!(table.find("a", "1"), Some(STATIC_TABLE_LEN + 2));
    }

    #[test]
    fn test_size_accounting_and_eviction() {
        // Each "aa"/"bb" entry is 2 + 2 + 32 = 36 octets.
        let mut table = DynamicTable::new(72);
        table.insert(TableEntry::new("aa", "11"));
        table.insert(TableEntry::new("bb", "22"));
        assert_eq!(table.size(), 72);

        // Third insert evicts the oldest.
        table.insert(TableEntry::new("cc", "33"));
        assert_eq!(table.size(), 72);
        assert_eq!(table.len(), 2);
        assert!(table.find("aa", "11").is_none());
        assert_eq!(table.get(0).unwrap().name, "cc");
    }

    #[test]
    fn test_oversized_entry_empties_table() {
        let mut table = DynamicTable::new(64);
        table.insert(TableEntry::new("a", "1"));
        assert_eq!(table.len(), 1);

        let big_value = "x".repeat(100);
        table.insert(TableEntry::new("big", big_value));
        assert_eq!(table.len(), 0);
        assert_eq!(table.size(), 0);
    }

    #[test]
    fn test_set_capacity_evicts() {
        let mut table = DynamicTable::new(4096);
        table.insert(TableEntry::new("aa", "11"));
        table.insert(TableEntry::new("bb", "22"));

        table.set_capacity(36);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(0).unwrap().name, "bb");

        table.set_capacity(0);
        assert!(table.is_empty());
        assert_eq!(table.size(), 0);
    }

    #[test]
    fn test_size_invariant_holds() {
        let mut table = DynamicTable::new(100);
        for i in 0..50 {
            table.insert(TableEntry::new(format!("name-{}", i), "value"));
            assert!(table.size() <= table.capacity());
        }
    }
}
