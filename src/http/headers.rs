//! HTTP header section
//!
//! An ordered collection of fields with case-insensitive lookups,
//! duplicate preservation, and byte-exact re-serialization of an
//! unmodified received header block.

use super::field::Field;
use std::fmt;

/// Default cap on the number of header fields per message.
pub const DEFAULT_MAX_FIELDS: usize = 64;

/// HTTP header section.
///
/// Fields are stored in insertion order and duplicates are preserved.
/// On top of the plain field list sit two deferred mutation mechanisms:
///
/// - *overwrite* fields added with [`Header::set`] always win over any
///   same-named field regardless of insertion order, and
/// - *removal filters* added with [`Header::remove`] drop every
///   same-named field.
///
/// Both are applied at [`Header::finalize`] time, so a parsed header can
/// be inspected as received right up until the message is re-serialized.
///
/// `raw()` returns the exact bytes last received while the header is
/// unmodified; any mutation drops the cache and `raw()` joins the
/// surviving fields instead.
#[derive(Debug, Clone)]
pub struct Header {
    fields: Vec<Field>,
    overwrites: Vec<Field>,
    removals: Vec<String>,
    raw: Option<Vec<u8>>,
    max_fields: usize,
}

impl Header {
    /// Create an empty header section.
    pub fn new() -> Self {
        Header::with_limit(DEFAULT_MAX_FIELDS)
    }

    /// Create an empty header section with a field-count cap.
    pub fn with_limit(max_fields: usize) -> Self {
        Header {
            fields: Vec::new(),
            overwrites: Vec::new(),
            removals: Vec::new(),
            raw: None,
            max_fields,
        }
    }

    /// Append an already-built field, as the parser does.
    ///
    /// Fields beyond the cap are silently dropped.
    pub fn push(&mut self, field: Field) {
        if self.fields.len() >= self.max_fields {
            return;
        }
        self.fields.push(field);
    }

    /// Append a fresh field with canonical separators.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.raw = None;
        self.push(Field::new(name, value));
    }

    /// Register an overwrite field: it replaces every same-named field
    /// at finalize time and wins all lookups immediately.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.raw = None;
        self.overwrites.push(Field::new(name, value));
    }

    /// Register a removal filter for a header name, applied at finalize.
    pub fn remove(&mut self, name: impl Into<String>) {
        self.raw = None;
        self.removals.push(name.into().to_ascii_lowercase());
    }

    /// Get the first value for a name (case-insensitive).
    ///
    /// Overwrite fields win; among them the most recent.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.overwrites
            .iter()
            .rev()
            .find(|f| f.matches(name))
            .or_else(|| self.fields.iter().find(|f| f.matches(name)))
            .and_then(|f| f.value_str())
    }

    /// Get all values for a name, in insertion order.
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        if let Some(over) = self.overwrites.iter().rev().find(|f| f.matches(name)) {
            return over.value_str().into_iter().collect();
        }
        self.fields
            .iter()
            .filter(|f| f.matches(name))
            .filter_map(|f| f.value_str())
            .collect()
    }

    /// Check if a header name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.overwrites.iter().any(|f| f.matches(name))
            || self.fields.iter().any(|f| f.matches(name))
    }

    /// Count fields with the given name.
    pub fn count(&self, name: &str) -> usize {
        self.fields.iter().filter(|f| f.matches(name)).count()
    }

    /// Number of fields (not counting pending overwrites).
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when there are no fields at all.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.overwrites.is_empty()
    }

    /// The ordered field list.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Iterate over parseable `(name, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .filter_map(|f| Some((f.name_str()?, f.value_str()?)))
    }

    /// Record the exact header-block bytes as received.
    pub(crate) fn set_raw(&mut self, bytes: Vec<u8>) {
        self.raw = Some(bytes);
    }

    /// Serialized header block.
    ///
    /// Returns the exact bytes last received if the header has not been
    /// modified since, otherwise a fresh join of all fields.
    pub fn raw(&self) -> Vec<u8> {
        if let Some(raw) = &self.raw {
            return raw.clone();
        }
        let mut out = Vec::new();
        for field in &self.fields {
            field.write_to(&mut out);
        }
        for field in &self.overwrites {
            field.write_to(&mut out);
        }
        out
    }

    /// Apply removal filters and overwrites, then finalize every field.
    pub fn finalize(&mut self) {
        if !self.removals.is_empty() {
            let removals = std::mem::take(&mut self.removals);
            self.raw = None;
            self.fields
                .retain(|f| !f.key().map_or(false, |k| removals.contains(&k)));
        }
        if !self.overwrites.is_empty() {
            self.raw = None;
            for over in std::mem::take(&mut self.overwrites) {
                self.fields.retain(|f| match over.name_str() {
                    Some(name) => !f.matches(name),
                    None => true,
                });
                self.fields.push(over);
            }
        }
        for field in &mut self.fields {
            field.finalize();
        }
    }
}

impl Default for Header {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.raw()))
    }
}
