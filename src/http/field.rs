//! Header field model
//!
//! A field keeps its four wire parts - name, separator, value and line
//! terminator - independently, so a message can be re-serialized
//! byte-for-byte as received, or rebuilt with canonical separators.

use std::fmt;

/// Canonical name/value separator used for fresh fields.
pub const CANONICAL_SEPARATOR: &[u8] = b": ";

/// Canonical line terminator used for fresh fields.
pub const CANONICAL_TERMINATOR: &[u8] = b"\r\n";

/// A single header field.
///
/// All four parts are optional: a field constructed with
/// [`Field::placeholder`] has none of them until it is filled in and
/// finalized. A field parsed off the wire carries the exact bytes that
/// were received, including any unusual whitespace around the colon and
/// the original line terminator.
///
/// The identity of a field is its ASCII-lower-cased name. A line that
/// could not be parsed as `name: value` is kept as a *raw* field: the
/// whole line lives in `value`, the name stays unset, and the field
/// matches no lookup but still serializes exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Field {
    name: Option<Vec<u8>>,
    separator: Option<Vec<u8>>,
    value: Option<Vec<u8>>,
    terminator: Option<Vec<u8>>,
}

impl Field {
    /// Create an empty placeholder field.
    pub fn placeholder() -> Self {
        Field::default()
    }

    /// Create a fresh field with canonical separator and terminator.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Field {
            name: Some(name.into().into_bytes()),
            separator: Some(CANONICAL_SEPARATOR.to_vec()),
            value: Some(value.into().into_bytes()),
            terminator: Some(CANONICAL_TERMINATOR.to_vec()),
        }
    }

    /// Create a field from the exact parts received off the wire.
    pub fn from_parts(
        name: Vec<u8>,
        separator: Vec<u8>,
        value: Vec<u8>,
        terminator: Vec<u8>,
    ) -> Self {
        Field {
            name: Some(name),
            separator: Some(separator),
            value: Some(value),
            terminator: Some(terminator),
        }
    }

    /// Create a raw field preserving an unparseable header line.
    pub fn raw_line(line: Vec<u8>, terminator: Vec<u8>) -> Self {
        Field {
            name: None,
            separator: None,
            value: Some(line),
            terminator: Some(terminator),
        }
    }

    /// Field name bytes, if set.
    pub fn name(&self) -> Option<&[u8]> {
        self.name.as_deref()
    }

    /// Field name as UTF-8, if set and valid.
    pub fn name_str(&self) -> Option<&str> {
        self.name.as_deref().and_then(|n| std::str::from_utf8(n).ok())
    }

    /// Field value bytes, if set.
    pub fn value(&self) -> Option<&[u8]> {
        self.value.as_deref()
    }

    /// Field value as UTF-8, if set and valid.
    pub fn value_str(&self) -> Option<&str> {
        self.value.as_deref().and_then(|v| std::str::from_utf8(v).ok())
    }

    /// Replace the value, leaving all other parts untouched.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = Some(value.into().into_bytes());
    }

    /// Lookup key: the ASCII-lower-cased name.
    pub fn key(&self) -> Option<String> {
        self.name_str().map(|n| n.to_ascii_lowercase())
    }

    /// Case-insensitive name match. Raw and placeholder fields match
    /// nothing.
    pub fn matches(&self, name: &str) -> bool {
        match &self.name {
            Some(n) => n.eq_ignore_ascii_case(name.as_bytes()),
            None => false,
        }
    }

    /// True while no part has been set.
    pub fn is_placeholder(&self) -> bool {
        self.name.is_none()
            && self.separator.is_none()
            && self.value.is_none()
            && self.terminator.is_none()
    }

    /// True for a field preserving an unparseable line.
    pub fn is_raw(&self) -> bool {
        self.name.is_none() && self.value.is_some()
    }

    /// Fill any unset separator/terminator with the canonical bytes.
    ///
    /// A raw field only gets a terminator; it has no name to separate.
    pub fn finalize(&mut self) {
        if self.name.is_some() && self.separator.is_none() {
            self.separator = Some(CANONICAL_SEPARATOR.to_vec());
        }
        if self.terminator.is_none() {
            self.terminator = Some(CANONICAL_TERMINATOR.to_vec());
        }
    }

    /// Serialize into `out`, emitting only the parts that are set.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        for part in [&self.name, &self.separator, &self.value, &self.terminator] {
            if let Some(bytes) = part {
                out.extend_from_slice(bytes);
            }
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut bytes = Vec::new();
        self.write_to(&mut bytes);
        write!(f, "{}", String::from_utf8_lossy(&bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_field_is_canonical() {
        let field = Field::new("Host", "example.com");
        let mut out = Vec::new();
        field.write_to(&mut out);
        assert_eq!(out, b"Host: example.com\r\n");
    }

    #[test]
    fn test_placeholder() {
        let field = Field::placeholder();
        assert!(field.is_placeholder());
        assert!(!field.matches("anything"));

        let mut out = Vec::new();
        field.write_to(&mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_parts_round_trip() {
        let field = Field::from_parts(
            b"X-Odd".to_vec(),
            b"  :\t".to_vec(),
            b"value".to_vec(),
            b"  \n".to_vec(),
        );
        let mut out = Vec::new();
        field.write_to(&mut out);
        assert_eq!(out, b"X-Odd  :\tvalue  \n");
    }

    #[test]
    fn test_case_insensitive_match() {
        let field = Field::new("Content-Type", "text/plain");
        assert!(field.matches("content-type"));
        assert!(field.matches("CONTENT-TYPE"));
        assert!(!field.matches("content-length"));
        assert_eq!(field.key().unwrap(), "content-type");
    }

    #[test]
    fn test_raw_field_round_trip() {
        let field = Field::raw_line(b"this is not a header".to_vec(), b"\r\n".to_vec());
        assert!(field.is_raw());
        assert!(!field.matches("this"));

        let mut out = Vec::new();
        field.write_to(&mut out);
        assert_eq!(out, b"this is not a header\r\n");
    }

    #[test]
    fn test_finalize_fills_missing_parts() {
        let mut field = Field {
            name: Some(b"Host".to_vec()),
            separator: None,
            value: Some(b"x".to_vec()),
            terminator: None,
        };
        field.finalize();

        let mut out = Vec::new();
        field.write_to(&mut out);
        assert_eq!(out, b"Host: x\r\n");
    }
}
