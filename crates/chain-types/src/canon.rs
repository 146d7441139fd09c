//! # Canonical Encoding
//!
//! Deterministic, whitespace-free, sorted-key textual serialization.
//!
//! This is the sole input to every hash and signature in the system: two
//! semantically equal values (same mapping entries, any key order) MUST
//! produce byte-identical output.
//!
//! Reference: System.md Section 4.1 (Canonical Encoder).

use std::collections::BTreeMap;
use std::fmt::Write as _;

/// A structured value that can be canonically encoded.
///
/// Mirrors the JSON data model (mapping, sequence, string, integer, null)
/// without floats: every number in this system is an unsigned height,
/// nonce, or timestamp, and canonical encoding must not reintroduce
/// float formatting ambiguity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonValue {
    /// The JSON `null` literal.
    Null,
    /// A UTF-8 string.
    Str(String),
    /// A non-negative integer (heights, nonces, timestamps never go negative).
    UInt(u64),
    /// An ordered sequence; order is preserved, not sorted.
    Seq(Vec<CanonValue>),
    /// A string-keyed mapping; keys are sorted lexicographically at encode time.
    Map(BTreeMap<String, CanonValue>),
}

impl CanonValue {
    /// Builds a map value from an iterator of key/value pairs.
    pub fn map<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, CanonValue)>,
    {
        CanonValue::Map(entries.into_iter().collect())
    }
}

impl From<&str> for CanonValue {
    fn from(s: &str) -> Self {
        CanonValue::Str(s.to_string())
    }
}

impl From<String> for CanonValue {
    fn from(s: String) -> Self {
        CanonValue::Str(s)
    }
}

impl From<u64> for CanonValue {
    fn from(n: u64) -> Self {
        CanonValue::UInt(n)
    }
}

/// Encodes a [`CanonValue`] to its canonical byte representation.
///
/// Rules (System.md Section 4.1): mapping keys sorted lexicographically;
/// no whitespace between tokens; integers without leading zeros or signs;
/// strings are escaped the way `serde_json` escapes them, which keeps the
/// encoding a valid, minimal JSON document; sequences preserve their order.
pub fn encode(value: &CanonValue) -> Vec<u8> {
    let mut out = String::new();
    write_value(value, &mut out);
    out.into_bytes()
}

fn write_value(value: &CanonValue, out: &mut String) {
    match value {
        CanonValue::Null => out.push_str("null"),
        CanonValue::UInt(n) => {
            let _ = write!(out, "{n}");
        }
        CanonValue::Str(s) => write_escaped_string(s, out),
        CanonValue::Seq(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(item, out);
            }
            out.push(']');
        }
        CanonValue::Map(entries) => {
            out.push('{');
            for (i, (key, val)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_escaped_string(key, out);
                out.push(':');
                write_value(val, out);
            }
            out.push('}');
        }
    }
}

fn write_escaped_string(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_order_does_not_affect_encoding() {
        let mut m1 = BTreeMap::new();
        m1.insert("b".to_string(), CanonValue::from("2"));
        m1.insert("a".to_string(), CanonValue::from("1"));

        let mut m2 = BTreeMap::new();
        m2.insert("a".to_string(), CanonValue::from("1"));
        m2.insert("b".to_string(), CanonValue::from("2"));

        assert_eq!(encode(&CanonValue::Map(m1)), encode(&CanonValue::Map(m2)));
    }

    #[test]
    fn no_whitespace_in_output() {
        let value = CanonValue::map([
            ("key".to_string(), CanonValue::from("value")),
            ("nonce".to_string(), CanonValue::from(7u64)),
        ]);
        let encoded = String::from_utf8(encode(&value)).unwrap();
        assert!(!encoded.contains(' '));
        assert_eq!(encoded, r#"{"key":"value","nonce":7}"#);
    }

    #[test]
    fn sequences_preserve_order() {
        let value = CanonValue::Seq(vec![CanonValue::from(3u64), CanonValue::from(1u64)]);
        assert_eq!(String::from_utf8(encode(&value)).unwrap(), "[3,1]");
    }

    #[test]
    fn null_encodes_to_literal() {
        assert_eq!(String::from_utf8(encode(&CanonValue::Null)).unwrap(), "null");
    }

    #[test]
    fn nested_maps_sort_at_every_level() {
        let inner = CanonValue::map([
            ("z".to_string(), CanonValue::from("1")),
            ("a".to_string(), CanonValue::from("2")),
        ]);
        let outer = CanonValue::map([
            ("outer_b".to_string(), inner.clone()),
            ("outer_a".to_string(), CanonValue::from("x")),
        ]);
        let encoded = String::from_utf8(encode(&outer)).unwrap();
        assert_eq!(
            encoded,
            r#"{"outer_a":"x","outer_b":{"a":"2","z":"1"}}"#
        );
    }
}
