//! Attribute values exchanged between host records and remote records
//!
//! Mappers produce [`Attributes`], a field name to [`FieldValue`] mapping.
//! Values serialize as plain (untagged) JSON so they round-trip through the
//! ledger file and CLI output without a wrapper.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Mapping of field name to value, as produced by mappers
pub type Attributes = BTreeMap<String, FieldValue>;

/// A single attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum FieldValue {
    /// No value
    #[default]
    Null,
    /// Boolean flag
    Bool(bool),
    /// Whole number
    Integer(i64),
    /// Floating point number
    Float(f64),
    /// Text
    Text(String),
}

impl FieldValue {
    /// Returns true for `Null` and for text that is empty or whitespace
    ///
    /// This is the "unset" test applied to external ids and remote identifiers.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Borrow the text content, if this is a text value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Render the value as an identifier string, or `None` if blank
    ///
    /// Numeric ids are accepted since some services hand them out as numbers.
    pub fn to_id(&self) -> Option<String> {
        if self.is_blank() {
            return None;
        }
        match self {
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Integer(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Parse a CLI-style literal (`true`, `42`, `1.5`, `null`, anything else is text)
    ///
    /// Numbers are only recognized when they print back exactly as written,
    /// so `007`, `+15551234567` and `1e3` stay text. Non-finite floats stay text.
    pub fn parse_literal(raw: &str) -> Self {
        match raw {
            "null" => FieldValue::Null,
            "true" => FieldValue::Bool(true),
            "false" => FieldValue::Bool(false),
            _ => {
                if let Some(n) = raw.parse::<i64>().ok().filter(|n| n.to_string() == raw) {
                    FieldValue::Integer(n)
                } else if let Some(f) = raw
                    .parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite() && f.to_string() == raw)
                {
                    FieldValue::Float(f)
                } else {
                    FieldValue::Text(raw.to_string())
                }
            }
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => write!(f, "null"),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Integer(n) => write!(f, "{}", n),
            FieldValue::Float(x) => write!(f, "{}", x),
            FieldValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_detection() {
        assert!(FieldValue::Null.is_blank());
        assert!(FieldValue::from("").is_blank());
        assert!(FieldValue::from("   ").is_blank());
        assert!(!FieldValue::from("42").is_blank());
        assert!(!FieldValue::Integer(0).is_blank());
        assert!(!FieldValue::Bool(false).is_blank());
    }

    #[test]
    fn test_to_id() {
        assert_eq!(FieldValue::from("abc").to_id(), Some("abc".to_string()));
        assert_eq!(FieldValue::Integer(42).to_id(), Some("42".to_string()));
        assert_eq!(FieldValue::from("").to_id(), None);
        assert_eq!(FieldValue::Bool(true).to_id(), None);
    }

    #[test]
    fn test_parse_literal() {
        assert_eq!(FieldValue::parse_literal("null"), FieldValue::Null);
        assert_eq!(FieldValue::parse_literal("true"), FieldValue::Bool(true));
        assert_eq!(FieldValue::parse_literal("42"), FieldValue::Integer(42));
        assert_eq!(FieldValue::parse_literal("1.5"), FieldValue::Float(1.5));
        assert_eq!(
            FieldValue::parse_literal("Jane Doe"),
            FieldValue::Text("Jane Doe".to_string())
        );
        assert_eq!(FieldValue::parse_literal("-3"), FieldValue::Integer(-3));
    }

    #[test]
    fn test_parse_literal_keeps_lossy_numbers_as_text() {
        assert_eq!(FieldValue::parse_literal("007"), FieldValue::from("007"));
        assert_eq!(FieldValue::parse_literal("0012"), FieldValue::from("0012"));
        assert_eq!(
            FieldValue::parse_literal("+15551234567"),
            FieldValue::from("+15551234567")
        );
        assert_eq!(FieldValue::parse_literal("NaN"), FieldValue::from("NaN"));
        assert_eq!(FieldValue::parse_literal("inf"), FieldValue::from("inf"));
        assert_eq!(FieldValue::parse_literal("1e3"), FieldValue::from("1e3"));
        assert_eq!(FieldValue::parse_literal("1.50"), FieldValue::from("1.50"));
    }

    #[test]
    fn test_untagged_json() {
        let mut attrs = Attributes::new();
        attrs.insert("name".to_string(), "Jane".into());
        attrs.insert("count".to_string(), 3i64.into());
        attrs.insert("active".to_string(), true.into());
        attrs.insert("note".to_string(), FieldValue::Null);

        let json = serde_json::to_string(&attrs).unwrap();
        assert_eq!(
            json,
            r#"{"active":true,"count":3,"name":"Jane","note":null}"#
        );

        let parsed: Attributes = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, attrs);
    }

    #[test]
    fn test_from_option() {
        let none: Option<&str> = None;
        assert_eq!(FieldValue::from(none), FieldValue::Null);
        assert_eq!(FieldValue::from(Some("x")), FieldValue::from("x"));
    }
}
