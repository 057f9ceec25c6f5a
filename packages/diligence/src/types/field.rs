//! Sentinel-aware scalar field.
//!
//! Extraction records never omit a field. A value that was looked for and
//! not found is stored as [`NOT_SPECIFIED`], so a serialized record always
//! carries its full schema and completeness can tell "checked, no data"
//! apart from "never populated".

use std::fmt;

use schemars::gen::SchemaGenerator;
use schemars::schema::Schema;
use schemars::JsonSchema;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

/// The single placeholder for a checked-but-empty field.
pub const NOT_SPECIFIED: &str = "Not specified";

/// Placeholder spellings language models produce in place of a value.
const SENTINEL_PREFIXES: &[&str] = &[
    "not specified",
    "not available",
    "not found",
    "not disclosed",
    "not provided",
    "not applicable",
    "unknown",
    "n/a",
    "none",
    "null",
];

/// An optional scalar that serializes its absence as [`NOT_SPECIFIED`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Field(Option<String>);

impl Field {
    /// A field that was checked and holds no value.
    pub fn unfilled() -> Self {
        Self(None)
    }

    /// Wrap a value; blank or placeholder text becomes unfilled.
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let trimmed = value.trim();
        if is_sentinel(trimmed) {
            Self(None)
        } else {
            Self(Some(trimmed.to_string()))
        }
    }

    /// Wrap an optional value.
    pub fn from_option(value: Option<impl Into<String>>) -> Self {
        value.map(Self::new).unwrap_or_default()
    }

    pub fn value(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn is_filled(&self) -> bool {
        self.0.is_some()
    }

    /// Keep this value, or take `other` when unfilled.
    pub fn or(self, other: Field) -> Field {
        if self.is_filled() {
            self
        } else {
            other
        }
    }
}

impl From<&str> for Field {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Field {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value().unwrap_or(NOT_SPECIFIED))
    }
}

fn is_sentinel(text: &str) -> bool {
    if text.is_empty() || text == "-" {
        return true;
    }
    let lower = text.to_lowercase();
    SENTINEL_PREFIXES
        .iter()
        .any(|prefix| lower == *prefix || lower.starts_with(&format!("{} ", prefix)))
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.value().unwrap_or(NOT_SPECIFIED))
    }
}

impl<'de> Deserialize<'de> for Field {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(FieldVisitor)
    }
}

/// Accepts strings, numbers, booleans and null; models often answer a
/// string field with a bare number.
struct FieldVisitor;

impl<'de> Visitor<'de> for FieldVisitor {
    type Value = Field;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string, number, boolean or null")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Field, E> {
        Ok(Field::new(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Field, E> {
        Ok(Field::new(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Field, E> {
        Ok(Field::new(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Field, E> {
        Ok(Field::new(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Field, E> {
        Ok(Field::new(v.to_string()))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Field, E> {
        Ok(Field::new(v.to_string()))
    }

    fn visit_none<E: de::Error>(self) -> Result<Field, E> {
        Ok(Field::unfilled())
    }

    fn visit_unit<E: de::Error>(self) -> Result<Field, E> {
        Ok(Field::unfilled())
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Field, D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl JsonSchema for Field {
    fn is_referenceable() -> bool {
        false
    }

    fn schema_name() -> String {
        "Field".to_string()
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        String::json_schema(gen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_are_unfilled() {
        for text in [
            "",
            "   ",
            "Not specified",
            "not specified in SEC documents",
            "N/A",
            "Unknown",
            "null",
        ] {
            assert!(!Field::new(text).is_filled(), "{:?} should be unfilled", text);
        }
    }

    #[test]
    fn test_real_values_are_kept_trimmed() {
        let field = Field::new("  Delaware ");
        assert_eq!(field.value(), Some("Delaware"));
        // "None" as a prefix of a real word is not a placeholder
        assert!(Field::new("Nonesuch Holdings").is_filled());
    }

    #[test]
    fn test_serializes_sentinel_when_unfilled() {
        let json = serde_json::to_string(&Field::unfilled()).unwrap();
        assert_eq!(json, format!("\"{}\"", NOT_SPECIFIED));
    }

    #[test]
    fn test_deserializes_numbers_and_null() {
        let field: Field = serde_json::from_str("12000").unwrap();
        assert_eq!(field.value(), Some("12000"));

        let field: Field = serde_json::from_str("null").unwrap();
        assert!(!field.is_filled());
    }

    #[test]
    fn test_or_prefers_filled_value() {
        let merged = Field::unfilled().or(Field::new("x"));
        assert_eq!(merged.value(), Some("x"));
        let kept = Field::new("a").or(Field::new("b"));
        assert_eq!(kept.value(), Some("a"));
    }
}
