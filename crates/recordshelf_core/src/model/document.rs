//! Semi-structured document stored in a single column.
//!
//! # Responsibility
//! - Hold the key-value content of one record document.
//! - Resolve typed field reads (`FieldKind`) over loosely typed JSON values.
//! - Define the narrow `DocumentCodec` boundary between documents and stored text.
//!
//! # Invariants
//! - A decoded document is always a JSON object; any other top-level value is
//!   rejected by the codec.
//! - Decimal values are written as JSON numbers carrying their exact text.
//! - Keys not touched by a write are preserved as-is.

use rust_decimal::Decimal;
use serde_json::{Map, Number, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

pub type CodecResult<T> = Result<T, CodecError>;

/// Errors raised at the document/storage-text boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Stored text is not valid for the codec format.
    Malformed(String),
    /// Stored text is valid but the top-level value is not an object.
    NotAnObject,
    /// Document could not be turned back into stored text.
    Encode(String),
    /// Written value kind differs from the kind the field is declared with.
    KindMismatch {
        field: String,
        expected: FieldKind,
        actual: FieldKind,
    },
    /// The record's collection has no document key for this field.
    UnsupportedField(String),
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(message) => write!(f, "malformed document: {message}"),
            Self::NotAnObject => write!(f, "document top-level value is not an object"),
            Self::Encode(message) => write!(f, "failed to encode document: {message}"),
            Self::KindMismatch {
                field,
                expected,
                actual,
            } => write!(f, "field {field} holds {expected} values, got {actual}"),
            Self::UnsupportedField(field) => write!(f, "field {field} is not part of this collection"),
        }
    }
}

impl Error for CodecError {}

/// Storage type a field is read back as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Decimal,
}

impl Display for FieldKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Decimal => f.write_str("decimal"),
        }
    }
}

/// Typed value of one document field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Decimal(Decimal),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Text(_) => FieldKind::Text,
            Self::Decimal(_) => FieldKind::Decimal,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            Self::Decimal(_) => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Decimal(value) => Some(*value),
            Self::Text(_) => None,
        }
    }

    fn to_json(&self) -> CodecResult<Value> {
        match self {
            Self::Text(value) => Ok(Value::String(value.clone())),
            Self::Decimal(value) => {
                let number: Number = serde_json::from_str(&value.to_string())
                    .map_err(|err| CodecError::Encode(format!("decimal `{value}`: {err}")))?;
                Ok(Value::Number(number))
            }
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Decimal> for FieldValue {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

/// Key-value content of one record document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    entries: Map<String, Value>,
}

impl Document {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Reads `key` as `kind`.
    ///
    /// Returns `None` when the key is missing, `null`, or holds a value that
    /// cannot be read as the requested kind.
    pub fn get(&self, key: &str, kind: FieldKind) -> Option<FieldValue> {
        let value = self.entries.get(key)?;
        match kind {
            FieldKind::Text => json_as_text(value).map(FieldValue::Text),
            FieldKind::Decimal => json_as_decimal(value).map(FieldValue::Decimal),
        }
    }

    /// Upserts `key`, or removes it when `value` is `None`.
    pub fn set(&mut self, key: &str, value: Option<&FieldValue>) -> CodecResult<()> {
        match value {
            Some(value) => {
                self.entries.insert(key.to_string(), value.to_json()?);
            }
            None => {
                self.entries.remove(key);
            }
        }
        Ok(())
    }
}

/// Conversion between a `Document` and its stored text form.
///
/// Implementations hold no per-record state; one value can serve any number
/// of records.
pub trait DocumentCodec {
    fn decode(&self, raw: &str) -> CodecResult<Document>;
    fn encode(&self, document: &Document) -> CodecResult<String>;
}

/// JSON text codec.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonCodec;

impl DocumentCodec for JsonCodec {
    fn decode(&self, raw: &str) -> CodecResult<Document> {
        let value: Value =
            serde_json::from_str(raw).map_err(|err| CodecError::Malformed(err.to_string()))?;
        match value {
            Value::Object(entries) => Ok(Document { entries }),
            _ => Err(CodecError::NotAnObject),
        }
    }

    fn encode(&self, document: &Document) -> CodecResult<String> {
        serde_json::to_string(&document.entries).map_err(|err| CodecError::Encode(err.to_string()))
    }
}

fn json_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn json_as_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(number) => parse_decimal(&number.to_string()),
        Value::String(text) => parse_decimal(text.trim()),
        _ => None,
    }
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    // `Decimal::from_str` accepts `_` digit separators; SQLite casts stop at them.
    if text.contains('_') {
        return None;
    }
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::{CodecError, Document, DocumentCodec, FieldKind, FieldValue, JsonCodec};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn decimal(text: &str) -> Decimal {
        Decimal::from_str(text).unwrap()
    }

    #[test]
    fn decode_rejects_non_object_documents() {
        assert_eq!(JsonCodec.decode("[1, 2]"), Err(CodecError::NotAnObject));
        assert_eq!(JsonCodec.decode("42"), Err(CodecError::NotAnObject));
        assert!(matches!(
            JsonCodec.decode("{not json"),
            Err(CodecError::Malformed(_))
        ));
    }

    #[test]
    fn decimal_keeps_exact_text_through_codec() {
        let mut document = Document::new();
        let value = FieldValue::Decimal(decimal("12345678901234567890.125"));
        document.set("weight", Some(&value)).unwrap();

        let encoded = JsonCodec.encode(&document).unwrap();
        assert_eq!(encoded, r#"{"weight":12345678901234567890.125}"#);

        let decoded = JsonCodec.decode(&encoded).unwrap();
        assert_eq!(decoded.get("weight", FieldKind::Decimal), Some(value));
    }

    #[test]
    fn numeric_strings_read_as_decimal_and_numbers_read_as_text() {
        let document = JsonCodec
            .decode(r#"{"age": "4", "count": 7, "flag": true, "list": [1]}"#)
            .unwrap();

        assert_eq!(
            document.get("age", FieldKind::Decimal),
            Some(FieldValue::Decimal(decimal("4")))
        );
        assert_eq!(
            document.get("count", FieldKind::Text),
            Some(FieldValue::Text("7".to_string()))
        );
        assert_eq!(
            document.get("flag", FieldKind::Text),
            Some(FieldValue::Text("true".to_string()))
        );
        assert_eq!(document.get("list", FieldKind::Text), None);
    }

    #[test]
    fn scientific_numbers_read_as_decimal() {
        let document = JsonCodec.decode(r#"{"n": 1.5e2}"#).unwrap();
        assert_eq!(
            document.get("n", FieldKind::Decimal),
            Some(FieldValue::Decimal(decimal("150")))
        );
    }

    #[test]
    fn text_that_is_not_a_number_reads_as_absent_decimal() {
        let document = JsonCodec
            .decode(r#"{"age": "old", "weight": "1_000"}"#)
            .unwrap();
        assert_eq!(document.get("age", FieldKind::Decimal), None);
        assert_eq!(document.get("weight", FieldKind::Decimal), None);
    }

    #[test]
    fn set_none_removes_only_that_key() {
        let mut document = JsonCodec.decode(r#"{"a": "x", "b": "y"}"#).unwrap();
        document.set("a", None).unwrap();
        assert!(!document.contains_key("a"));
        assert!(document.contains_key("b"));
        assert_eq!(document.len(), 1);
    }
}
