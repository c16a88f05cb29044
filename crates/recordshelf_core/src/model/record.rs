//! Dynamic-schema record model.
//!
//! # Responsibility
//! - Expose typed fields (`name`, secondary text, numeric decimal, weight)
//!   that live inside one serialized document column.
//! - Map logical fields onto per-collection document keys. Books store
//!   `name`/`author`/`lastReaded`; cats store `name`/`age`/`weight`.
//!
//! The codec is a type parameter so the document format can change without
//! touching accessors. Repositories persist `JsonRecord<JsonCodec>` only.
//!
//! # Invariants
//! - `id` is assigned by storage and never changed afterwards.
//! - Reads never fail: an absent, malformed or non-object document reads as
//!   "field absent" for every field.
//! - Writes rewrite the whole document. A malformed stored document is
//!   replaced by a fresh one containing only the written field.
//! - `id` and `imageUrl` are columns, never document keys.
//! - A field only accepts values of its own `FieldKind`.
//!
//! # Concurrency
//! Each setter is a read-modify-write of the entire document. Two writers
//! updating different fields of the same row from separate copies will race,
//! and the later save wins for the whole document.

use crate::model::document::{
    CodecError, CodecResult, Document, DocumentCodec, FieldKind, FieldValue, JsonCodec,
};
use log::{debug, warn};
use rust_decimal::Decimal;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Store-generated surrogate key.
pub type RecordId = i64;

/// Keys owned by record columns and the serialized view.
pub const RESERVED_KEYS: [&str; 2] = ["id", "imageUrl"];

/// Catalogue a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Books,
    Cats,
}

impl Collection {
    pub const ALL: [Collection; 2] = [Collection::Books, Collection::Cats];

    /// Stable lowercase label used in logs and the CLI.
    pub fn label(self) -> &'static str {
        match self {
            Self::Books => "books",
            Self::Cats => "cats",
        }
    }

    /// Table holding this collection's document rows.
    pub fn table(self) -> &'static str {
        match self {
            Self::Books => "json_books",
            Self::Cats => "json_cats",
        }
    }

    /// Blob key prefix for record images.
    pub fn image_key_prefix(self) -> &'static str {
        match self {
            Self::Books => "book-images/",
            Self::Cats => "cat-images/",
        }
    }

    /// Logical fields this collection stores, in view order.
    pub fn fields(self) -> &'static [RecordField] {
        match self {
            Self::Books => &[
                RecordField::Name,
                RecordField::SecondaryAttribute,
                RecordField::NumericAttribute,
            ],
            Self::Cats => &[
                RecordField::Name,
                RecordField::NumericAttribute,
                RecordField::Weight,
            ],
        }
    }

    /// Document key a logical field is stored under, if the collection has it.
    pub fn field_key(self, field: RecordField) -> Option<&'static str> {
        match (self, field) {
            (_, RecordField::Name) => Some("name"),
            (Self::Books, RecordField::SecondaryAttribute) => Some("author"),
            (Self::Books, RecordField::NumericAttribute) => Some("lastReaded"),
            (Self::Books, RecordField::Weight) => None,
            (Self::Cats, RecordField::SecondaryAttribute) => None,
            (Self::Cats, RecordField::NumericAttribute) => Some("age"),
            (Self::Cats, RecordField::Weight) => Some("weight"),
        }
    }

    /// Resolves a document key back to its logical field.
    pub fn field_by_key(self, key: &str) -> Option<RecordField> {
        self.fields()
            .iter()
            .copied()
            .find(|field| self.field_key(*field) == Some(key))
    }
}

/// Logical field of a dynamic-schema record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordField {
    Name,
    /// Text attribute; `author` for books.
    SecondaryAttribute,
    /// Decimal attribute; `lastReaded` for books, `age` for cats.
    NumericAttribute,
    /// Decimal `weight`; cats only.
    Weight,
}

impl RecordField {
    pub const ALL: [RecordField; 4] = [
        RecordField::Name,
        RecordField::SecondaryAttribute,
        RecordField::NumericAttribute,
        RecordField::Weight,
    ];

    pub fn kind(self) -> FieldKind {
        match self {
            Self::Name | Self::SecondaryAttribute => FieldKind::Text,
            Self::NumericAttribute | Self::Weight => FieldKind::Decimal,
        }
    }
}

/// Row whose domain fields live in one serialized document column.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRecord<C: DocumentCodec = JsonCodec> {
    id: Option<RecordId>,
    collection: Collection,
    document: Option<String>,
    image_url: Option<String>,
    codec: C,
}

impl JsonRecord<JsonCodec> {
    /// Creates an unsaved record with no document.
    pub fn new(collection: Collection) -> Self {
        Self::with_codec(collection, JsonCodec)
    }

    /// Rebuilds a record from stored column values.
    pub fn from_row(
        id: RecordId,
        collection: Collection,
        document: Option<String>,
        image_url: Option<String>,
    ) -> Self {
        Self {
            id: Some(id),
            collection,
            document,
            image_url,
            codec: JsonCodec,
        }
    }
}

impl<C: DocumentCodec> JsonRecord<C> {
    pub fn with_codec(collection: Collection, codec: C) -> Self {
        Self {
            id: None,
            collection,
            document: None,
            image_url: None,
            codec,
        }
    }

    pub fn id(&self) -> Option<RecordId> {
        self.id
    }

    /// Assigns the store-generated key. Ignored once a key is set.
    pub fn assign_id(&mut self, id: RecordId) {
        if self.id.is_none() {
            self.id = Some(id);
        }
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    /// Raw stored document text, exactly as persisted.
    pub fn raw_document(&self) -> Option<&str> {
        self.document.as_deref()
    }

    /// Replaces the raw stored document text without validation.
    pub fn set_raw_document(&mut self, raw: Option<String>) {
        self.document = raw;
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn set_image_url(&mut self, image_url: Option<String>) {
        self.image_url = image_url;
    }

    /// Reads one logical field; absent on any decode failure and for fields
    /// the collection does not store.
    pub fn get_field(&self, field: RecordField) -> Option<FieldValue> {
        let key = self.collection.field_key(field)?;
        let document = self.decode_for_read()?;
        document.get(key, field.kind())
    }

    /// Writes one logical field, removing it when `value` is `None`.
    ///
    /// The stored document is decoded, modified and fully re-encoded. If the
    /// stored document cannot be decoded the write starts from an empty one.
    ///
    /// # Errors
    /// - `UnsupportedField` when the collection does not store `field`.
    /// - `KindMismatch` when `value` is not of `field.kind()`.
    pub fn set_field(&mut self, field: RecordField, value: Option<FieldValue>) -> CodecResult<()> {
        let key = self
            .collection
            .field_key(field)
            .ok_or_else(|| CodecError::UnsupportedField(format!("{field:?}")))?;
        if let Some(value) = &value {
            if value.kind() != field.kind() {
                return Err(CodecError::KindMismatch {
                    field: format!("{field:?}"),
                    expected: field.kind(),
                    actual: value.kind(),
                });
            }
        }
        let mut document = self.decode_for_write();
        document.set(key, value.as_ref())?;
        self.document = Some(self.codec.encode(&document)?);
        Ok(())
    }

    pub fn name(&self) -> Option<String> {
        self.text_field(RecordField::Name)
    }

    pub fn set_name(&mut self, name: Option<String>) -> CodecResult<()> {
        self.set_field(RecordField::Name, name.map(FieldValue::Text))
    }

    pub fn secondary_attribute(&self) -> Option<String> {
        self.text_field(RecordField::SecondaryAttribute)
    }

    pub fn set_secondary_attribute(&mut self, value: Option<String>) -> CodecResult<()> {
        self.set_field(RecordField::SecondaryAttribute, value.map(FieldValue::Text))
    }

    pub fn numeric_attribute(&self) -> Option<Decimal> {
        self.get_field(RecordField::NumericAttribute)
            .and_then(|value| value.as_decimal())
    }

    pub fn set_numeric_attribute(&mut self, value: Option<Decimal>) -> CodecResult<()> {
        self.set_field(RecordField::NumericAttribute, value.map(FieldValue::Decimal))
    }

    pub fn weight(&self) -> Option<Decimal> {
        self.get_field(RecordField::Weight)
            .and_then(|value| value.as_decimal())
    }

    pub fn set_weight(&mut self, value: Option<Decimal>) -> CodecResult<()> {
        self.set_field(RecordField::Weight, value.map(FieldValue::Decimal))
    }

    fn text_field(&self, field: RecordField) -> Option<String> {
        match self.get_field(field)? {
            FieldValue::Text(value) => Some(value),
            FieldValue::Decimal(_) => None,
        }
    }

    fn decode_for_read(&self) -> Option<Document> {
        let raw = self.document.as_deref()?;
        match self.codec.decode(raw) {
            Ok(document) => Some(document),
            Err(err) => {
                debug!(
                    "event=document_decode module=model status=error mode=read collection={} id={:?} error={}",
                    self.collection.label(),
                    self.id,
                    err
                );
                None
            }
        }
    }

    fn decode_for_write(&self) -> Document {
        let Some(raw) = self.document.as_deref() else {
            return Document::new();
        };
        match self.codec.decode(raw) {
            Ok(document) => document,
            Err(err) => {
                warn!(
                    "event=document_reset module=model status=error collection={} id={:?} error={}",
                    self.collection.label(),
                    self.id,
                    err
                );
                Document::new()
            }
        }
    }
}

/// Flat view: `id`, each collection field under its document key, then
/// `imageUrl`.
impl<C: DocumentCodec> Serialize for JsonRecord<C> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let document = self.decode_for_read();
        let fields = self.collection.fields();
        let mut map = serializer.serialize_map(Some(fields.len() + 2))?;
        map.serialize_entry("id", &self.id)?;
        for &field in fields {
            let Some(key) = self.collection.field_key(field) else {
                continue;
            };
            let value = document
                .as_ref()
                .and_then(|document| document.get(key, field.kind()));
            match value {
                Some(FieldValue::Text(text)) => map.serialize_entry(key, &text)?,
                Some(FieldValue::Decimal(decimal)) => {
                    map.serialize_entry(key, &decimal_number(decimal))?
                }
                None => map.serialize_entry(key, &Option::<()>::None)?,
            }
        }
        map.serialize_entry("imageUrl", &self.image_url)?;
        map.end()
    }
}

fn decimal_number(value: Decimal) -> serde_json::Value {
    match serde_json::from_str::<serde_json::Number>(&value.to_string()) {
        Ok(number) => serde_json::Value::Number(number),
        Err(_) => serde_json::Value::String(value.to_string()),
    }
}
