use recordshelf_core::{
    CodecError, CodecResult, Collection, Document, DocumentCodec, FieldKind, FieldValue,
    JsonCodec, JsonRecord, RecordField,
};
use rust_decimal::Decimal;
use std::str::FromStr;

fn decimal(text: &str) -> Decimal {
    Decimal::from_str(text).unwrap()
}

fn sample_values(field: RecordField) -> Vec<FieldValue> {
    match field {
        RecordField::Name | RecordField::SecondaryAttribute => vec![
            FieldValue::Text("Tom".to_string()),
            FieldValue::Text(String::new()),
            FieldValue::Text("Кот \"Бегемот\"\n".to_string()),
            FieldValue::Text("42".to_string()),
        ],
        RecordField::NumericAttribute | RecordField::Weight => vec![
            FieldValue::Decimal(decimal("0")),
            FieldValue::Decimal(decimal("-3")),
            FieldValue::Decimal(decimal("4.25")),
            FieldValue::Decimal(decimal("79228162514264337593543950335")),
            FieldValue::Decimal(decimal("0.0000000000000000000000000001")),
        ],
    }
}

#[test]
fn set_then_get_returns_the_written_value() {
    for collection in Collection::ALL {
        for &field in collection.fields() {
            for value in sample_values(field) {
                let mut record = JsonRecord::new(collection);
                record.set_field(field, Some(value.clone())).unwrap();
                assert_eq!(
                    record.get_field(field),
                    Some(value.clone()),
                    "{collection:?} {field:?}"
                );
            }
        }
    }
}

#[test]
fn new_record_has_no_document_and_reads_absent() {
    let record = JsonRecord::new(Collection::Cats);
    assert_eq!(record.id(), None);
    assert_eq!(record.raw_document(), None);
    for field in RecordField::ALL {
        assert_eq!(record.get_field(field), None);
    }
}

#[test]
fn setting_absent_removes_only_that_field() {
    let mut record = JsonRecord::new(Collection::Books);
    record.set_name(Some("Dune".to_string())).unwrap();
    record
        .set_secondary_attribute(Some("Frank Herbert".to_string()))
        .unwrap();
    record.set_numeric_attribute(Some(decimal("3"))).unwrap();

    record.set_secondary_attribute(None).unwrap();

    assert_eq!(record.secondary_attribute(), None);
    assert_eq!(record.name().as_deref(), Some("Dune"));
    assert_eq!(record.numeric_attribute(), Some(decimal("3")));
    assert!(!record.raw_document().unwrap().contains("author"));
}

#[test]
fn malformed_or_non_object_documents_read_absent_for_every_field() {
    for raw in ["{broken", "", "null", "[1,2,3]", "\"text\"", "17"] {
        let mut record = JsonRecord::new(Collection::Cats);
        record.set_raw_document(Some(raw.to_string()));
        for field in RecordField::ALL {
            assert_eq!(record.get_field(field), None, "document `{raw}`");
        }
    }
}

#[test]
fn write_on_malformed_document_starts_from_empty_document() {
    let mut record = JsonRecord::new(Collection::Cats);
    record.set_raw_document(Some("{\"name\": \"Tom\", broken".to_string()));

    record.set_numeric_attribute(Some(decimal("4"))).unwrap();

    assert_eq!(record.raw_document(), Some(r#"{"age":4}"#));
    assert_eq!(record.numeric_attribute(), Some(decimal("4")));
    assert_eq!(record.name(), None);
}

#[test]
fn writes_preserve_unknown_document_keys() {
    let mut record = JsonRecord::new(Collection::Books);
    record.set_raw_document(Some(r#"{"isbn":"978-0441013593","name":"Old"}"#.to_string()));

    record.set_name(Some("Dune".to_string())).unwrap();

    let document: serde_json::Value =
        serde_json::from_str(record.raw_document().unwrap()).unwrap();
    assert_eq!(document["isbn"], "978-0441013593");
    assert_eq!(document["name"], "Dune");
}

#[test]
fn decimal_fields_accept_numeric_strings_written_by_other_clients() {
    let mut cat = JsonRecord::new(Collection::Cats);
    cat.set_raw_document(Some(r#"{"age":"4","weight":" 3.5 "}"#.to_string()));
    assert_eq!(cat.numeric_attribute(), Some(decimal("4")));
    assert_eq!(cat.weight(), Some(decimal("3.5")));

    let mut book = JsonRecord::new(Collection::Books);
    book.set_raw_document(Some(r#"{"author":7}"#.to_string()));
    assert_eq!(book.secondary_attribute().as_deref(), Some("7"));
}

#[test]
fn set_field_rejects_value_of_the_wrong_kind() {
    let mut record = JsonRecord::new(Collection::Cats);
    record.set_name(Some("Tom".to_string())).unwrap();
    let before = record.raw_document().map(str::to_string);

    let err = record
        .set_field(RecordField::Name, Some(FieldValue::Decimal(decimal("4"))))
        .unwrap_err();
    assert_eq!(
        err,
        CodecError::KindMismatch {
            field: "Name".to_string(),
            expected: FieldKind::Text,
            actual: FieldKind::Decimal,
        }
    );

    let err = record
        .set_field(RecordField::Weight, Some(FieldValue::from("heavy")))
        .unwrap_err();
    assert!(matches!(err, CodecError::KindMismatch { .. }));

    assert_eq!(record.raw_document().map(str::to_string), before);
    assert_eq!(
        record.get_field(RecordField::Name),
        Some(FieldValue::from("Tom"))
    );
}

#[test]
fn fields_outside_the_collection_are_rejected_on_write_and_absent_on_read() {
    let mut cat = JsonRecord::new(Collection::Cats);
    cat.set_raw_document(Some(r#"{"name":"Tom","author":"Lem"}"#.to_string()));
    assert_eq!(cat.secondary_attribute(), None);
    assert!(matches!(
        cat.set_secondary_attribute(Some("Siamese".to_string())),
        Err(CodecError::UnsupportedField(_))
    ));

    let mut book = JsonRecord::new(Collection::Books);
    assert!(matches!(
        book.set_weight(Some(decimal("1"))),
        Err(CodecError::UnsupportedField(_))
    ));
    assert_eq!(book.raw_document(), None);
}

#[test]
fn collections_store_fields_under_their_own_keys() {
    let mut book = JsonRecord::new(Collection::Books);
    book.set_secondary_attribute(Some("Lem".to_string())).unwrap();
    book.set_numeric_attribute(Some(decimal("2"))).unwrap();
    assert_eq!(book.raw_document(), Some(r#"{"author":"Lem","lastReaded":2}"#));

    let mut cat = JsonRecord::new(Collection::Cats);
    cat.set_weight(Some(decimal("4.2"))).unwrap();
    cat.set_numeric_attribute(Some(decimal("2"))).unwrap();
    assert_eq!(cat.raw_document(), Some(r#"{"age":2,"weight":4.2}"#));
}

#[test]
fn record_serializes_as_flat_view_without_raw_document() {
    let mut record = JsonRecord::from_row(7, Collection::Cats, None, None);
    record.set_name(Some("Tom".to_string())).unwrap();
    record.set_numeric_attribute(Some(decimal("3.50"))).unwrap();
    record.set_image_url(Some("file:///blobs/cat-images/7".to_string()));

    let view = serde_json::to_value(&record).unwrap();
    assert_eq!(view["id"], 7);
    assert_eq!(view["name"], "Tom");
    assert!(view["weight"].is_null());
    assert!(view.get("author").is_none());
    assert_eq!(view["age"].to_string(), "3.50");
    assert_eq!(view["imageUrl"], "file:///blobs/cat-images/7");
    assert_eq!(view.as_object().unwrap().len(), 5);
}

#[test]
fn assign_id_only_takes_effect_once() {
    let mut record = JsonRecord::new(Collection::Books);
    record.assign_id(3);
    record.assign_id(9);
    assert_eq!(record.id(), Some(3));
}

/// Stores the JSON text hex-encoded.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct HexJsonCodec;

impl DocumentCodec for HexJsonCodec {
    fn decode(&self, raw: &str) -> CodecResult<Document> {
        if raw.len() % 2 != 0 {
            return Err(CodecError::Malformed("odd hex length".to_string()));
        }
        let bytes = (0..raw.len())
            .step_by(2)
            .map(|at| {
                raw.get(at..at + 2)
                    .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                    .ok_or_else(|| CodecError::Malformed(format!("bad hex at {at}")))
            })
            .collect::<CodecResult<Vec<u8>>>()?;
        let text =
            String::from_utf8(bytes).map_err(|err| CodecError::Malformed(err.to_string()))?;
        JsonCodec.decode(&text)
    }

    fn encode(&self, document: &Document) -> CodecResult<String> {
        let text = JsonCodec.encode(document)?;
        Ok(text.bytes().map(|byte| format!("{byte:02x}")).collect())
    }
}

#[test]
fn accessors_work_over_a_different_document_codec() {
    let mut record = JsonRecord::with_codec(Collection::Cats, HexJsonCodec);
    record.set_name(Some("Tom".to_string())).unwrap();
    record.set_weight(Some(decimal("4.5"))).unwrap();

    let raw = record.raw_document().unwrap();
    assert!(raw.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(HexJsonCodec.decode(raw).unwrap().len(), 2);
    assert_eq!(record.name().as_deref(), Some("Tom"));
    assert_eq!(record.weight(), Some(decimal("4.5")));

    record.set_raw_document(Some(r#"{"name":"Tom"}"#.to_string()));
    assert_eq!(record.name(), None);

    record.set_numeric_attribute(Some(decimal("3"))).unwrap();
    assert_eq!(
        HexJsonCodec.decode(record.raw_document().unwrap()).unwrap().keys().collect::<Vec<_>>(),
        vec!["age"]
    );
}
