use recordshelf_core::db::open_db_in_memory;
use recordshelf_core::{
    Collection, JsonRecord, RecordListQuery, RecordRepository, RepoError, SqliteRecordRepository,
};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn cat(name: &str, age: i64) -> JsonRecord {
    let mut record = JsonRecord::new(Collection::Cats);
    record.set_name(Some(name.to_string())).unwrap();
    record.set_numeric_attribute(Some(Decimal::from(age))).unwrap();
    record
}

#[test]
fn create_get_update_delete_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRecordRepository::try_new(&conn, Collection::Cats).unwrap();

    let id = repo.create_record(&cat("Tom", 3)).unwrap();
    let mut loaded = repo.get_record(id).unwrap().unwrap();
    assert_eq!(loaded.id(), Some(id));
    assert_eq!(loaded.collection(), Collection::Cats);
    assert_eq!(loaded.name().as_deref(), Some("Tom"));
    assert_eq!(loaded.numeric_attribute(), Some(Decimal::from(3)));

    loaded.set_numeric_attribute(Some(Decimal::from(4))).unwrap();
    loaded.set_image_url(Some("file:///tmp/cat-images/1".to_string()));
    repo.update_record(&loaded).unwrap();

    let updated = repo.get_record(id).unwrap().unwrap();
    assert_eq!(updated.numeric_attribute(), Some(Decimal::from(4)));
    assert_eq!(updated.image_url(), Some("file:///tmp/cat-images/1"));
    assert_eq!(updated.raw_document(), loaded.raw_document());

    repo.delete_record(id).unwrap();
    assert!(repo.get_record(id).unwrap().is_none());
}

#[test]
fn record_without_document_is_stored_as_null() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRecordRepository::try_new(&conn, Collection::Books).unwrap();

    let id = repo.create_record(&JsonRecord::new(Collection::Books)).unwrap();
    let loaded = repo.get_record(id).unwrap().unwrap();

    assert_eq!(loaded.raw_document(), None);
    assert_eq!(loaded.name(), None);
    assert_eq!(loaded.image_url(), None);
}

#[test]
fn stored_document_text_is_returned_verbatim() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRecordRepository::try_new(&conn, Collection::Books).unwrap();

    let raw = "{ \"name\" : \"Dune\", \"extra\": [1, 2] }";
    let mut record = JsonRecord::new(Collection::Books);
    record.set_raw_document(Some(raw.to_string()));
    let id = repo.create_record(&record).unwrap();

    let loaded = repo.get_record(id).unwrap().unwrap();
    assert_eq!(loaded.raw_document(), Some(raw));
    assert_eq!(loaded.name().as_deref(), Some("Dune"));
}

#[test]
fn collections_are_isolated_from_each_other() {
    let conn = open_db_in_memory().unwrap();
    let cats = SqliteRecordRepository::try_new(&conn, Collection::Cats).unwrap();
    let books = SqliteRecordRepository::try_new(&conn, Collection::Books).unwrap();

    let cat_id = cats.create_record(&cat("Tom", 3)).unwrap();

    assert!(books.get_record(cat_id).unwrap().is_none());
    assert!(books
        .list_records(&RecordListQuery::default())
        .unwrap()
        .is_empty());
}

#[test]
fn create_rejects_persisted_or_foreign_records() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRecordRepository::try_new(&conn, Collection::Cats).unwrap();

    let persisted = JsonRecord::from_row(5, Collection::Cats, None, None);
    assert!(matches!(
        repo.create_record(&persisted),
        Err(RepoError::InvalidData(_))
    ));

    let book = JsonRecord::new(Collection::Books);
    assert!(matches!(
        repo.create_record(&book),
        Err(RepoError::InvalidData(_))
    ));
}

#[test]
fn update_and_delete_of_missing_rows_report_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRecordRepository::try_new(&conn, Collection::Cats).unwrap();

    let ghost = JsonRecord::from_row(404, Collection::Cats, None, None);
    assert!(matches!(
        repo.update_record(&ghost),
        Err(RepoError::NotFound(404))
    ));
    assert!(matches!(
        repo.delete_record(404),
        Err(RepoError::NotFound(404))
    ));
    assert!(matches!(
        repo.update_record(&JsonRecord::new(Collection::Cats)),
        Err(RepoError::InvalidData(_))
    ));
}

#[test]
fn list_records_orders_by_id_and_paginates() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRecordRepository::try_new(&conn, Collection::Cats).unwrap();

    let ids: Vec<_> = ["Tom", "Felix", "Garfield", "Salem"]
        .into_iter()
        .enumerate()
        .map(|(age, name)| repo.create_record(&cat(name, age as i64)).unwrap())
        .collect();

    let all = repo.list_records(&RecordListQuery::default()).unwrap();
    assert_eq!(
        all.iter().map(|record| record.id().unwrap()).collect::<Vec<_>>(),
        ids
    );

    let page = repo
        .list_records(&RecordListQuery {
            limit: Some(2),
            offset: 1,
        })
        .unwrap();
    assert_eq!(
        page.iter()
            .map(|record| record.name().unwrap())
            .collect::<Vec<_>>(),
        vec!["Felix", "Garfield"]
    );

    let tail = repo
        .list_records(&RecordListQuery {
            limit: None,
            offset: 3,
        })
        .unwrap();
    assert_eq!(tail.len(), 1);
    assert_eq!(tail[0].name().as_deref(), Some("Salem"));
}

#[test]
fn try_new_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteRecordRepository::try_new(&conn, Collection::Cats) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        }) => {
            assert!(expected_version > 0);
            assert_eq!(actual_version, 0);
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("unmigrated connection must be rejected"),
    }
}

#[test]
fn try_new_rejects_missing_table() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch("DROP TABLE json_cats;").unwrap();

    assert!(matches!(
        SqliteRecordRepository::try_new(&conn, Collection::Cats),
        Err(RepoError::MissingRequiredTable("json_cats"))
    ));
    assert!(SqliteRecordRepository::try_new(&conn, Collection::Books).is_ok());
}

#[test]
fn try_new_rejects_missing_column() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "DROP TABLE json_books;
         CREATE TABLE json_books (id INTEGER PRIMARY KEY, document TEXT);",
    )
    .unwrap();

    assert!(matches!(
        SqliteRecordRepository::try_new(&conn, Collection::Books),
        Err(RepoError::MissingRequiredColumn {
            table: "json_books",
            column: "image_url"
        })
    ));
}
