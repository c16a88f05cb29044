//! Core storage and use-case logic for RecordShelf catalogues.
//! Books and cats live as typed fields inside a JSON document column, with a
//! fixed-schema book table alongside and images kept in a blob store.

pub mod blob;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use blob::{BlobError, BlobKey, BlobResult, BlobStore, FsBlobStore};
pub use config::{AppConfig, ConfigError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::book::{Book, BookId, BookValidationError};
pub use model::document::{
    CodecError, CodecResult, Document, DocumentCodec, FieldKind, FieldValue, JsonCodec,
};
pub use model::record::{Collection, JsonRecord, RecordField, RecordId, RESERVED_KEYS};
pub use repo::book_repo::{BookListQuery, BookRepository, SqliteBookRepository};
pub use repo::record_repo::{RecordListQuery, RecordRepository, SqliteRecordRepository};
pub use repo::{RepoError, RepoResult};
pub use service::book_service::{BookService, BookServiceError};
pub use service::image_service::{is_image_content_type, ImageService, ImageServiceError};
pub use service::record_service::{
    RecordDraft, RecordPatch, RecordService, RecordServiceError,
};

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
