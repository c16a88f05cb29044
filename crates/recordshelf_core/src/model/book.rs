//! Fixed-schema book entity.
//!
//! # Responsibility
//! - Define the typed-column counterpart of a document-backed book record.
//! - Own field validation shared by every write and read path.
//!
//! # Invariants
//! - `name` and `author` are 4..=100 characters.
//! - `last_readed` is at least 1.

use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type BookId = i64;

const TEXT_MIN_CHARS: usize = 4;
const TEXT_MAX_CHARS: usize = 100;
const LAST_READED_MIN: i64 = 1;

/// Validation failures for `Book` fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookValidationError {
    /// Text field length is outside the accepted range.
    TextLength {
        field: &'static str,
        length: usize,
    },
    LastReadedTooSmall(i64),
}

impl Display for BookValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TextLength { field, length } => write!(
                f,
                "{field} should have between {TEXT_MIN_CHARS} and {TEXT_MAX_CHARS} characters, got {length}"
            ),
            Self::LastReadedTooSmall(value) => write!(
                f,
                "last_readed must be at least {LAST_READED_MIN}, got {value}"
            ),
        }
    }
}

impl Error for BookValidationError {}

/// Book row with one typed column per field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// `None` until storage assigns a key.
    pub id: Option<BookId>,
    pub name: String,
    pub author: String,
    pub last_readed: i64,
}

impl Book {
    /// Creates an unsaved book.
    pub fn new(name: impl Into<String>, author: impl Into<String>, last_readed: i64) -> Self {
        Self {
            id: None,
            name: name.into(),
            author: author.into(),
            last_readed,
        }
    }

    /// Checks every field constraint, reporting the first violation.
    pub fn validate(&self) -> Result<(), BookValidationError> {
        check_text_length("name", &self.name)?;
        check_text_length("author", &self.author)?;
        if self.last_readed < LAST_READED_MIN {
            return Err(BookValidationError::LastReadedTooSmall(self.last_readed));
        }
        Ok(())
    }
}

fn check_text_length(field: &'static str, value: &str) -> Result<(), BookValidationError> {
    let length = value.chars().count();
    if (TEXT_MIN_CHARS..=TEXT_MAX_CHARS).contains(&length) {
        Ok(())
    } else {
        Err(BookValidationError::TextLength { field, length })
    }
}
