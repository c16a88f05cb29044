//! Record use-case service.
//!
//! # Responsibility
//! - Provide create/get/list/update/delete and field filters for one
//!   collection of dynamic-schema records.
//! - Route every field change through the record's field setter.
//!
//! # Invariants
//! - Updates only touch fields present in the patch.
//! - A draft or patch naming a field the collection does not store fails
//!   with `Codec(UnsupportedField)` before anything is written.
//! - Create and update return the stored state read back from the repository.

use crate::model::document::{CodecError, FieldValue};
use crate::model::record::{Collection, JsonRecord, RecordField, RecordId};
use crate::repo::record_repo::{RecordListQuery, RecordRepository};
use crate::repo::RepoError;
use log::{info, warn};
use rust_decimal::Decimal;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for record use-cases.
#[derive(Debug)]
pub enum RecordServiceError {
    RecordNotFound(RecordId),
    Repo(RepoError),
    Codec(CodecError),
    /// Write succeeded but the row could not be read back.
    InconsistentState(&'static str),
}

impl Display for RecordServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RecordNotFound(id) => write!(f, "record not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Codec(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent record state: {details}"),
        }
    }
}

impl Error for RecordServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Codec(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for RecordServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::RecordNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<CodecError> for RecordServiceError {
    fn from(value: CodecError) -> Self {
        Self::Codec(value)
    }
}

/// Field values for a new record. `None` fields are left out of the document,
/// and a draft with no fields creates a record without a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordDraft {
    pub name: Option<String>,
    pub secondary_attribute: Option<String>,
    pub numeric_attribute: Option<Decimal>,
    pub weight: Option<Decimal>,
    pub image_url: Option<String>,
}

impl RecordDraft {
    fn field_values(&self) -> Vec<(RecordField, FieldValue)> {
        present_fields(
            &self.name,
            &self.secondary_attribute,
            self.numeric_attribute,
            self.weight,
        )
    }
}

/// Partial update. `None` fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordPatch {
    pub name: Option<String>,
    pub secondary_attribute: Option<String>,
    pub numeric_attribute: Option<Decimal>,
    pub weight: Option<Decimal>,
    pub image_url: Option<String>,
}

impl RecordPatch {
    fn field_values(&self) -> Vec<(RecordField, FieldValue)> {
        present_fields(
            &self.name,
            &self.secondary_attribute,
            self.numeric_attribute,
            self.weight,
        )
    }
}

fn present_fields(
    name: &Option<String>,
    secondary_attribute: &Option<String>,
    numeric_attribute: Option<Decimal>,
    weight: Option<Decimal>,
) -> Vec<(RecordField, FieldValue)> {
    [
        (RecordField::Name, name.clone().map(FieldValue::Text)),
        (
            RecordField::SecondaryAttribute,
            secondary_attribute.clone().map(FieldValue::Text),
        ),
        (
            RecordField::NumericAttribute,
            numeric_attribute.map(FieldValue::Decimal),
        ),
        (RecordField::Weight, weight.map(FieldValue::Decimal)),
    ]
    .into_iter()
    .filter_map(|(field, value)| value.map(|value| (field, value)))
    .collect()
}

/// Record service facade over a repository implementation.
pub struct RecordService<R: RecordRepository> {
    repo: R,
}

impl<R: RecordRepository> RecordService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn collection(&self) -> Collection {
        self.repo.collection()
    }

    /// Creates one record from a draft and returns the stored state.
    pub fn create_record(&self, draft: &RecordDraft) -> Result<JsonRecord, RecordServiceError> {
        let mut record = JsonRecord::new(self.collection());
        for (field, value) in draft.field_values() {
            record.set_field(field, Some(value))?;
        }
        record.set_image_url(draft.image_url.clone());

        let id = self.repo.create_record(&record)?;
        self.repo
            .get_record(id)?
            .ok_or(RecordServiceError::InconsistentState(
                "created record not found in read-back",
            ))
    }

    /// Gets one record, failing with `RecordNotFound` when absent.
    pub fn get_record(&self, id: RecordId) -> Result<JsonRecord, RecordServiceError> {
        match self.repo.get_record(id)? {
            Some(record) => Ok(record),
            None => {
                warn!(
                    "event=record_get module=service status=not_found collection={} id={id}",
                    self.collection().label()
                );
                Err(RecordServiceError::RecordNotFound(id))
            }
        }
    }

    pub fn list_records(
        &self,
        limit: Option<u32>,
        offset: u32,
    ) -> Result<Vec<JsonRecord>, RecordServiceError> {
        let query = RecordListQuery { limit, offset };
        Ok(self.repo.list_records(&query)?)
    }

    /// Applies a partial update and returns the stored state.
    pub fn update_record(
        &self,
        id: RecordId,
        patch: &RecordPatch,
    ) -> Result<JsonRecord, RecordServiceError> {
        let mut record = self.get_record(id)?;
        for (field, value) in patch.field_values() {
            record.set_field(field, Some(value))?;
        }
        if let Some(image_url) = &patch.image_url {
            record.set_image_url(Some(image_url.clone()));
        }

        self.repo.update_record(&record)?;
        info!(
            "event=record_update module=service status=ok collection={} id={id}",
            self.collection().label()
        );

        self.repo
            .get_record(id)?
            .ok_or(RecordServiceError::InconsistentState(
                "updated record not found in read-back",
            ))
    }

    pub fn delete_record(&self, id: RecordId) -> Result<(), RecordServiceError> {
        Ok(self.repo.delete_record(id)?)
    }

    pub fn find_by_numeric_attribute(
        &self,
        value: Decimal,
    ) -> Result<Vec<JsonRecord>, RecordServiceError> {
        Ok(self.repo.find_by_numeric_attribute(value)?)
    }

    pub fn find_by_weight(&self, value: Decimal) -> Result<Vec<JsonRecord>, RecordServiceError> {
        Ok(self.repo.find_by_weight(value)?)
    }

    pub fn find_by_secondary_attribute(
        &self,
        value: &str,
    ) -> Result<Vec<JsonRecord>, RecordServiceError> {
        Ok(self.repo.find_by_secondary_attribute(value)?)
    }
}
