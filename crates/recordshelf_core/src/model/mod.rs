//! Domain model for catalogue records.
//!
//! # Responsibility
//! - Define the document type and codec boundary for dynamic-schema rows.
//! - Define the dynamic-schema record and the fixed-schema book entity.
//!
//! # Invariants
//! - Every persisted record is identified by a store-generated integer key.
//! - Deletion is a hard delete of the whole row.

pub mod book;
pub mod document;
pub mod record;
