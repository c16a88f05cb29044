//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository and blob store calls into use-case level APIs.
//! - Translate storage not-found conditions into use-case errors.

pub mod book_service;
pub mod image_service;
pub mod record_service;
