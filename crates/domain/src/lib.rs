//! Domain layer for the StudyHub backend.
//!
//! This crate contains:
//! - Domain models and request/response DTOs
//! - Point ledger and membership rules
//! - The image storage abstraction

pub mod models;
pub mod services;
