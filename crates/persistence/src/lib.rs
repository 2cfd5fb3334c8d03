//! Persistence layer for the StudyHub backend.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - Repository implementations, including the point ledger
//! - Query metrics

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;
