//! Shared utilities and common types for the StudyHub backend.
//!
//! This crate provides common functionality used across all other crates:
//! - JWT token issuing and validation
//! - Password hashing with Argon2id
//! - Content hashing for stored images
//! - Common validation logic

pub mod crypto;
pub mod jwt;
pub mod pagination;
pub mod password;
pub mod validation;
