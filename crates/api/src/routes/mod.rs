//! HTTP route handlers.

pub mod applications;
pub mod auth;
pub mod chats;
pub mod comments;
pub mod follows;
pub mod group_messages;
pub mod groups;
pub mod health;
pub mod images;
pub mod rankings;
pub mod study_records;
pub mod users;
