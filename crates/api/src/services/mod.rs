//! Application services.

pub mod auth;
pub mod image_store;

pub use auth::AuthService;
pub use image_store::LocalImageStore;
