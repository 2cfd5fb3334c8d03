//! Domain services for StudyHub.
//!
//! Services contain business rules that operate on domain models without
//! touching the database.

pub mod image_store;
pub mod ledger;
pub mod membership;

pub use image_store::{
    extract_image_key, is_valid_image_key, ImageFormat, ImageStore, ImageStoreError, ImageUpload,
    MockImageStore,
};
pub use ledger::{apply_to_balance, session_totals, LedgerError, PointDelta, SessionTotals};
pub use membership::{on_member_removed, RemovalAction, MIN_ACTIVE_MEMBERS};
