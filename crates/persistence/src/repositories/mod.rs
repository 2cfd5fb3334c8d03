//! Repository implementations for database operations.

pub mod application;
pub mod chat;
pub mod comment;
pub mod follow;
pub mod group;
pub mod group_message;
pub mod ledger;
pub mod ranking;
pub mod session;
pub mod study_record;
pub mod user;

pub use application::{ApplicationRepository, DecisionOutcome};
pub use chat::{ChatRepository, RoomAccess};
pub use comment::CommentRepository;
pub use follow::FollowRepository;
pub use group::{GroupRepository, JoinOutcome, NewGroup};
pub use group_message::GroupMessageRepository;
pub use ledger::{AppliedBalances, LedgerStoreError};
pub use ranking::RankingRepository;
pub use session::SessionRepository;
pub use study_record::{
    CreateRecordOutcome, DeleteRecordOutcome, FeedFilter, NewStudyRecord, StudyRecordRepository,
};
pub use user::UserRepository;
