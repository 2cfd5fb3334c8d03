//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod application;
pub mod chat;
pub mod comment;
pub mod group;
pub mod group_message;
pub mod ranking;
pub mod session;
pub mod study_record;
pub mod user;

pub use application::{ApplicationStatusDb, GroupApplicationEntity};
pub use chat::{ChatMessageEntity, ChatRoomEntity, MessageKindDb};
pub use comment::RoomCommentEntity;
pub use group::{GroupEntity, GroupWithMembershipEntity};
pub use group_message::GroupMessageEntity;
pub use ranking::{GroupRankingEntity, UserRankingEntity};
pub use session::UserSessionEntity;
pub use study_record::{StudyFeedEntity, StudyModeDb, StudyRecordEntity};
pub use user::{UserEntity, UserSummaryEntity};
