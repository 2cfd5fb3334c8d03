//! Domain models for StudyHub.

pub mod application;
pub mod chat;
pub mod comment;
pub mod follow;
pub mod group;
pub mod group_message;
pub mod ranking;
pub mod study_record;
pub mod user;

pub use application::{ApplicationStatus, GroupApplication};
pub use chat::{ChatMessage, ChatRoom, MessageKind};
pub use comment::RoomComment;
pub use follow::FollowStatus;
pub use group::Group;
pub use group_message::GroupMessage;
pub use ranking::{GroupRanking, UserRanking};
pub use study_record::{StudyMode, StudyRecord};
pub use user::{User, UserProfile, UserSummary};
