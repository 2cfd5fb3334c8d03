//! Minimum-membership rule shared by groups and chat rooms.
//!
//! A group or chat room never lingers with a single member: when a leave or
//! kick would drop it below [`MIN_ACTIVE_MEMBERS`], it is deleted instead.

/// Smallest membership a group or room may keep after a removal.
pub const MIN_ACTIVE_MEMBERS: i64 = 2;

/// What to do with the container when one member is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalAction {
    /// Remove the member; `remaining` members stay.
    RemoveMember { remaining: i64 },
    /// Delete the whole group or room.
    Dissolve,
}

/// Decides the effect of removing one member from a container that currently
/// has `members_before` members.
pub fn on_member_removed(members_before: i64) -> RemovalAction {
    let remaining = members_before - 1;
    if remaining < MIN_ACTIVE_MEMBERS {
        RemovalAction::Dissolve
    } else {
        RemovalAction::RemoveMember { remaining }
    }
}
