//! Transition rules for a single directed friendship edge.
//!
//! An edge `A -> B` is either absent or in one of the [`FriendshipStatus`]
//! phases. Actions are always evaluated against the edge they touch: `send`
//! runs on `actor -> target`, while `accept` and `reject` run on
//! `target -> actor` (the request the actor received). Nothing here performs
//! I/O; callers load the edge, ask for a [`Plan`] and persist it.

use crate::modules::friend::schema::FriendshipStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FriendAction {
    Send,
    Accept,
    Reject,
}

/// What to do with the edge an action was evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeWrite {
    Insert(FriendshipStatus),
    Update(FriendshipStatus),
    Keep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    pub edge: EdgeWrite,
    /// Status the opposite-direction edge must be created or updated to.
    pub reciprocal: Option<FriendshipStatus>,
}

impl Plan {
    fn edge(edge: EdgeWrite) -> Self {
        Plan { edge, reciprocal: None }
    }

    /// Status the evaluated edge ends up in, given where it started.
    pub fn resulting_status(&self, current: Option<FriendshipStatus>) -> Option<FriendshipStatus> {
        match self.edge {
            EdgeWrite::Insert(status) | EdgeWrite::Update(status) => Some(status),
            EdgeWrite::Keep => current,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    #[error("You cannot send a friend request to yourself.")]
    SelfRequest,
    #[error("Friend request already sent.")]
    AlreadySent,
    #[error("You both are already friends.")]
    AlreadyFriends,
    #[error("Friend request not found.")]
    RequestNotFound,
}

/// Rejects any action a user would perform on themselves, before any lookup.
pub fn ensure_distinct(actor_id: i64, target_id: i64) -> Result<(), TransitionError> {
    if actor_id == target_id {
        return Err(TransitionError::SelfRequest);
    }
    Ok(())
}

pub fn plan(
    current: Option<FriendshipStatus>,
    action: FriendAction,
) -> Result<Plan, TransitionError> {
    use FriendshipStatus::*;

    match (action, current) {
        (FriendAction::Send, None) => Ok(Plan::edge(EdgeWrite::Insert(Pending))),
        (FriendAction::Send, Some(Rejected)) => Ok(Plan::edge(EdgeWrite::Update(Pending))),
        (FriendAction::Send, Some(Pending)) => Err(TransitionError::AlreadySent),

        // A rejected request can still be accepted later by its recipient.
        (FriendAction::Accept, Some(Pending | Rejected)) => Ok(Plan {
            edge: EdgeWrite::Update(Accepted),
            reciprocal: Some(Accepted),
        }),

        (FriendAction::Reject, Some(Pending)) => Ok(Plan::edge(EdgeWrite::Update(Rejected))),
        (FriendAction::Reject, Some(Rejected)) => Ok(Plan::edge(EdgeWrite::Keep)),

        (_, Some(Accepted)) => Err(TransitionError::AlreadyFriends),
        (FriendAction::Accept | FriendAction::Reject, None) => {
            Err(TransitionError::RequestNotFound)
        }
    }
}

/// The legacy three-flag view of a status; exactly one flag is ever set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct StatusFlags {
    pub friend_status: bool,
    pub request_status: bool,
    pub reject_status: bool,
}

impl From<FriendshipStatus> for StatusFlags {
    fn from(status: FriendshipStatus) -> Self {
        StatusFlags {
            friend_status: status == FriendshipStatus::Accepted,
            request_status: status == FriendshipStatus::Pending,
            reject_status: status == FriendshipStatus::Rejected,
        }
    }
}
