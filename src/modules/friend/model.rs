use serde::Serialize;

use crate::modules::friend::{
    schema::{FriendshipEntity, FriendshipStatus, FriendshipUserRow},
    state::StatusFlags,
};

#[derive(Debug, Clone, Serialize)]
pub struct FriendshipResponse {
    pub id: i64,
    pub from_user: i64,
    pub to_user: i64,
    pub status: FriendshipStatus,
    #[serde(flatten)]
    pub flags: StatusFlags,
}

impl From<FriendshipEntity> for FriendshipResponse {
    fn from(entity: FriendshipEntity) -> Self {
        FriendshipResponse {
            id: entity.id,
            from_user: entity.from_user_id,
            to_user: entity.to_user_id,
            status: entity.status,
            flags: entity.status.into(),
        }
    }
}

/// Public profile fields exposed on friend and pending lists.
#[derive(Debug, Clone, Serialize)]
pub struct ViewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FriendResponse {
    pub id: i64,
    pub to_user: ViewUser,
}

impl From<FriendshipUserRow> for FriendResponse {
    fn from(row: FriendshipUserRow) -> Self {
        FriendResponse {
            id: row.id,
            to_user: ViewUser {
                first_name: row.first_name,
                last_name: row.last_name,
                email: row.email,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PendingRequestResponse {
    pub id: i64,
    pub from_user: ViewUser,
}

impl From<FriendshipUserRow> for PendingRequestResponse {
    fn from(row: FriendshipUserRow) -> Self {
        PendingRequestResponse {
            id: row.id,
            from_user: ViewUser {
                first_name: row.first_name,
                last_name: row.last_name,
                email: row.email,
            },
        }
    }
}
