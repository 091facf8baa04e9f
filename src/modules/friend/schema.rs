use serde::{Deserialize, Serialize};
use sqlx::prelude::{FromRow, Type};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(type_name = "friendship_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum FriendshipStatus {
    Pending,
    Accepted,
    Rejected,
}

/// Directed edge `from_user_id -> to_user_id`, unique per ordered pair.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FriendshipEntity {
    pub id: i64,
    pub from_user_id: i64,
    pub to_user_id: i64,
    pub status: FriendshipStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// An edge joined with the profile of the user on the other end.
#[derive(Debug, Clone, FromRow)]
pub struct FriendshipUserRow {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}
