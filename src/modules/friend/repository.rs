use crate::api::error;
use crate::modules::friend::{
    schema::{FriendshipEntity, FriendshipStatus, FriendshipUserRow},
    state::FriendAction,
};

/// Storage for directed friendship edges, keyed by the ordered pair
/// `(from_id, to_id)`.
#[async_trait::async_trait]
pub trait FriendshipRepository {
    async fn find_friendship(
        &self,
        from_id: i64,
        to_id: i64,
    ) -> Result<Option<FriendshipEntity>, error::SystemError>;

    /// Returns the stored edge and whether this call inserted it. An existing
    /// edge is returned untouched.
    async fn create_if_absent(
        &self,
        from_id: i64,
        to_id: i64,
        status: FriendshipStatus,
    ) -> Result<(FriendshipEntity, bool), error::SystemError>;

    /// Accepted edges `user_id -> X`, projected onto X.
    async fn find_friends(&self, user_id: i64)
    -> Result<Vec<FriendshipUserRow>, error::SystemError>;

    /// Pending edges `X -> user_id`, projected onto X.
    async fn find_pending_requests(
        &self,
        user_id: i64,
    ) -> Result<Vec<FriendshipUserRow>, error::SystemError>;
}

#[async_trait::async_trait]
pub trait FriendRepo: FriendshipRepository + Send + Sync {
    /// Applies `action` to edge `from_id -> to_id` as one unit. The pair is
    /// locked before the state machine judges it, and the forward edge and
    /// any reciprocal edge are written together or not at all.
    async fn apply_transition(
        &self,
        from_id: i64,
        to_id: i64,
        action: FriendAction,
    ) -> Result<FriendshipEntity, error::SystemError>;
}
