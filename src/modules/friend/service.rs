use std::sync::Arc;

use log::info;

use crate::{
    api::error,
    modules::{
        friend::{
            model::{FriendResponse, FriendshipResponse, PendingRequestResponse},
            repository::FriendRepo,
            schema::FriendshipStatus,
            state::{self, FriendAction},
        },
        user::repository::UserRepo,
    },
};

#[derive(Clone)]
pub struct FriendService {
    friend_repo: Arc<dyn FriendRepo>,
    user_repo: Arc<dyn UserRepo>,
}

impl FriendService {
    pub fn with_dependencies(
        friend_repo: Arc<dyn FriendRepo>,
        user_repo: Arc<dyn UserRepo>,
    ) -> Self {
        info!("FriendService initialized with dependencies");
        FriendService { friend_repo, user_repo }
    }

    /// `sender_id` asks `receiver_id` to be friends (edge sender -> receiver).
    pub async fn send_friend_request(
        &self,
        sender_id: i64,
        receiver_id: i64,
    ) -> Result<FriendshipResponse, error::SystemError> {
        state::ensure_distinct(sender_id, receiver_id)?;

        if self.user_repo.find_by_id(receiver_id).await?.is_none() {
            return Err(error::SystemError::not_found("User not found."));
        }

        // A first request needs no lock; the unique pair settles concurrent ones.
        if self.friend_repo.find_friendship(sender_id, receiver_id).await?.is_none() {
            let (edge, created) = self
                .friend_repo
                .create_if_absent(sender_id, receiver_id, FriendshipStatus::Pending)
                .await?;
            if created {
                info!("Friend request sent {} -> {}", sender_id, receiver_id);
                return Ok(FriendshipResponse::from(edge));
            }
            info!("Concurrent friend request {sender_id} -> {receiver_id} lost the race");
        }

        let edge =
            self.friend_repo.apply_transition(sender_id, receiver_id, FriendAction::Send).await?;

        info!("Friend request sent {} -> {}", sender_id, receiver_id);
        Ok(FriendshipResponse::from(edge))
    }

    /// `receiver_id` accepts the request `sender_id` sent them.
    pub async fn accept_friend_request(
        &self,
        receiver_id: i64,
        sender_id: i64,
    ) -> Result<FriendshipResponse, error::SystemError> {
        state::ensure_distinct(receiver_id, sender_id)?;

        let edge =
            self.friend_repo.apply_transition(sender_id, receiver_id, FriendAction::Accept).await?;

        info!("Friend request accepted {} -> {}", sender_id, receiver_id);
        Ok(FriendshipResponse::from(edge))
    }

    /// `receiver_id` rejects the request `sender_id` sent them.
    pub async fn reject_friend_request(
        &self,
        receiver_id: i64,
        sender_id: i64,
    ) -> Result<FriendshipResponse, error::SystemError> {
        state::ensure_distinct(receiver_id, sender_id)?;

        let edge =
            self.friend_repo.apply_transition(sender_id, receiver_id, FriendAction::Reject).await?;

        info!("Friend request rejected {} -> {}", sender_id, receiver_id);
        Ok(FriendshipResponse::from(edge))
    }

    pub async fn get_friends(
        &self,
        user_id: i64,
    ) -> Result<Vec<FriendResponse>, error::SystemError> {
        let rows = self.friend_repo.find_friends(user_id).await?;
        Ok(rows.into_iter().map(FriendResponse::from).collect())
    }

    pub async fn get_pending_requests(
        &self,
        user_id: i64,
    ) -> Result<Vec<PendingRequestResponse>, error::SystemError> {
        let rows = self.friend_repo.find_pending_requests(user_id).await?;
        Ok(rows.into_iter().map(PendingRequestResponse::from).collect())
    }
}
