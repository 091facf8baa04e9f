use crate::{
    api::error,
    modules::user::{model::InsertUser, schema::UserEntity},
};

#[async_trait::async_trait]
pub trait UserRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<UserEntity>, error::SystemError>;
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserEntity>, error::SystemError>;
    /// Case-insensitive.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>, error::SystemError>;
    async fn create(&self, user: &InsertUser) -> Result<UserEntity, error::SystemError>;

    /// Case-insensitive substring match on email, first name or last name.
    /// Returns one page of users ordered by id and the total match count.
    async fn search_users(
        &self,
        query: &str,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<UserEntity>, i64), error::SystemError>;
}

#[async_trait::async_trait]
pub trait TokenRepository {
    /// Returns the user's token, issuing `candidate` if they have none yet.
    async fn get_or_create_token(
        &self,
        user_id: i64,
        candidate: &str,
    ) -> Result<String, error::SystemError>;

    async fn find_user_by_token(&self, key: &str)
    -> Result<Option<UserEntity>, error::SystemError>;
}

pub trait UserRepo: UserRepository + TokenRepository + Send + Sync {}

impl<T> UserRepo for T where T: UserRepository + TokenRepository + Send + Sync {}
