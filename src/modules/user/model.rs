use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::modules::user::{schema::UserEntity, validation::validate_username};

#[derive(Deserialize, Validate)]
pub struct SignUpModel {
    #[validate(
        length(min = 1, max = 150, message = "Username must be between 1 and 150 characters"),
        custom(function = "validate_username")
    )]
    pub username: String,
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password cannot be empty"))]
    pub password: String,
    #[serde(default)]
    #[validate(length(max = 150, message = "First name must be at most 150 characters"))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(max = 150, message = "Last name must be at most 150 characters"))]
    pub last_name: String,
}

#[derive(Deserialize, Validate)]
pub struct SignInModel {
    #[validate(length(min = 1, message = "Username cannot be empty"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password cannot be empty"))]
    pub password: String,
}

#[derive(Deserialize, Validate)]
pub struct SearchQuery {
    pub search: Option<String>,
    #[validate(range(min = 1, message = "Page must be a positive integer"))]
    pub page: Option<u32>,
    #[validate(range(min = 1, message = "Page size must be a positive integer"))]
    pub page_size: Option<u32>,
}

pub struct InsertUser {
    pub username: String,
    pub email: String,
    pub hash_password: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Serialize)]
pub struct SignInResponse {
    pub token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<UserEntity> for UserResponse {
    fn from(entity: UserEntity) -> Self {
        UserResponse {
            id: entity.id,
            username: entity.username,
            email: entity.email,
            first_name: entity.first_name,
            last_name: entity.last_name,
        }
    }
}

/// The authenticated caller, stored in request extensions by the
/// authentication middleware.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
}

impl From<UserEntity> for AuthUser {
    fn from(entity: UserEntity) -> Self {
        AuthUser { id: entity.id, username: entity.username }
    }
}
