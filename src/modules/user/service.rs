use log::info;
use std::sync::Arc;

use crate::api::error;
use crate::api::pagination::{Page, Paginated};
use crate::modules::user::model::{
    AuthUser, InsertUser, SearchQuery, SignInModel, SignUpModel, UserResponse,
};
use crate::modules::user::repository::UserRepo;
use crate::modules::user::validation::{check_password, PasswordContext};
use crate::utils::{generate_token_key, hash_password, verify_password};

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepo>,
}

impl UserService {
    pub fn with_dependencies(repo: Arc<dyn UserRepo>) -> Self {
        info!("UserService initialized with dependencies");
        UserService { repo }
    }

    pub async fn sign_up(&self, user: SignUpModel) -> Result<UserResponse, error::SystemError> {
        let email = user.email.trim().to_lowercase();

        check_password(
            &user.password,
            &PasswordContext {
                username: &user.username,
                email: &email,
                first_name: &user.first_name,
                last_name: &user.last_name,
            },
        )
        .map_err(|weakness| error::SystemError::bad_request(weakness.to_string()))?;

        if self.repo.find_by_username(&user.username).await?.is_some() {
            return Err(error::SystemError::bad_request(
                "A user with that username already exists.",
            ));
        }
        if self.repo.find_by_email(&email).await?.is_some() {
            return Err(error::SystemError::bad_request("A user with that email already exists."));
        }

        let hash_password = hash_password(&user.password)?;

        let new_user = InsertUser {
            username: user.username,
            email,
            hash_password,
            first_name: user.first_name,
            last_name: user.last_name,
        };

        // The unique indexes still guard against a concurrent sign-up.
        let created = self.repo.create(&new_user).await?;
        info!("User {} registered", created.id);
        Ok(UserResponse::from(created))
    }

    pub async fn sign_in(&self, user: SignInModel) -> Result<String, error::SystemError> {
        let incorrect = || error::SystemError::bad_request("Incorrect Credentials");

        let user_entity = self.repo.find_by_username(&user.username).await?.ok_or_else(incorrect)?;

        if !verify_password(&user_entity.hash_password, &user.password)? || !user_entity.is_active {
            return Err(incorrect());
        }

        let token = self.repo.get_or_create_token(user_entity.id, &generate_token_key()).await?;
        info!("User {} signed in", user_entity.id);
        Ok(token)
    }

    pub async fn authenticate(&self, token: &str) -> Result<AuthUser, error::SystemError> {
        match self.repo.find_user_by_token(token).await? {
            Some(user) if user.is_active => Ok(AuthUser::from(user)),
            _ => Err(error::SystemError::unauthorized("Invalid token.")),
        }
    }

    pub async fn search(
        &self,
        query: SearchQuery,
    ) -> Result<Paginated<UserResponse>, error::SystemError> {
        let page = Page::from_query(query.page, query.page_size);

        let Some(term) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(Paginated::empty());
        };

        let (users, count) = self.repo.search_users(term, page.limit(), page.offset()).await?;
        if page.is_out_of_range(count) {
            return Err(error::SystemError::not_found("Invalid page."));
        }

        Ok(Paginated::new(page, count, users.into_iter().map(UserResponse::from).collect()))
    }
}
