use actix_web::{get, post, web};

use crate::api::{error, pagination::Paginated, success};
use crate::modules::user::{model, service::UserService};
use crate::utils::{ValidatedJson, ValidatedQuery};

#[post("/create/")]
pub async fn sign_up(
    user_service: web::Data<UserService>,
    user_data: ValidatedJson<model::SignUpModel>,
) -> Result<success::Success<model::UserResponse>, error::Error> {
    let user = user_service.sign_up(user_data.0).await?;
    Ok(success::Success::created(Some(user)).message("User created successfully"))
}

#[post("/login/")]
pub async fn sign_in(
    user_service: web::Data<UserService>,
    user_data: ValidatedJson<model::SignInModel>,
) -> Result<success::Success<model::SignInResponse>, error::Error> {
    let token = user_service.sign_in(user_data.0).await?;
    Ok(success::Success::ok(Some(model::SignInResponse { token })).message("Login successful"))
}

#[get("/search-users/")]
pub async fn search_users(
    user_service: web::Data<UserService>,
    query: ValidatedQuery<model::SearchQuery>,
) -> Result<success::Success<Paginated<model::UserResponse>>, error::Error> {
    let users = user_service.search(query.0).await?;
    Ok(success::Success::ok(Some(users)).message("Users retrieved successfully"))
}
