use actix_web::{get, middleware::from_fn, post, web, HttpRequest};

use crate::{
    api::{error, success},
    middlewares::{friend_request_throttle, get_extensions},
    modules::{
        friend::{
            model::{FriendResponse, FriendshipResponse, PendingRequestResponse},
            service::FriendService,
        },
        user::model::AuthUser,
    },
};

#[post("/send_request/{user_id}/", wrap = "from_fn(friend_request_throttle)")]
pub async fn send_friend_request(
    friend_service: web::Data<FriendService>,
    user_id: web::Path<i64>,
    req: HttpRequest,
) -> Result<success::Success<FriendshipResponse>, error::Error> {
    let sender_id = get_extensions::<AuthUser>(&req)?.id;
    let friendship = friend_service.send_friend_request(sender_id, *user_id).await?;

    Ok(success::Success::created(Some(friendship)).message("Friend request sent."))
}

#[post("/accept_request/{user_id}/")]
pub async fn accept_friend_request(
    friend_service: web::Data<FriendService>,
    user_id: web::Path<i64>,
    req: HttpRequest,
) -> Result<success::Success<FriendshipResponse>, error::Error> {
    let receiver_id = get_extensions::<AuthUser>(&req)?.id;
    let friendship = friend_service.accept_friend_request(receiver_id, *user_id).await?;

    Ok(success::Success::ok(Some(friendship)).message("Friend request accepted."))
}

#[post("/reject_request/{user_id}/")]
pub async fn reject_friend_request(
    friend_service: web::Data<FriendService>,
    user_id: web::Path<i64>,
    req: HttpRequest,
) -> Result<success::Success<FriendshipResponse>, error::Error> {
    let receiver_id = get_extensions::<AuthUser>(&req)?.id;
    let friendship = friend_service.reject_friend_request(receiver_id, *user_id).await?;

    Ok(success::Success::ok(Some(friendship)).message("Friend request rejected."))
}

#[get("/friends/")]
pub async fn list_friends(
    friend_service: web::Data<FriendService>,
    req: HttpRequest,
) -> Result<success::Success<Vec<FriendResponse>>, error::Error> {
    let user_id = get_extensions::<AuthUser>(&req)?.id;
    let friends = friend_service.get_friends(user_id).await?;

    Ok(success::Success::ok(Some(friends)).message("Friends retrieved successfully"))
}

#[get("/pending/")]
pub async fn list_pending_requests(
    friend_service: web::Data<FriendService>,
    req: HttpRequest,
) -> Result<success::Success<Vec<PendingRequestResponse>>, error::Error> {
    let user_id = get_extensions::<AuthUser>(&req)?.id;
    let requests = friend_service.get_pending_requests(user_id).await?;

    Ok(success::Success::ok(Some(requests)).message("Pending requests retrieved successfully"))
}
