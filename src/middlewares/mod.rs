use actix_web::{
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    http::header,
    middleware::Next,
    web, Error, HttpMessage, HttpRequest,
};

use crate::{api::error, modules::user::service::UserService};

pub mod throttle;

pub use throttle::friend_request_throttle;

fn extract_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    if token.is_empty() || token.contains(' ') {
        return None;
    }
    match scheme {
        "Token" | "Bearer" => Some(token),
        _ => None,
    }
}

pub async fn authentication<B>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<B>, Error>
where
    B: MessageBody + 'static,
{
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_token)
        .map(str::to_owned);

    let Some(token) = token else {
        return Err(
            error::Error::unauthorized("Authentication credentials were not provided.").into()
        );
    };

    let user_service = req.app_data::<web::Data<UserService>>().cloned().ok_or_else(|| {
        log::error!("UserService is not registered");
        error::Error::internal_server_error()
    })?;

    let user = user_service.authenticate(&token).await.map_err(error::Error::from)?;

    req.extensions_mut().insert(user);

    next.call(req).await
}

pub fn get_extensions<T>(req: &HttpRequest) -> Result<T, error::Error>
where
    T: Clone + 'static,
{
    let extensions = req.extensions();

    let value = extensions
        .get::<T>()
        .ok_or_else(|| error::Error::unauthorized("Authentication credentials were not provided."))?
        .clone();

    Ok(value)
}
