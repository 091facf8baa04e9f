use crate::modules::user::handle::*;
use actix_web::web::ServiceConfig;

pub fn public_api_configure(cfg: &mut ServiceConfig) {
    cfg.service(sign_up).service(sign_in);
}

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(search_users);
}
