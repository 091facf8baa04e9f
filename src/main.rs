use actix_cors::Cors;
use actix_web::{
    self,
    middleware::{from_fn, Logger},
    web, App, HttpServer,
};
use std::sync::{Arc, LazyLock};

use crate::{
    configs::{connect_database, RedisCache},
    middlewares::{
        authentication,
        throttle::{MemoryRateLimiter, Rate, RateLimiter, RedisRateLimiter},
    },
    modules::{
        friend::{repository_pg::FriendRepositoryPg, service::FriendService},
        user::{repository_pg::UserRepositoryPg, service::UserService},
    },
};

mod api;
mod configs;
mod constants;
mod middlewares;
mod modules;
#[cfg(test)]
mod test;
mod utils;

pub static ENV: LazyLock<constants::Env> = LazyLock::new(|| {
    dotenvy::dotenv().ok();
    env_logger::init();
    log::info!("Environment variables loaded from .env file");
    constants::Env::default()
});

#[actix_web::get("/")]
async fn health_check() -> &'static str {
    "Server is running"
}

fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, req| {
        log::debug!("Unmatched path parameter on {}: {}", req.path(), err);
        api::error::Error::not_found("Not found.").into()
    })
}

fn api_configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(path_config()).service(health_check).service(
        web::scope("/connection").configure(modules::user::route::public_api_configure).service(
            web::scope("")
                .wrap(from_fn(authentication))
                .configure(modules::user::route::configure)
                .configure(modules::friend::route::configure),
        ),
    );
}

async fn build_rate_limiter() -> std::io::Result<Arc<dyn RateLimiter>> {
    let rate = Rate::parse(&ENV.friend_request_rate)
        .map_err(|_| std::io::Error::other("FRIEND_REQUEST_RATE is not a valid rate"))?;

    match ENV.redis_url.as_deref() {
        Some(url) => {
            let cache = RedisCache::new(url)
                .await
                .map_err(|_| std::io::Error::other("Redis connection error"))?;
            log::info!("Friend request throttle backed by Redis ({rate:?})");
            Ok(Arc::new(RedisRateLimiter::new(cache, rate)))
        }
        None => {
            log::warn!("REDIS_URL not set, friend request throttle is per process ({rate:?})");
            Ok(Arc::new(MemoryRateLimiter::new(rate)))
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let db_pool =
        connect_database().await.map_err(|_| std::io::Error::other("Database connection error"))?;

    let rate_limiter = build_rate_limiter().await?;

    let user_repo = Arc::new(UserRepositoryPg::new(db_pool.clone()));
    let friend_repo = Arc::new(FriendRepositoryPg::new(db_pool.clone()));

    let user_service = UserService::with_dependencies(user_repo.clone());
    let friend_service = FriendService::with_dependencies(friend_repo, user_repo);

    log::info!("Starting server at http://{}:{}", ENV.ip.as_str(), ENV.port);
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(ENV.frontend_url.as_str())
            .allow_any_method()
            .allow_any_header()
            .supports_credentials();

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(web::Data::new(user_service.clone()))
            .app_data(web::Data::new(friend_service.clone()))
            .app_data(web::Data::from(rate_limiter.clone()))
            .configure(api_configure)
    })
    .bind((ENV.ip.as_str(), ENV.port))?
    .workers(2)
    .run()
    .await
}
