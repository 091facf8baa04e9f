use deadpool_redis::{redis::AsyncCommands, Runtime};
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{api::error, ENV};

pub async fn connect_database() -> Result<PgPool, error::SystemError> {
    let database_url = &ENV.database_url;
    let pool = PgPoolOptions::new()
        .max_connections(ENV.database_max_connections)
        .min_connections(1)
        .acquire_slow_threshold(std::time::Duration::from_secs(3))
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    log::info!("Database connected and migrations applied");

    Ok(pool)
}

#[derive(Clone)]
pub struct RedisCache {
    pool: deadpool_redis::Pool,
}

impl RedisCache {
    pub async fn new(redis_url: &str) -> Result<Self, error::SystemError> {
        let mut cfg = deadpool_redis::Config::from_url(redis_url);
        cfg.pool = Some(deadpool_redis::PoolConfig { max_size: 16, ..Default::default() });
        let pool = cfg.create_pool(Some(Runtime::Tokio1))?;
        Ok(Self { pool })
    }

    /// Counts a hit in the fixed window stored at `key`, opening a window of
    /// `window_secs` on the first hit. Returns the hit count so far and the
    /// seconds left in the window.
    pub async fn hit_window(
        &self,
        key: &str,
        window_secs: u64,
    ) -> Result<(u64, u64), error::SystemError> {
        let mut conn = self.pool.get().await?;

        let count: u64 = conn.incr(key, 1u64).await?;
        if count == 1 {
            conn.expire::<_, ()>(key, window_secs as i64).await?;
        }

        let ttl: i64 = conn.ttl(key).await?;
        // -1 means the expiry was lost; re-arm it so the key cannot stick.
        if ttl < 0 {
            conn.expire::<_, ()>(key, window_secs as i64).await?;
            return Ok((count, window_secs));
        }

        Ok((count, ttl as u64))
    }
}
