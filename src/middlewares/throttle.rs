//! Fixed-window request throttling.
//!
//! A [`Rate`] such as `3/min` allows that many hits per key inside a window
//! that opens on the first hit. Counters live in Redis when it is configured
//! and in process memory otherwise.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use actix_web::{
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
    web, Error,
};

use crate::{
    api::error,
    configs::RedisCache,
    constants::FRIEND_REQUEST_THROTTLE_SCOPE,
    middlewares::get_extensions,
    modules::user::model::AuthUser,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rate {
    pub num_requests: u32,
    pub window: Duration,
}

impl Rate {
    /// Parses `<count>/<period>`; only the first letter of the period counts,
    /// so `3/m`, `3/min` and `3/minute` are equivalent.
    pub fn parse(rate: &str) -> Result<Self, error::SystemError> {
        let invalid = || error::SystemError::bad_request(format!("Invalid throttle rate '{rate}'"));

        let (num, period) = rate.split_once('/').ok_or_else(invalid)?;
        let num_requests = num.trim().parse::<u32>().map_err(|_| invalid())?;
        let secs = match period.trim().chars().next() {
            Some('s') => 1,
            Some('m') => 60,
            Some('h') => 60 * 60,
            Some('d') => 24 * 60 * 60,
            _ => return Err(invalid()),
        };

        Ok(Rate { num_requests, window: Duration::from_secs(secs) })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleDecision {
    Allowed,
    Throttled { retry_after: u64 },
}

#[async_trait::async_trait]
pub trait RateLimiter: Send + Sync {
    /// Records a hit for `key` and decides whether it may proceed.
    async fn check(&self, key: &str) -> Result<ThrottleDecision, error::SystemError>;
}

pub struct RedisRateLimiter {
    cache: RedisCache,
    rate: Rate,
}

impl RedisRateLimiter {
    pub fn new(cache: RedisCache, rate: Rate) -> Self {
        Self { cache, rate }
    }
}

#[async_trait::async_trait]
impl RateLimiter for RedisRateLimiter {
    async fn check(&self, key: &str) -> Result<ThrottleDecision, error::SystemError> {
        let (count, ttl) = self.cache.hit_window(key, self.rate.window.as_secs()).await?;

        if count > u64::from(self.rate.num_requests) {
            return Ok(ThrottleDecision::Throttled { retry_after: ttl.max(1) });
        }
        Ok(ThrottleDecision::Allowed)
    }
}

struct Window {
    count: u32,
    started: Instant,
}

/// In-process limiter for single-instance deployments without Redis.
pub struct MemoryRateLimiter {
    windows: Mutex<HashMap<String, Window>>,
    rate: Rate,
}

impl MemoryRateLimiter {
    pub fn new(rate: Rate) -> Self {
        Self { windows: Mutex::new(HashMap::new()), rate }
    }

    fn hit(&self, key: &str, now: Instant) -> ThrottleDecision {
        let mut windows = self.windows.lock().unwrap_or_else(|p| p.into_inner());
        windows.retain(|_, window| now.duration_since(window.started) < self.rate.window);

        let window = windows
            .entry(key.to_string())
            .or_insert_with(|| Window { count: 0, started: now });

        if window.count >= self.rate.num_requests {
            let elapsed = now.duration_since(window.started);
            let retry_after = self.rate.window.saturating_sub(elapsed).as_secs().max(1);
            return ThrottleDecision::Throttled { retry_after };
        }

        window.count += 1;
        ThrottleDecision::Allowed
    }
}

#[async_trait::async_trait]
impl RateLimiter for MemoryRateLimiter {
    async fn check(&self, key: &str) -> Result<ThrottleDecision, error::SystemError> {
        Ok(self.hit(key, Instant::now()))
    }
}

/// Keyed on the authenticated user, so it must run inside `authentication`.
pub async fn friend_request_throttle<B>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<B>, Error>
where
    B: MessageBody + 'static,
{
    let limiter = req.app_data::<web::Data<dyn RateLimiter>>().cloned().ok_or_else(|| {
        log::error!("Rate limiter is not registered");
        error::Error::internal_server_error()
    })?;
    let user = get_extensions::<AuthUser>(req.request())?;

    let key = format!("throttle_{}_{}", FRIEND_REQUEST_THROTTLE_SCOPE, user.id);
    match limiter.check(&key).await.map_err(error::Error::from)? {
        ThrottleDecision::Allowed => next.call(req).await,
        ThrottleDecision::Throttled { retry_after } => {
            log::warn!("Friend requests throttled for user {} ({})", user.id, user.username);
            Err(error::Error::too_many_requests(retry_after).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rate_strings() {
        assert_eq!(
            Rate::parse("3/min").unwrap(),
            Rate { num_requests: 3, window: Duration::from_secs(60) }
        );
        assert_eq!(Rate::parse("10/s").unwrap().window, Duration::from_secs(1));
        assert_eq!(Rate::parse("100/day").unwrap().window, Duration::from_secs(86_400));
        assert!(Rate::parse("3").is_err());
        assert!(Rate::parse("x/min").is_err());
        assert!(Rate::parse("3/week").is_err());
    }

    #[test]
    fn fourth_hit_in_window_is_throttled() {
        let limiter = MemoryRateLimiter::new(Rate::parse("3/min").unwrap());
        let start = Instant::now();
        for _ in 0..3 {
            assert_eq!(limiter.hit("user:1", start), ThrottleDecision::Allowed);
        }
        match limiter.hit("user:1", start + Duration::from_secs(10)) {
            ThrottleDecision::Throttled { retry_after } => assert_eq!(retry_after, 50),
            other => panic!("expected throttle, got {other:?}"),
        }
    }

    #[test]
    fn keys_have_independent_windows() {
        let limiter = MemoryRateLimiter::new(Rate::parse("1/min").unwrap());
        let now = Instant::now();
        assert_eq!(limiter.hit("user:1", now), ThrottleDecision::Allowed);
        assert_eq!(limiter.hit("user:2", now), ThrottleDecision::Allowed);
        assert!(matches!(limiter.hit("user:1", now), ThrottleDecision::Throttled { .. }));
    }

    #[test]
    fn window_resets_after_period() {
        let limiter = MemoryRateLimiter::new(Rate::parse("1/min").unwrap());
        let now = Instant::now();
        assert_eq!(limiter.hit("user:1", now), ThrottleDecision::Allowed);
        assert!(matches!(limiter.hit("user:1", now), ThrottleDecision::Throttled { .. }));
        assert_eq!(
            limiter.hit("user:1", now + Duration::from_secs(61)),
            ThrottleDecision::Allowed
        );
    }

    #[test]
    fn expired_windows_are_dropped() {
        let limiter = MemoryRateLimiter::new(Rate::parse("1/min").unwrap());
        let now = Instant::now();
        for user in 0..5 {
            limiter.hit(&format!("user:{user}"), now);
        }
        assert_eq!(limiter.windows.lock().unwrap().len(), 5);

        let later = now + Duration::from_secs(61);
        assert_eq!(limiter.hit("user:9", later), ThrottleDecision::Allowed);
        assert_eq!(limiter.windows.lock().unwrap().len(), 1);
    }

    #[test]
    fn zero_rate_throttles_everything() {
        let limiter = MemoryRateLimiter::new(Rate::parse("0/min").unwrap());
        let decision = limiter.hit("user:1", Instant::now());
        assert!(matches!(decision, ThrottleDecision::Throttled { .. }));
    }
}
