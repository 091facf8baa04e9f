pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

pub const FRIEND_REQUEST_THROTTLE_SCOPE: &str = "friend_request";

pub struct Env {
    pub database_url: String,
    pub database_max_connections: u32,
    pub redis_url: Option<String>,
    pub frontend_url: String,
    pub friend_request_rate: String,
    pub ip: String,
    pub port: u16,
}

impl Env {
    fn new() -> Self {
        let database_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set in .env file or environment variable");
        let database_max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()
            .expect("DATABASE_MAX_CONNECTIONS must be a valid u32 integer");

        // Without Redis the throttle falls back to per-process counters.
        let redis_url = std::env::var("REDIS_URL").ok().filter(|url| !url.is_empty());

        let frontend_url =
            std::env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:5173".to_string());
        let friend_request_rate =
            std::env::var("FRIEND_REQUEST_RATE").unwrap_or_else(|_| "3/min".to_string());

        let ip = std::env::var("IP").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse::<u16>()
            .expect("PORT must be a valid u16 integer");
        Env {
            database_url,
            database_max_connections,
            redis_url,
            frontend_url,
            friend_request_rate,
            ip,
            port,
        }
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}
