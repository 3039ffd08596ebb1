use std::{net::SocketAddr, time::Duration};

use wealthdesk_core::constants::DEFAULT_CACHE_TTL_MINUTES;

pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_path: String,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
    pub cache_ttl_minutes: i64,
    pub cache_sweep_interval: Duration,
    pub scheduler_interval: Duration,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let listen_addr = env_or("WD_LISTEN_ADDR", SocketAddr::from(([0, 0, 0, 0], 8080)));
        let db_path = std::env::var("WD_DB_PATH").unwrap_or_else(|_| "./db/app.db".into());
        let cors_allow = std::env::var("WD_CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|_| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        Self {
            listen_addr,
            db_path,
            cors_allow,
            request_timeout: Duration::from_millis(env_or("WD_REQUEST_TIMEOUT_MS", 30_000)),
            cache_ttl_minutes: env_or("WD_CACHE_TTL_MINUTES", DEFAULT_CACHE_TTL_MINUTES),
            cache_sweep_interval: Duration::from_secs(env_or("WD_CACHE_SWEEP_SECS", 300)),
            scheduler_interval: Duration::from_secs(env_or("WD_SCHEDULER_INTERVAL_SECS", 3600)),
        }
    }
}
