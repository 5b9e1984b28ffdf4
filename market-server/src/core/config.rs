use crate::db::RetryPolicy;

/// Server configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | DATABASE_PATH | marketplace.db | SQLite file |
/// | HTTP_PORT | 8080 | HTTP API port |
/// | ENVIRONMENT | development | development / staging / production |
/// | LOG_LEVEL | info | default log filter level |
/// | LOG_DIR | (unset) | enables daily rolling file logs |
/// | DB_MAX_CONNECTIONS | 5 | pool size |
/// | RETRY_MAX_ATTEMPTS | 4 | attempts for transient store errors |
/// | RETRY_BASE_DELAY_MS | 20 | first backoff delay |
/// | RETRY_MAX_DELAY_MS | 500 | backoff cap |
/// | EVENT_CHANNEL_CAPACITY | 1024 | notification broadcast buffer |
///
/// # Example
///
/// ```ignore
/// DATABASE_PATH=/data/market.db HTTP_PORT=9000 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub http_port: u16,
    /// development | staging | production
    pub environment: String,
    pub log_level: String,
    pub log_dir: Option<String>,
    pub db_max_connections: u32,
    pub retry: RetryPolicy,
    pub event_channel_capacity: usize,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = RetryPolicy::default();
        Self {
            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "marketplace.db".into()),
            http_port: env_or("HTTP_PORT", 8080),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.is_empty()),
            db_max_connections: env_or("DB_MAX_CONNECTIONS", 5),
            retry: RetryPolicy {
                max_attempts: env_or("RETRY_MAX_ATTEMPTS", defaults.max_attempts),
                base_delay_ms: env_or("RETRY_BASE_DELAY_MS", defaults.base_delay_ms),
                max_delay_ms: env_or("RETRY_MAX_DELAY_MS", defaults.max_delay_ms),
            },
            event_channel_capacity: env_or("EVENT_CHANNEL_CAPACITY", 1024),
        }
    }

    /// Config pointing at a specific database file, everything else default.
    ///
    /// Used by tests so they never depend on the process environment.
    pub fn for_database(database_path: impl Into<String>) -> Self {
        Self {
            database_path: database_path.into(),
            http_port: 0,
            environment: "development".into(),
            log_level: "info".into(),
            log_dir: None,
            db_max_connections: 5,
            retry: RetryPolicy::default(),
            event_channel_capacity: 1024,
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_database_defaults() {
        let config = Config::for_database("/tmp/x.db");
        assert_eq!(config.database_path, "/tmp/x.db");
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.retry.max_attempts, 4);
        assert_eq!(config.event_channel_capacity, 1024);
        assert_eq!(config.environment, "development");
        assert!(!config.is_production());
    }
}
