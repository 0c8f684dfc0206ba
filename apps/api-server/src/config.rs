//! Application configuration loaded from environment variables.

use std::env;

use quill_core::{LifecycleConfig, ListingConfig};
use quill_infra::{JwtConfig, MediaConfig};

#[cfg(feature = "postgres")]
use quill_infra::DatabaseConfig;
#[cfg(feature = "redis")]
use quill_infra::RedisConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    #[cfg(feature = "postgres")]
    pub database: Option<DatabaseConfig>,
    #[cfg(feature = "redis")]
    pub redis: Option<RedisConfig>,
    pub lifecycle: LifecycleConfig,
    pub listing: ListingConfig,
    pub media: MediaConfig,
    pub jwt: JwtConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            #[cfg(feature = "postgres")]
            database: None,
            #[cfg(feature = "redis")]
            redis: None,
            lifecycle: LifecycleConfig::default(),
            listing: ListingConfig::default(),
            media: MediaConfig::default(),
            jwt: JwtConfig::default(),
        }
    }
}

fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.parse().ok())
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let lifecycle_defaults = LifecycleConfig::default();
        let listing_defaults = ListingConfig::default();

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parsed("PORT").unwrap_or(8080),
            #[cfg(feature = "postgres")]
            database: env::var("DATABASE_URL").ok().map(|url| DatabaseConfig {
                url,
                max_connections: parsed("DB_MAX_CONNECTIONS").unwrap_or(100),
                min_connections: parsed("DB_MIN_CONNECTIONS").unwrap_or(10),
            }),
            #[cfg(feature = "redis")]
            redis: env::var("REDIS_URL").ok().map(|_| RedisConfig::from_env()),
            lifecycle: LifecycleConfig {
                excerpt_length: parsed("EXCERPT_LENGTH")
                    .unwrap_or(lifecycle_defaults.excerpt_length),
            },
            listing: ListingConfig {
                default_limit: parsed("FEED_DEFAULT_LIMIT")
                    .unwrap_or(listing_defaults.default_limit),
                max_limit: parsed("FEED_MAX_LIMIT").unwrap_or(listing_defaults.max_limit),
            },
            media: MediaConfig::from_env(),
            jwt: JwtConfig::from_env(),
        }
    }
}
