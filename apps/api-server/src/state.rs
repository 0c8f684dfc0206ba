//! Application state - shared across all handlers.

use std::sync::Arc;

use quill_core::ports::{ChangeFeed, MediaStore, PostRepository, TokenService};
use quill_core::{PostLifecycleService, PostListing};
use quill_infra::{InMemoryChangeFeed, InMemoryPostRepository, JwtTokenService, LocalMediaStore};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub lifecycle: Arc<PostLifecycleService>,
    pub listing: Arc<PostListing>,
    pub media: Arc<dyn MediaStore>,
    pub tokens: Arc<dyn TokenService>,
}

impl AppState {
    /// Build the application state, falling back to in-memory backends for
    /// anything that is not configured or not reachable.
    pub async fn new(config: &AppConfig) -> Self {
        let posts = Self::post_repository(config).await;
        let changes = Self::change_feed(config).await;

        let state = Self::from_parts(
            posts,
            changes,
            Arc::new(LocalMediaStore::new(config.media.clone())),
            Arc::new(JwtTokenService::new(config.jwt.clone())),
            config,
        );

        tracing::info!("Application state initialized");
        state
    }

    /// Wire the services over explicit backends.
    pub fn from_parts(
        posts: Arc<dyn PostRepository>,
        changes: Arc<dyn ChangeFeed>,
        media: Arc<dyn MediaStore>,
        tokens: Arc<dyn TokenService>,
        config: &AppConfig,
    ) -> Self {
        Self {
            lifecycle: Arc::new(PostLifecycleService::new(
                posts.clone(),
                changes.clone(),
                config.lifecycle.clone(),
            )),
            listing: Arc::new(PostListing::new(posts, changes, config.listing.clone())),
            media,
            tokens,
        }
    }

    #[cfg(feature = "postgres")]
    async fn post_repository(config: &AppConfig) -> Arc<dyn PostRepository> {
        use quill_infra::{DatabaseConnections, PostgresPostRepository};

        let Some(db_config) = &config.database else {
            tracing::warn!("DATABASE_URL not set. Running with the in-memory post store.");
            return Arc::new(InMemoryPostRepository::new());
        };

        match DatabaseConnections::init(db_config).await {
            Ok(connections) => Arc::new(PostgresPostRepository::new(connections.main)),
            Err(e) => {
                tracing::error!(
                    "Failed to connect to database: {}. Using in-memory fallback.",
                    e
                );
                Arc::new(InMemoryPostRepository::new())
            }
        }
    }

    #[cfg(not(feature = "postgres"))]
    async fn post_repository(_config: &AppConfig) -> Arc<dyn PostRepository> {
        tracing::info!("Running without postgres feature - using in-memory post store");
        Arc::new(InMemoryPostRepository::new())
    }

    #[cfg(feature = "redis")]
    async fn change_feed(config: &AppConfig) -> Arc<dyn ChangeFeed> {
        use quill_infra::RedisChangeFeed;

        let Some(redis_config) = &config.redis else {
            return Arc::new(InMemoryChangeFeed::default());
        };

        match RedisChangeFeed::new(redis_config.clone()).await {
            Ok(feed) => Arc::new(feed),
            Err(e) => {
                tracing::error!(
                    "Failed to connect to Redis: {}. Using in-process change feed.",
                    e
                );
                Arc::new(InMemoryChangeFeed::default())
            }
        }
    }

    #[cfg(not(feature = "redis"))]
    async fn change_feed(_config: &AppConfig) -> Arc<dyn ChangeFeed> {
        Arc::new(InMemoryChangeFeed::default())
    }
}
