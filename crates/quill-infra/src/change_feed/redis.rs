//! Redis change feed - fans post changes out across server instances.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use quill_core::domain::PostChange;
use quill_core::ports::{ChangeFeed, ChangeHandler, FeedError, SubscriptionId};

/// Redis connection configuration.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis URL (e.g., redis://localhost:6379)
    pub url: String,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Channel post changes are published on
    pub channel: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            connect_timeout: Duration::from_secs(5),
            channel: "quill:post-changes".to_string(),
        }
    }
}

impl RedisConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: std::env::var("REDIS_URL").unwrap_or(defaults.url),
            connect_timeout: std::env::var("REDIS_CONNECT_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.connect_timeout),
            channel: std::env::var("REDIS_CHANGE_CHANNEL").unwrap_or(defaults.channel),
        }
    }
}

/// Redis-backed change feed.
pub struct RedisChangeFeed {
    conn: ConnectionManager,
    client: Client,
    subscriptions: Arc<RwLock<HashMap<SubscriptionId, JoinHandle<()>>>>,
    channel: String,
}

impl RedisChangeFeed {
    pub async fn new(config: RedisConfig) -> Result<Self, FeedError> {
        let client =
            Client::open(config.url.as_str()).map_err(|e| FeedError::Connection(e.to_string()))?;

        // Bound the connect so an unreachable Redis does not hang startup.
        let conn = tokio::time::timeout(config.connect_timeout, ConnectionManager::new(client.clone()))
            .await
            .map_err(|_| FeedError::Connection("Connection timed out".to_string()))?
            .map_err(|e| FeedError::Connection(e.to_string()))?;

        tracing::info!(url = %config.url, channel = %config.channel, "Connected to Redis change feed");

        Ok(Self {
            conn,
            client,
            subscriptions: Arc::new(RwLock::new(HashMap::new())),
            channel: config.channel,
        })
    }
}

#[async_trait]
impl ChangeFeed for RedisChangeFeed {
    async fn publish(&self, change: PostChange) -> Result<(), FeedError> {
        let payload =
            serde_json::to_string(&change).map_err(|e| FeedError::Publish(e.to_string()))?;

        let mut conn = self.conn.clone();
        conn.publish::<_, _, ()>(&self.channel, payload)
            .await
            .map_err(|e| FeedError::Publish(e.to_string()))?;
        Ok(())
    }

    async fn subscribe(&self, handler: ChangeHandler) -> Result<SubscriptionId, FeedError> {
        let id = SubscriptionId::new();

        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(|e| FeedError::Subscribe(e.to_string()))?;
        pubsub
            .subscribe(&self.channel)
            .await
            .map_err(|e| FeedError::Subscribe(e.to_string()))?;

        let channel = self.channel.clone();
        let handle = tokio::spawn(async move {
            tracing::debug!(subscription = %id.0, channel = %channel, "Subscribed to Redis channel");

            let mut stream = pubsub.on_message();
            while let Some(msg) = stream.next().await {
                let payload: String = match msg.get_payload() {
                    Ok(p) => p,
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to get message payload");
                        continue;
                    }
                };

                match serde_json::from_str::<PostChange>(&payload) {
                    Ok(change) => handler(change).await,
                    Err(e) => tracing::warn!(error = %e, "Discarding malformed post change"),
                }
            }

            tracing::info!(channel = %channel, "PubSub connection closed");
        });

        self.subscriptions.write().await.insert(id, handle);
        Ok(id)
    }

    async fn unsubscribe(&self, id: SubscriptionId) -> Result<(), FeedError> {
        if let Some(handle) = self.subscriptions.write().await.remove(&id) {
            handle.abort();
            tracing::debug!(subscription = %id.0, "Unsubscribed from Redis channel");
        }
        Ok(())
    }
}
