//! Change feed port - push notifications for committed post mutations.

use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use uuid::Uuid;

use crate::domain::PostChange;

/// Handler invoked for every change delivered to a subscription.
pub type ChangeHandler =
    Box<dyn Fn(PostChange) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Handle returned by [`ChangeFeed::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub Uuid);

impl SubscriptionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Change feed trait - abstraction over the notification transport.
#[async_trait]
pub trait ChangeFeed: Send + Sync {
    /// Publish a change to all current subscribers.
    async fn publish(&self, change: PostChange) -> Result<(), FeedError>;

    /// Register a handler for subsequent changes.
    async fn subscribe(&self, handler: ChangeHandler) -> Result<SubscriptionId, FeedError>;

    /// Drop a subscription. Unknown ids are ignored.
    async fn unsubscribe(&self, id: SubscriptionId) -> Result<(), FeedError>;
}

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("Failed to publish: {0}")]
    Publish(String),

    #[error("Failed to subscribe: {0}")]
    Subscribe(String),

    #[error("Connection error: {0}")]
    Connection(String),
}
