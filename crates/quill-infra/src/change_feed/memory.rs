//! In-memory change feed.
//!
//! This is the fallback when Redis is not available.
//! Works within a single process only.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{RwLock, broadcast};
use tokio::task::JoinHandle;

use quill_core::domain::PostChange;
use quill_core::ports::{ChangeFeed, ChangeHandler, FeedError, SubscriptionId};

/// Broadcast-channel change feed; each subscription runs on its own task.
pub struct InMemoryChangeFeed {
    sender: broadcast::Sender<PostChange>,
    subscriptions: Arc<RwLock<HashMap<SubscriptionId, JoinHandle<()>>>>,
}

impl InMemoryChangeFeed {
    pub fn new(buffer_size: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer_size);
        Self {
            sender,
            subscriptions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscriptions.read().await.len()
    }
}

impl Default for InMemoryChangeFeed {
    fn default() -> Self {
        Self::new(100)
    }
}

impl Drop for InMemoryChangeFeed {
    fn drop(&mut self) {
        if let Ok(subscriptions) = self.subscriptions.try_read() {
            for handle in subscriptions.values() {
                handle.abort();
            }
        }
    }
}

#[async_trait]
impl ChangeFeed for InMemoryChangeFeed {
    async fn publish(&self, change: PostChange) -> Result<(), FeedError> {
        // No receivers is not an error.
        match self.sender.send(change) {
            Ok(receivers) => tracing::debug!(receivers, "Post change published"),
            Err(_) => tracing::debug!("No subscribers for post changes"),
        }
        Ok(())
    }

    async fn subscribe(&self, handler: ChangeHandler) -> Result<SubscriptionId, FeedError> {
        let id = SubscriptionId::new();
        let mut receiver = self.sender.subscribe();

        let handle = tokio::spawn(async move {
            tracing::info!(subscription = %id.0, "Subscribed to post changes");

            loop {
                match receiver.recv().await {
                    Ok(change) => handler(change).await,
                    Err(broadcast::error::RecvError::Lagged(count)) => {
                        tracing::warn!(
                            subscription = %id.0,
                            lagged = count,
                            "Subscriber lagged behind"
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!(subscription = %id.0, "Change feed closed");
                        break;
                    }
                }
            }
        });

        self.subscriptions.write().await.insert(id, handle);
        Ok(id)
    }

    async fn unsubscribe(&self, id: SubscriptionId) -> Result<(), FeedError> {
        if let Some(handle) = self.subscriptions.write().await.remove(&id) {
            handle.abort();
            tracing::info!(subscription = %id.0, "Unsubscribed from post changes");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use quill_core::domain::{ChangeKind, NewPost, Post};
    use tokio::sync::mpsc;
    use uuid::Uuid;

    fn change(kind: ChangeKind) -> PostChange {
        let post = Post::new(Uuid::new_v4(), NewPost::new("t", "c"), 200);
        PostChange::new(kind, &post)
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let feed = InMemoryChangeFeed::default();
        assert!(feed.publish(change(ChangeKind::Created)).await.is_ok());
    }

    #[tokio::test]
    async fn test_subscriber_receives_changes() {
        let feed = InMemoryChangeFeed::default();
        let (tx, mut rx) = mpsc::channel(4);

        feed.subscribe(Box::new(move |c| {
            let tx = tx.clone();
            Box::pin(async move {
                tx.send(c.kind).await.ok();
            })
        }))
        .await
        .unwrap();

        feed.publish(change(ChangeKind::Created)).await.unwrap();
        feed.publish(change(ChangeKind::Deleted)).await.unwrap();

        let first = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap();
        let second = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap();
        assert_eq!(first, Some(ChangeKind::Created));
        assert_eq!(second, Some(ChangeKind::Deleted));
    }

    #[tokio::test]
    async fn test_unsubscribe_removes_subscription() {
        let feed = InMemoryChangeFeed::default();
        let id = feed
            .subscribe(Box::new(|_| Box::pin(async {})))
            .await
            .unwrap();
        assert_eq!(feed.subscriber_count().await, 1);

        feed.unsubscribe(id).await.unwrap();
        feed.unsubscribe(id).await.unwrap();
        assert_eq!(feed.subscriber_count().await, 0);
    }
}
