//! In-process test doubles for the service tests.
//!
//! `MemoryPosts` shares its query and verify rules with the infra in-memory
//! store through `PostQuery::apply` and `Post::mark_verified`; it only adds
//! failure injection.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{ChangeKind, Post, PostChange, PostChanges};
use crate::error::RepoError;
use crate::ports::{
    BaseRepository, ChangeFeed, ChangeHandler, FeedError, PostQuery, PostRepository,
    SubscriptionId,
};

#[derive(Default)]
pub(crate) struct MemoryPosts {
    rows: RwLock<HashMap<Uuid, Post>>,
    fail_next: RwLock<bool>,
}

impl MemoryPosts {
    pub(crate) async fn fail_next(&self) {
        *self.fail_next.write().await = true;
    }

    pub(crate) async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    async fn check(&self) -> Result<(), RepoError> {
        let mut fail = self.fail_next.write().await;
        if *fail {
            *fail = false;
            return Err(RepoError::Connection("store offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for MemoryPosts {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        self.check().await?;
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn insert(&self, entity: Post) -> Result<Post, RepoError> {
        self.check().await?;
        self.rows.write().await.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.check().await?;
        self.rows
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl PostRepository for MemoryPosts {
    async fn update(&self, id: Uuid, changes: PostChanges) -> Result<Post, RepoError> {
        self.check().await?;
        let mut rows = self.rows.write().await;
        let post = rows.get_mut(&id).ok_or(RepoError::NotFound)?;
        post.apply(&changes);
        Ok(post.clone())
    }

    async fn mark_verified(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, RepoError> {
        self.check().await?;
        let mut rows = self.rows.write().await;
        Ok(rows.get_mut(&id).is_some_and(|post| post.mark_verified(at)))
    }

    async fn query(&self, query: &PostQuery) -> Result<Vec<Post>, RepoError> {
        self.check().await?;
        Ok(query.apply(self.rows.read().await.values()))
    }
}

#[derive(Default)]
pub(crate) struct RecordingFeed {
    published: Mutex<Vec<PostChange>>,
    subscribers: Mutex<Vec<SubscriptionId>>,
    failing: bool,
}

impl RecordingFeed {
    pub(crate) fn failing() -> Self {
        Self {
            failing: true,
            ..Default::default()
        }
    }

    pub(crate) fn kinds(&self) -> Vec<ChangeKind> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.kind)
            .collect()
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.subscribers.lock().unwrap().len()
    }
}

#[async_trait]
impl ChangeFeed for RecordingFeed {
    async fn publish(&self, change: PostChange) -> Result<(), FeedError> {
        if self.failing {
            return Err(FeedError::Publish("feed offline".to_string()));
        }
        self.published.lock().unwrap().push(change);
        Ok(())
    }

    async fn subscribe(&self, _handler: ChangeHandler) -> Result<SubscriptionId, FeedError> {
        let id = SubscriptionId::new();
        self.subscribers.lock().unwrap().push(id);
        Ok(id)
    }

    async fn unsubscribe(&self, id: SubscriptionId) -> Result<(), FeedError> {
        self.subscribers.lock().unwrap().retain(|s| *s != id);
        Ok(())
    }
}
