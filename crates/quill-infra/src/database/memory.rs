//! In-memory post store - used when no database is configured.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use quill_core::domain::{Post, PostChanges};
use quill_core::error::RepoError;
use quill_core::ports::{BaseRepository, PostQuery, PostRepository};

/// Post store backed by a HashMap behind an async RwLock.
///
/// Each operation holds the lock for its whole read-modify-write, so every
/// call is atomic per record. Note: Data is lost on process restart.
pub struct InMemoryPostRepository {
    store: RwLock<HashMap<Uuid, Post>>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryPostRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.store.read().await.get(&id).cloned())
    }

    async fn insert(&self, entity: Post) -> Result<Post, RepoError> {
        let mut store = self.store.write().await;
        if store.contains_key(&entity.id) {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }
        store.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut store = self.store.write().await;
        store.remove(&id).map(|_| ()).ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn update(&self, id: Uuid, changes: PostChanges) -> Result<Post, RepoError> {
        let mut store = self.store.write().await;
        let post = store.get_mut(&id).ok_or(RepoError::NotFound)?;
        post.apply(&changes);
        Ok(post.clone())
    }

    async fn mark_verified(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, RepoError> {
        let mut store = self.store.write().await;
        Ok(store.get_mut(&id).is_some_and(|post| post.mark_verified(at)))
    }

    async fn query(&self, query: &PostQuery) -> Result<Vec<Post>, RepoError> {
        Ok(query.apply(self.store.read().await.values()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::domain::NewPost;
    use quill_core::ports::{PostFilter, SortOrder};

    fn post(author: Uuid, title: &str, published: bool) -> Post {
        let mut draft = NewPost::new(title, "content");
        draft.published = published;
        Post::new(author, draft, 200)
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let repo = InMemoryPostRepository::new();
        let p = post(Uuid::new_v4(), "a", false);

        repo.insert(p.clone()).await.unwrap();

        assert_eq!(repo.find_by_id(p.id).await.unwrap(), Some(p.clone()));
        assert!(matches!(
            repo.insert(p).await,
            Err(RepoError::Constraint(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_missing() {
        let repo = InMemoryPostRepository::new();
        assert!(matches!(
            repo.delete(Uuid::new_v4()).await,
            Err(RepoError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_update_missing() {
        let repo = InMemoryPostRepository::new();
        let changes = PostChanges {
            title: Some("x".to_string()),
            content: None,
            excerpt: None,
            published: None,
            background_image_url: None,
            tags: None,
            updated_at: Utc::now(),
        };
        assert!(matches!(
            repo.update(Uuid::new_v4(), changes).await,
            Err(RepoError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_mark_verified_is_conditional() {
        let repo = InMemoryPostRepository::new();
        let mut p = post(Uuid::new_v4(), "a", true);
        p.verification_requested = true;
        repo.insert(p.clone()).await.unwrap();

        let first = Utc::now();
        assert!(repo.mark_verified(p.id, first).await.unwrap());
        assert!(!repo.mark_verified(p.id, Utc::now()).await.unwrap());

        let stored = repo.find_by_id(p.id).await.unwrap().unwrap();
        assert_eq!(stored.verified_at, Some(first));
        assert_eq!(stored.updated_at, p.updated_at);
    }

    #[tokio::test]
    async fn test_mark_verified_skips_unrequested() {
        let repo = InMemoryPostRepository::new();
        let p = post(Uuid::new_v4(), "a", true);
        repo.insert(p.clone()).await.unwrap();

        assert!(!repo.mark_verified(p.id, Utc::now()).await.unwrap());
    }

    #[tokio::test]
    async fn test_query_filters_orders_and_pages() {
        let repo = InMemoryPostRepository::new();
        let author = Uuid::new_v4();
        let mut expected = Vec::new();
        for i in 0..4 {
            let mut p = post(author, &format!("p{i}"), i % 2 == 0);
            p.created_at += chrono::Duration::seconds(i);
            if p.published {
                expected.push(p.id);
            }
            repo.insert(p).await.unwrap();
        }
        repo.insert(post(Uuid::new_v4(), "other", true)).await.unwrap();

        let query = PostQuery::new(PostFilter {
            author_id: Some(author),
            published: Some(true),
            ..Default::default()
        });
        let ids: Vec<Uuid> = repo
            .query(&query)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        expected.reverse();
        assert_eq!(ids, expected);

        let mut ascending = query.clone().page(1, 1);
        ascending.order = SortOrder::Ascending;
        let page = repo.query(&ascending).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].title, "p2");
    }
}
