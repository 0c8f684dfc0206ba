use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Post, PostChanges};
use crate::error::RepoError;

/// Generic repository trait defining standard record operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Insert a new entity.
    async fn insert(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID. Fails with [`RepoError::NotFound`] if absent.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// Post store.
///
/// Every method is expected to be atomic per record.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// Apply a partial record. Fails with [`RepoError::NotFound`] if absent.
    async fn update(&self, id: Uuid, changes: PostChanges) -> Result<Post, RepoError>;

    /// Conditionally flip `verified` to true and stamp `verified_at`.
    ///
    /// Only matches a post with `verification_requested = true` and
    /// `verified = false`. Returns whether this call performed the transition.
    async fn mark_verified(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, RepoError>;

    /// Filtered, ordered, optionally paginated listing.
    async fn query(&self, query: &PostQuery) -> Result<Vec<Post>, RepoError>;
}

/// Equality filters over post fields. `None` matches anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFilter {
    pub author_id: Option<Uuid>,
    pub published: Option<bool>,
    pub verified: Option<bool>,
    pub verification_requested: Option<bool>,
}

impl PostFilter {
    pub fn matches(&self, post: &Post) -> bool {
        self.author_id.is_none_or(|a| post.author_id == a)
            && self.published.is_none_or(|p| post.published == p)
            && self.verified.is_none_or(|v| post.verified == v)
            && self
                .verification_requested
                .is_none_or(|r| post.verification_requested == r)
    }
}

/// Ordering by `created_at`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostQuery {
    pub filter: PostFilter,
    pub order: SortOrder,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl PostQuery {
    pub fn new(filter: PostFilter) -> Self {
        Self {
            filter,
            ..Default::default()
        }
    }

    pub fn page(mut self, limit: u64, offset: u64) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }

    /// Evaluate the query over an in-process collection.
    ///
    /// Ties on `created_at` fall back to `id` so page boundaries are stable.
    pub fn apply<'a, I>(&self, posts: I) -> Vec<Post>
    where
        I: IntoIterator<Item = &'a Post>,
    {
        let mut matched: Vec<&Post> = posts
            .into_iter()
            .filter(|p| self.filter.matches(p))
            .collect();

        matched.sort_by_key(|p| (p.created_at, p.id));
        if self.order == SortOrder::Descending {
            matched.reverse();
        }

        let offset = self.offset.unwrap_or(0) as usize;
        let limit = self.limit.map_or(usize::MAX, |l| l as usize);
        matched.into_iter().skip(offset).take(limit).cloned().collect()
    }
}
