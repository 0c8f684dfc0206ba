//! Read-side projections over the post store.

use std::sync::Arc;

use uuid::Uuid;

use super::{require_admin, require_identity};
use crate::domain::Post;
use crate::error::DomainError;
use crate::ports::{
    ChangeFeed, ChangeHandler, IdentityProvider, PostFilter, PostQuery, PostRepository,
    SubscriptionId,
};

/// Pagination bounds for the public feed.
#[derive(Debug, Clone)]
pub struct ListingConfig {
    pub default_limit: u64,
    pub max_limit: u64,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 100,
        }
    }
}

/// Public feed, author dashboards and the verification queue.
///
/// Never writes to the store.
pub struct PostListing {
    posts: Arc<dyn PostRepository>,
    changes: Arc<dyn ChangeFeed>,
    config: ListingConfig,
}

impl PostListing {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        changes: Arc<dyn ChangeFeed>,
        config: ListingConfig,
    ) -> Self {
        Self {
            posts,
            changes,
            config,
        }
    }

    pub fn config(&self) -> &ListingConfig {
        &self.config
    }

    /// Published posts, newest first.
    pub async fn list_public_feed(
        &self,
        limit: u64,
        offset: Option<u64>,
    ) -> Result<Vec<Post>, DomainError> {
        if limit == 0 {
            return Err(DomainError::Invalid("limit must be positive".to_string()));
        }
        let limit = limit.min(self.config.max_limit);

        let query = PostQuery::new(PostFilter {
            published: Some(true),
            ..Default::default()
        })
        .page(limit, offset.unwrap_or(0));

        Ok(self.posts.query(&query).await?)
    }

    /// Every post of `author_id`, drafts included. Author or admin only.
    pub async fn list_by_author(
        &self,
        actor: &dyn IdentityProvider,
        author_id: Uuid,
    ) -> Result<Vec<Post>, DomainError> {
        let actor = require_identity(actor)?;
        if actor.id != author_id && !actor.is_admin() {
            tracing::warn!(actor_id = %actor.id, author_id = %author_id, "Rejected author listing");
            return Err(DomainError::Forbidden(
                "only the author may list their drafts".to_string(),
            ));
        }

        let query = PostQuery::new(PostFilter {
            author_id: Some(author_id),
            ..Default::default()
        });

        Ok(self.posts.query(&query).await?)
    }

    /// Posts awaiting an administrator, newest first.
    pub async fn list_pending_verification(
        &self,
        actor: &dyn IdentityProvider,
    ) -> Result<Vec<Post>, DomainError> {
        require_admin(actor)?;

        let query = PostQuery::new(PostFilter {
            verification_requested: Some(true),
            verified: Some(false),
            ..Default::default()
        });

        Ok(self.posts.query(&query).await?)
    }

    /// A single post as seen by `viewer`.
    ///
    /// Drafts the viewer may not see are reported as missing.
    pub async fn get_post(
        &self,
        viewer: &dyn IdentityProvider,
        post_id: Uuid,
    ) -> Result<Post, DomainError> {
        let viewer = viewer.current_identity();
        self.posts
            .find_by_id(post_id)
            .await?
            .filter(|p| p.is_visible_to(viewer.as_ref()))
            .ok_or_else(|| DomainError::post_not_found(post_id))
    }

    /// Register for change notifications.
    pub async fn subscribe(&self, handler: ChangeHandler) -> Result<SubscriptionId, DomainError> {
        self.changes
            .subscribe(handler)
            .await
            .map_err(|e| DomainError::StoreUnavailable(e.to_string()))
    }

    pub async fn unsubscribe(&self, id: SubscriptionId) -> Result<(), DomainError> {
        self.changes
            .unsubscribe(id)
            .await
            .map_err(|e| DomainError::StoreUnavailable(e.to_string()))
    }
}
