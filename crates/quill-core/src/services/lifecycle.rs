//! Post lifecycle: creation, author edits, deletion and admin verification.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::{require_admin, require_identity};
use crate::domain::{
    ChangeKind, DEFAULT_EXCERPT_LENGTH, Identity, NewPost, Post, PostChange, PostChanges,
    PostPatch, VerificationState, derive_excerpt, normalize_tags,
};
use crate::error::{DomainError, RepoError};
use crate::ports::{ChangeFeed, IdentityProvider, PostRepository};

/// Tunables for [`PostLifecycleService`].
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// Maximum length, in characters, of a derived excerpt.
    pub excerpt_length: usize,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            excerpt_length: DEFAULT_EXCERPT_LENGTH,
        }
    }
}

/// Enforces who may create, change, delete and verify posts.
pub struct PostLifecycleService {
    posts: Arc<dyn PostRepository>,
    changes: Arc<dyn ChangeFeed>,
    config: LifecycleConfig,
}

impl PostLifecycleService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        changes: Arc<dyn ChangeFeed>,
        config: LifecycleConfig,
    ) -> Self {
        Self {
            posts,
            changes,
            config,
        }
    }

    /// Create a post owned by the current identity.
    pub async fn create_post(
        &self,
        actor: &dyn IdentityProvider,
        mut draft: NewPost,
    ) -> Result<Post, DomainError> {
        let author = require_identity(actor)?;

        draft.title = required_text("title", &draft.title)?;
        if draft.content.trim().is_empty() {
            return Err(DomainError::Invalid("content must not be empty".to_string()));
        }
        draft.background_image_url = draft.background_image_url.and_then(non_blank);

        let mut post = Post::new(author.id, draft, self.config.excerpt_length);
        post.author_name = author.display_name.clone();
        let post = self.posts.insert(post).await?;

        tracing::info!(
            post_id = %post.id,
            author_id = %post.author_id,
            published = post.published,
            verification_requested = post.verification_requested,
            "Post created"
        );
        self.notify(ChangeKind::Created, &post).await;

        Ok(post)
    }

    /// Apply an author's edit. Verification fields cannot be changed here.
    pub async fn update_post(
        &self,
        actor: &dyn IdentityProvider,
        post_id: Uuid,
        patch: PostPatch,
    ) -> Result<Post, DomainError> {
        let actor = require_identity(actor)?;
        let current = self.load(post_id).await?;
        ensure_author(&actor, &current)?;

        let changes = self.validate_patch(&current, patch)?;
        let post = self.posts.update(post_id, changes).await.map_err(|e| match e {
            RepoError::NotFound => DomainError::post_not_found(post_id),
            other => other.into(),
        })?;

        tracing::info!(post_id = %post.id, actor_id = %actor.id, "Post updated");
        self.notify(ChangeKind::Updated, &post).await;

        Ok(post)
    }

    /// Permanently remove a post. Only its author may do so.
    pub async fn delete_post(
        &self,
        actor: &dyn IdentityProvider,
        post_id: Uuid,
    ) -> Result<(), DomainError> {
        let actor = require_identity(actor)?;
        let post = self.load(post_id).await?;
        ensure_author(&actor, &post)?;

        self.posts.delete(post_id).await.map_err(|e| match e {
            RepoError::NotFound => DomainError::post_not_found(post_id),
            other => other.into(),
        })?;

        tracing::info!(post_id = %post_id, actor_id = %actor.id, "Post deleted");
        self.notify(ChangeKind::Deleted, &post).await;

        Ok(())
    }

    /// Mark a pending post as verified.
    ///
    /// Idempotent: an already verified post is returned unchanged and keeps
    /// its original `verified_at`. `updated_at` is never touched.
    pub async fn verify_post(
        &self,
        actor: &dyn IdentityProvider,
        post_id: Uuid,
    ) -> Result<Post, DomainError> {
        let admin = require_admin(actor)?;
        let post = self.load(post_id).await?;

        match post.verification_state() {
            VerificationState::Verified => {
                tracing::debug!(post_id = %post_id, "Post already verified");
                return Ok(post);
            }
            VerificationState::Unrequested => {
                return Err(DomainError::Invalid(
                    "verification was not requested for this post".to_string(),
                ));
            }
            VerificationState::Pending => {}
        }

        let transitioned = self.posts.mark_verified(post_id, Utc::now()).await?;

        // Re-read either way: a concurrent call may have won the transition.
        let post = self.load(post_id).await?;
        if !post.verified {
            return Err(DomainError::Invalid(
                "post is not awaiting verification".to_string(),
            ));
        }

        if transitioned {
            tracing::info!(post_id = %post_id, admin_id = %admin.id, "Post verified");
            self.notify(ChangeKind::Verified, &post).await;
        }

        Ok(post)
    }

    async fn load(&self, post_id: Uuid) -> Result<Post, DomainError> {
        self.posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| DomainError::post_not_found(post_id))
    }

    fn validate_patch(&self, current: &Post, patch: PostPatch) -> Result<PostChanges, DomainError> {
        if patch.is_empty() {
            return Err(DomainError::Invalid("patch contains no changes".to_string()));
        }

        let title = patch
            .title
            .map(|t| required_text("title", &t))
            .transpose()?;

        if patch.content.as_deref().is_some_and(|c| c.trim().is_empty()) {
            return Err(DomainError::Invalid("content must not be empty".to_string()));
        }

        let excerpt = patch.excerpt.map(|e| {
            if e.trim().is_empty() {
                let content = patch.content.as_deref().unwrap_or(&current.content);
                derive_excerpt(content, self.config.excerpt_length)
            } else {
                e
            }
        });

        Ok(PostChanges {
            title,
            content: patch.content,
            excerpt,
            published: patch.published,
            background_image_url: patch.background_image_url.map(|u| u.and_then(non_blank)),
            tags: patch.tags.map(normalize_tags),
            updated_at: Utc::now(),
        })
    }

    async fn notify(&self, kind: ChangeKind, post: &Post) {
        if let Err(e) = self.changes.publish(PostChange::new(kind, post)).await {
            tracing::warn!(post_id = %post.id, error = %e, "Failed to publish post change");
        }
    }
}

fn ensure_author(actor: &Identity, post: &Post) -> Result<(), DomainError> {
    if post.is_owned_by(actor) {
        return Ok(());
    }
    tracing::warn!(
        post_id = %post.id,
        actor_id = %actor.id,
        "Rejected change to a post owned by another author"
    );
    Err(DomainError::Forbidden(
        "only the author may change this post".to_string(),
    ))
}

fn required_text(field: &str, value: &str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::Invalid(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Identity;
    use crate::error::ErrorKind;
    use crate::ports::{Anonymous, BaseRepository};
    use crate::services::fakes::{MemoryPosts, RecordingFeed};

    struct Fixture {
        posts: Arc<MemoryPosts>,
        feed: Arc<RecordingFeed>,
        service: PostLifecycleService,
    }

    fn fixture() -> Fixture {
        let posts = Arc::new(MemoryPosts::default());
        let feed = Arc::new(RecordingFeed::default());
        let service =
            PostLifecycleService::new(posts.clone(), feed.clone(), LifecycleConfig::default());
        Fixture {
            posts,
            feed,
            service,
        }
    }

    fn author() -> Identity {
        Identity::user(Uuid::new_v4())
    }

    #[tokio::test]
    async fn test_create_post_sets_timestamps_and_excerpt() {
        let f = fixture();
        let content = "x".repeat(500);

        let post = f
            .service
            .create_post(&author(), NewPost::new("Hello", content.clone()))
            .await
            .unwrap();

        assert_eq!(post.created_at, post.updated_at);
        assert_eq!(post.excerpt.as_deref(), Some(&content[..200]));
        assert!(!post.published);
        assert_eq!(f.feed.kinds(), vec![ChangeKind::Created]);
    }

    #[tokio::test]
    async fn test_create_post_records_author_byline() {
        let f = fixture();
        let writer = author().with_display_name("Grace Hopper");

        let post = f
            .service
            .create_post(&writer, NewPost::new("T", "C"))
            .await
            .unwrap();
        assert_eq!(post.author_name.as_deref(), Some("Grace Hopper"));

        let anonymous_byline = f
            .service
            .create_post(&author(), NewPost::new("T", "C"))
            .await
            .unwrap();
        assert_eq!(anonymous_byline.author_name, None);
    }

    #[tokio::test]
    async fn test_create_post_respects_configured_excerpt_length() {
        let posts = Arc::new(MemoryPosts::default());
        let service = PostLifecycleService::new(
            posts,
            Arc::new(RecordingFeed::default()),
            LifecycleConfig { excerpt_length: 10 },
        );

        let post = service
            .create_post(&author(), NewPost::new("T", "abcdefghijklmnop"))
            .await
            .unwrap();

        assert_eq!(post.excerpt.as_deref(), Some("abcdefghij"));
    }

    #[tokio::test]
    async fn test_create_post_rejects_blank_fields() {
        let f = fixture();

        let err = f
            .service
            .create_post(&author(), NewPost::new("   ", "body"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);

        let err = f
            .service
            .create_post(&author(), NewPost::new("Title", "\n\t"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);
        assert!(f.posts.is_empty().await);
    }

    #[tokio::test]
    async fn test_create_post_requires_identity() {
        let f = fixture();
        let err = f
            .service
            .create_post(&Anonymous, NewPost::new("T", "C"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthenticated);
    }

    #[tokio::test]
    async fn test_update_by_non_owner_is_forbidden_and_leaves_post_unchanged() {
        let f = fixture();
        let a = author();
        let b = author();
        let post = f
            .service
            .create_post(&a, NewPost::new("Draft", "Body"))
            .await
            .unwrap();

        let patch = PostPatch {
            title: Some("x".to_string()),
            ..Default::default()
        };
        let err = f.service.update_post(&b, post.id, patch).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Forbidden);
        let stored = f.posts.find_by_id(post.id).await.unwrap().unwrap();
        assert_eq!(stored, post);
    }

    #[tokio::test]
    async fn test_update_unknown_post_is_not_found() {
        let f = fixture();
        let patch = PostPatch {
            title: Some("x".to_string()),
            ..Default::default()
        };
        let err = f
            .service
            .update_post(&author(), Uuid::new_v4(), patch)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_update_by_owner_applies_patch() {
        let f = fixture();
        let a = author();
        let post = f
            .service
            .create_post(&a, NewPost::new("Draft", "Body").with_tags(["one"]))
            .await
            .unwrap();

        let patch = PostPatch {
            title: Some(" Final ".to_string()),
            published: Some(true),
            tags: Some(vec!["two".to_string(), "two".to_string()]),
            ..Default::default()
        };
        let updated = f.service.update_post(&a, post.id, patch).await.unwrap();

        assert_eq!(updated.title, "Final");
        assert!(updated.published);
        assert_eq!(updated.tags, vec!["two"]);
        assert_eq!(updated.content, "Body");
        assert_eq!(updated.created_at, post.created_at);
        assert!(updated.updated_at >= post.updated_at);
        assert!(!updated.verification_requested);
        assert_eq!(
            f.feed.kinds(),
            vec![ChangeKind::Created, ChangeKind::Updated]
        );
    }

    #[tokio::test]
    async fn test_update_blank_excerpt_rederives_from_new_content() {
        let f = fixture();
        let a = author();
        let post = f
            .service
            .create_post(&a, NewPost::new("T", "old").with_excerpt("custom"))
            .await
            .unwrap();

        let patch = PostPatch {
            content: Some("new content".to_string()),
            excerpt: Some(String::new()),
            ..Default::default()
        };
        let updated = f.service.update_post(&a, post.id, patch).await.unwrap();

        assert_eq!(updated.excerpt.as_deref(), Some("new content"));
    }

    #[tokio::test]
    async fn test_update_rejects_empty_and_blank_patches() {
        let f = fixture();
        let a = author();
        let post = f
            .service
            .create_post(&a, NewPost::new("T", "C"))
            .await
            .unwrap();

        let err = f
            .service
            .update_post(&a, post.id, PostPatch::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);

        let patch = PostPatch {
            content: Some("  ".to_string()),
            title: Some("Still valid".to_string()),
            ..Default::default()
        };
        let err = f.service.update_post(&a, post.id, patch).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);

        let stored = f.posts.find_by_id(post.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "T");
    }

    #[tokio::test]
    async fn test_delete_then_get_is_not_found() {
        let f = fixture();
        let a = author();
        let post = f
            .service
            .create_post(&a, NewPost::new("T", "C"))
            .await
            .unwrap();

        f.service.delete_post(&a, post.id).await.unwrap();

        assert!(f.posts.find_by_id(post.id).await.unwrap().is_none());
        let err = f.service.delete_post(&a, post.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_delete_by_non_owner_is_forbidden() {
        let f = fixture();
        let post = f
            .service
            .create_post(&author(), NewPost::new("T", "C"))
            .await
            .unwrap();

        let admin = Identity::admin(Uuid::new_v4());
        let err = f.service.delete_post(&admin, post.id).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert!(f.posts.find_by_id(post.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_verify_is_idempotent() {
        let f = fixture();
        let admin = Identity::admin(Uuid::new_v4());
        let post = f
            .service
            .create_post(
                &author(),
                NewPost::new("T", "C").published().request_verification(),
            )
            .await
            .unwrap();

        let first = f.service.verify_post(&admin, post.id).await.unwrap();
        assert!(first.verified);
        assert!(first.verification_requested);
        assert!(first.verified_at.is_some());
        assert_eq!(first.updated_at, post.updated_at);

        let second = f.service.verify_post(&admin, post.id).await.unwrap();
        assert_eq!(second.verified_at, first.verified_at);
        assert_eq!(
            f.feed.kinds(),
            vec![ChangeKind::Created, ChangeKind::Verified]
        );
    }

    #[tokio::test]
    async fn test_concurrent_verify_stamps_once() {
        let f = fixture();
        let admin = Identity::admin(Uuid::new_v4());
        let post = f
            .service
            .create_post(&author(), NewPost::new("T", "C").request_verification())
            .await
            .unwrap();

        let (a, b) = tokio::join!(
            f.service.verify_post(&admin, post.id),
            f.service.verify_post(&admin, post.id)
        );

        assert_eq!(a.unwrap().verified_at, b.unwrap().verified_at);
        let verified_events = f
            .feed
            .kinds()
            .into_iter()
            .filter(|k| *k == ChangeKind::Verified)
            .count();
        assert_eq!(verified_events, 1);
    }

    #[tokio::test]
    async fn test_verify_requires_admin() {
        let f = fixture();
        let a = author();
        let post = f
            .service
            .create_post(&a, NewPost::new("T", "C").request_verification())
            .await
            .unwrap();

        let err = f.service.verify_post(&a, post.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let err = f
            .service
            .verify_post(&Anonymous, post.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthenticated);

        let stored = f.posts.find_by_id(post.id).await.unwrap().unwrap();
        assert!(!stored.verified);
    }

    #[tokio::test]
    async fn test_verify_unrequested_or_missing_post_fails() {
        let f = fixture();
        let admin = Identity::admin(Uuid::new_v4());
        let post = f
            .service
            .create_post(&author(), NewPost::new("T", "C"))
            .await
            .unwrap();

        let err = f.service.verify_post(&admin, post.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);

        let err = f
            .service
            .verify_post(&admin, Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_store_failure_surfaces_as_unavailable() {
        let posts = Arc::new(MemoryPosts::default());
        posts.fail_next().await;
        let service = PostLifecycleService::new(
            posts,
            Arc::new(RecordingFeed::default()),
            LifecycleConfig::default(),
        );

        let err = service
            .create_post(&author(), NewPost::new("T", "C"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StoreUnavailable);
    }

    #[tokio::test]
    async fn test_feed_failure_does_not_fail_mutation() {
        let posts = Arc::new(MemoryPosts::default());
        let feed = Arc::new(RecordingFeed::failing());
        let service = PostLifecycleService::new(posts, feed, LifecycleConfig::default());

        assert!(
            service
                .create_post(&author(), NewPost::new("T", "C"))
                .await
                .is_ok()
        );
    }
}
