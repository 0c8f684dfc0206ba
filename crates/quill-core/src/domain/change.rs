use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Post;

/// What happened to a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
    Verified,
}

/// Notification emitted after a post mutation has been committed.
///
/// Carries only identifiers and visibility so that subscribers refetch
/// through the listing rather than trusting the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostChange {
    pub kind: ChangeKind,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub published: bool,
    pub at: DateTime<Utc>,
}

impl PostChange {
    pub fn new(kind: ChangeKind, post: &Post) -> Self {
        Self {
            kind,
            post_id: post.id,
            author_id: post.author_id,
            published: post.published,
            at: Utc::now(),
        }
    }

    /// Whether the public feed may look different after this change.
    pub fn affects_public_feed(&self) -> bool {
        // A deleted or updated post may have just left the feed.
        self.published || matches!(self.kind, ChangeKind::Deleted | ChangeKind::Updated)
    }
}
