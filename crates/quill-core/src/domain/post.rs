use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Identity;

/// Number of characters taken from `content` when no excerpt is supplied.
pub const DEFAULT_EXCERPT_LENGTH: usize = 200;

const WORDS_PER_MINUTE: usize = 200;

/// Post entity - an authored article with publication and verification state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    /// Byline captured from the author's identity when the post was created.
    pub author_name: Option<String>,
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub published: bool,
    pub verification_requested: bool,
    pub verified: bool,
    pub verified_at: Option<DateTime<Utc>>,
    pub background_image_url: Option<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Where a post stands in the verification workflow.
///
/// `Unrequested -> Pending -> Verified`; nothing leaves `Verified`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationState {
    Unrequested,
    Pending,
    Verified,
}

impl Post {
    /// Create a new post for `author_id` from an already validated draft.
    pub fn new(author_id: Uuid, draft: NewPost, excerpt_length: usize) -> Self {
        let now = Utc::now();
        let excerpt = match draft.excerpt {
            Some(e) if !e.trim().is_empty() => e,
            _ => derive_excerpt(&draft.content, excerpt_length),
        };

        Self {
            id: Uuid::new_v4(),
            author_id,
            author_name: None,
            title: draft.title,
            content: draft.content,
            excerpt: Some(excerpt),
            published: draft.published,
            verification_requested: draft.verification_requested,
            verified: false,
            verified_at: None,
            background_image_url: draft.background_image_url,
            tags: normalize_tags(draft.tags),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn verification_state(&self) -> VerificationState {
        match (self.verification_requested, self.verified) {
            (_, true) => VerificationState::Verified,
            (true, false) => VerificationState::Pending,
            (false, false) => VerificationState::Unrequested,
        }
    }

    pub fn is_owned_by(&self, identity: &Identity) -> bool {
        self.author_id == identity.id
    }

    /// Published posts are public; drafts are visible to their author and admins.
    pub fn is_visible_to(&self, viewer: Option<&Identity>) -> bool {
        if self.published {
            return true;
        }
        viewer.is_some_and(|v| v.is_admin() || self.is_owned_by(v))
    }

    /// Estimated reading time, at least one minute.
    pub fn read_time_minutes(&self) -> usize {
        let words = self.content.split_whitespace().count();
        words.div_ceil(WORDS_PER_MINUTE).max(1)
    }

    /// Pending -> Verified, stamping `verified_at`. `updated_at` is left alone.
    ///
    /// Returns false without touching the post in any other state.
    pub fn mark_verified(&mut self, at: DateTime<Utc>) -> bool {
        if self.verification_state() != VerificationState::Pending {
            return false;
        }
        self.verified = true;
        self.verified_at = Some(at);
        true
    }

    /// Apply a store-level change set in place.
    pub fn apply(&mut self, changes: &PostChanges) {
        if let Some(title) = &changes.title {
            self.title = title.clone();
        }
        if let Some(content) = &changes.content {
            self.content = content.clone();
        }
        if let Some(excerpt) = &changes.excerpt {
            self.excerpt = Some(excerpt.clone());
        }
        if let Some(published) = changes.published {
            self.published = published;
        }
        if let Some(url) = &changes.background_image_url {
            self.background_image_url = url.clone();
        }
        if let Some(tags) = &changes.tags {
            self.tags = tags.clone();
        }
        self.updated_at = changes.updated_at;
    }
}

/// Author-supplied fields for a new post.
///
/// Unknown fields are rejected so ownership and verification state cannot be
/// smuggled in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub verification_requested: bool,
    #[serde(default)]
    pub background_image_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NewPost {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_excerpt(mut self, excerpt: impl Into<String>) -> Self {
        self.excerpt = Some(excerpt.into());
        self
    }

    pub fn published(mut self) -> Self {
        self.published = true;
        self
    }

    pub fn request_verification(mut self) -> Self {
        self.verification_requested = true;
        self
    }

    pub fn with_background_image(mut self, url: impl Into<String>) -> Self {
        self.background_image_url = Some(url.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Author-editable fields of an existing post. `None` leaves a field untouched.
///
/// `background_image_url: Some(None)` clears the image. A blank `excerpt`
/// asks for it to be derived again from the content. Naming any other field,
/// such as `verified` or `author_id`, fails to deserialize.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub published: Option<bool>,
    #[serde(default, with = "double_option")]
    pub background_image_url: Option<Option<String>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl PostPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.excerpt.is_none()
            && self.published.is_none()
            && self.background_image_url.is_none()
            && self.tags.is_none()
    }
}

/// Validated partial record handed to the store for a single atomic update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub published: Option<bool>,
    pub background_image_url: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub updated_at: DateTime<Utc>,
}

/// First `max_chars` characters of `content`.
pub fn derive_excerpt(content: &str, max_chars: usize) -> String {
    content.chars().take(max_chars).collect()
}

/// Trim labels, drop blanks and repeated labels, keep first-seen order.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() || out.iter().any(|t| t == tag) {
            continue;
        }
        out.push(tag.to_string());
    }
    out
}

// Distinguishes an absent field from an explicit `null`.
mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S, T>(value: &Option<Option<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}
