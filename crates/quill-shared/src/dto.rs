//! Data Transfer Objects - request/response types for the API.

use serde::{Deserialize, Serialize};

/// Pagination parameters for the public feed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedQuery {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// A post as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: String,
    pub author_id: String,
    pub author_name: Option<String>,
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub published: bool,
    pub verification_requested: bool,
    pub verified: bool,
    pub verified_at: Option<String>,
    pub verification_state: String,
    pub background_image_url: Option<String>,
    pub tags: Vec<String>,
    pub read_time_minutes: usize,
    pub created_at: String,
    pub updated_at: String,
}

/// A page of posts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostListResponse {
    pub posts: Vec<PostResponse>,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
}

impl PostListResponse {
    pub fn new(posts: Vec<PostResponse>) -> Self {
        Self {
            count: posts.len(),
            posts,
            limit: None,
            offset: None,
        }
    }

    pub fn paged(posts: Vec<PostResponse>, limit: u64, offset: u64) -> Self {
        Self {
            limit: Some(limit),
            offset: Some(offset),
            ..Self::new(posts)
        }
    }
}

/// Result of a media upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaUploadResponse {
    pub url: String,
}
