//! Media storage port.

use async_trait::async_trait;
use uuid::Uuid;

/// An uploaded file.
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub file_name: Option<String>,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Stores media owned by an identity and hands back a reference URL.
///
/// The returned URL is opaque to the domain.
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn upload(&self, owner_id: Uuid, file: MediaFile) -> Result<String, MediaError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Unsupported media type: {0}")]
    UnsupportedType(String),

    #[error("File too large: {size} bytes (limit {limit})")]
    TooLarge { size: usize, limit: usize },

    #[error("Empty file")]
    Empty,

    #[error("Storage error: {0}")]
    Storage(String),
}
