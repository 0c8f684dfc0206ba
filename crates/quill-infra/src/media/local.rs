//! Filesystem media store for post background images.

use std::path::PathBuf;

use async_trait::async_trait;
use uuid::Uuid;

use quill_core::ports::{MediaError, MediaFile, MediaStore};

/// Media store configuration.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Directory uploaded files are written under.
    pub root: PathBuf,
    /// Public URL prefix the root directory is served from.
    pub base_url: String,
    /// Upper bound on a single upload.
    pub max_bytes: usize,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./media"),
            base_url: "/media".to_string(),
            max_bytes: 5 * 1024 * 1024,
        }
    }
}

impl MediaConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            root: std::env::var("MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.root),
            base_url: std::env::var("MEDIA_BASE_URL").unwrap_or(defaults.base_url),
            max_bytes: std::env::var("MEDIA_MAX_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_bytes),
        }
    }
}

/// Writes images to `root/<owner>/<uuid>.<ext>`.
pub struct LocalMediaStore {
    config: MediaConfig,
}

impl LocalMediaStore {
    pub fn new(config: MediaConfig) -> Self {
        Self { config }
    }
}

fn image_extension(content_type: &str) -> Option<&'static str> {
    let essence = content_type.split(';').next().unwrap_or("").trim();
    match essence.to_ascii_lowercase().as_str() {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/avif" => Some("avif"),
        _ => None,
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn upload(&self, owner_id: Uuid, file: MediaFile) -> Result<String, MediaError> {
        let ext = image_extension(&file.content_type)
            .ok_or_else(|| MediaError::UnsupportedType(file.content_type.clone()))?;

        if file.bytes.is_empty() {
            return Err(MediaError::Empty);
        }
        if file.bytes.len() > self.config.max_bytes {
            return Err(MediaError::TooLarge {
                size: file.bytes.len(),
                limit: self.config.max_bytes,
            });
        }

        let dir = self.config.root.join(owner_id.to_string());
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| MediaError::Storage(e.to_string()))?;

        let name = format!("{}.{}", Uuid::new_v4(), ext);
        tokio::fs::write(dir.join(&name), &file.bytes)
            .await
            .map_err(|e| MediaError::Storage(e.to_string()))?;

        tracing::info!(
            owner_id = %owner_id,
            file = %name,
            bytes = file.bytes.len(),
            original = ?file.file_name,
            "Media stored"
        );

        Ok(format!(
            "{}/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            owner_id,
            name
        ))
    }
}
