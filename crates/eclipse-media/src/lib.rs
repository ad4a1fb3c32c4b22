//! Disk-backed media store with an S3-like put-object contract: callers
//! hand over a key and bytes, and get back the public URL persisted next
//! to the post or message row.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use tracing::{debug, info};

/// 50 MB upload limit for media payloads.
const MAX_MEDIA_SIZE: usize = 50 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("invalid media key: {0}")]
    InvalidKey(String),

    #[error("empty media payload")]
    Empty,

    #[error("media too large: {size} bytes (max {max})")]
    TooLarge { size: usize, max: usize },

    #[error("media storage error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct MediaStore {
    dir: PathBuf,
    base_url: String,
}

impl MediaStore {
    pub async fn new(dir: PathBuf, base_url: String) -> Result<Self, MediaError> {
        fs::create_dir_all(&dir).await?;
        info!("Media storage directory: {}", dir.display());
        Ok(Self {
            dir,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Store a blob under `key` and return its public URL.
    pub async fn put(&self, key: &str, data: &[u8]) -> Result<String, MediaError> {
        if data.is_empty() {
            return Err(MediaError::Empty);
        }
        if data.len() > MAX_MEDIA_SIZE {
            return Err(MediaError::TooLarge {
                size: data.len(),
                max: MAX_MEDIA_SIZE,
            });
        }

        let path = self.safe_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, data).await?;

        debug!(key = %key, size = data.len(), "Stored media object");
        Ok(format!("{}/{}", self.base_url, key))
    }

    /// Resolve a key below the storage root, rejecting traversal attempts.
    fn safe_path(&self, key: &str) -> Result<PathBuf, MediaError> {
        if key.is_empty() {
            return Err(MediaError::InvalidKey("empty key".into()));
        }
        let rel = Path::new(key);
        for component in rel.components() {
            match component {
                Component::Normal(_) => {}
                _ => {
                    return Err(MediaError::InvalidKey(format!(
                        "path traversal detected in '{key}'"
                    )));
                }
            }
        }
        Ok(self.dir.join(rel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_store_dir() -> PathBuf {
        std::env::temp_dir().join(format!("eclipse-media-test-{}", Uuid::new_v4()))
    }

    #[tokio::test]
    async fn put_returns_public_url() {
        let store = MediaStore::new(temp_store_dir(), "https://cdn.example/bucket/".into())
            .await
            .unwrap();
        let url = store.put("posts/u1/123.jpg", b"data").await.unwrap();
        assert_eq!(url, "https://cdn.example/bucket/posts/u1/123.jpg");
    }

    #[tokio::test]
    async fn rejects_traversal_keys() {
        let store = MediaStore::new(temp_store_dir(), "https://cdn.example".into())
            .await
            .unwrap();
        assert!(matches!(
            store.put("../escape", b"data").await,
            Err(MediaError::InvalidKey(_))
        ));
        assert!(matches!(
            store.put("", b"data").await,
            Err(MediaError::InvalidKey(_))
        ));
    }

    #[tokio::test]
    async fn rejects_empty_payload() {
        let store = MediaStore::new(temp_store_dir(), "https://cdn.example".into())
            .await
            .unwrap();
        assert!(matches!(store.put("a/b", b"").await, Err(MediaError::Empty)));
    }
}
