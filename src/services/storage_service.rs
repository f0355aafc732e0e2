use std::path::PathBuf;
use tokio::fs;

use crate::error::ApiError;

/// Writes uploaded photo bytes below `{root}/{session_id}/`.
#[derive(Debug, Clone)]
pub struct PhotoStorage {
    root: PathBuf,
}

impl PhotoStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, session_id: &str, filename: &str) -> PathBuf {
        self.root.join(session_id).join(filename)
    }

    /// Persist `content`, replacing any file already at the same path.
    pub async fn save(&self, session_id: &str, filename: &str, content: &[u8]) -> Result<PathBuf, ApiError> {
        let dir = self.root.join(session_id);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to create storage directory: {}", e)))?;

        let path = self.path_for(session_id, filename);
        fs::write(&path, content)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to write file: {}", e)))?;

        tracing::debug!(path = %path.display(), bytes = content.len(), "photo stored");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_creates_directories_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let storage = PhotoStorage::new(dir.path().join("uploads"));

        let path = storage.save("sess1", "IMG_1.jpg", b"first").await.unwrap();
        assert_eq!(path, storage.path_for("sess1", "IMG_1.jpg"));
        assert_eq!(std::fs::read(&path).unwrap(), b"first");

        storage.save("sess1", "IMG_1.jpg", b"second").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"second");
    }
}
