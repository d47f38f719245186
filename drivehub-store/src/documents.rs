//! Document storage on the local filesystem.

use async_trait::async_trait;
use drivehub_core::{DocumentError, DocumentStore};
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Writes uploads under `root` and hands out URLs under `public_base_url`.
#[derive(Debug, Clone)]
pub struct LocalDocumentStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalDocumentStore {
    pub async fn new(root: &str, public_base_url: &str) -> Result<Self, DocumentError> {
        let root = PathBuf::from(root);
        fs::create_dir_all(&root).await.map_err(|e| DocumentError::Io {
            path: root.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            root,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Relative paths only; no `..` or absolute components.
    fn resolve(&self, path: &str) -> Result<PathBuf, DocumentError> {
        let relative = Path::new(path);
        let clean = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if path.is_empty() || !clean {
            return Err(DocumentError::Rejected(format!("invalid document path {path:?}")));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl DocumentStore for LocalDocumentStore {
    async fn store(&self, blob: &[u8], path: &str) -> Result<String, DocumentError> {
        if blob.is_empty() {
            return Err(DocumentError::Rejected(format!("{path} is empty")));
        }
        let full_path = self.resolve(path)?;
        let io_err = |e: std::io::Error| DocumentError::Io {
            path: path.to_string(),
            message: e.to_string(),
        };

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        fs::write(&full_path, blob).await.map_err(io_err)?;

        debug!(path, bytes = blob.len(), "Stored document");
        Ok(format!("{}/{}", self.public_base_url, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_writes_and_returns_public_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalDocumentStore::new(dir.path().to_str().unwrap(), "https://cdn.example.com/docs/")
            .await
            .unwrap();

        let url = store.store(b"jpeg", "bookings/v1/s1/id_proof.jpg").await.unwrap();
        assert_eq!(url, "https://cdn.example.com/docs/bookings/v1/s1/id_proof.jpg");

        let written = fs::read(dir.path().join("bookings/v1/s1/id_proof.jpg")).await.unwrap();
        assert_eq!(written, b"jpeg");
    }

    #[tokio::test]
    async fn test_rejects_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalDocumentStore::new(dir.path().to_str().unwrap(), "http://localhost")
            .await
            .unwrap();

        assert!(matches!(
            store.store(b"x", "../outside.png").await,
            Err(DocumentError::Rejected(_))
        ));
        assert!(matches!(
            store.store(b"x", "/etc/passwd").await,
            Err(DocumentError::Rejected(_))
        ));
        assert!(matches!(store.store(b"", "a/b.png").await, Err(DocumentError::Rejected(_))));
    }
}
