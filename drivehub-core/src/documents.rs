use async_trait::async_trait;
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("I/O failure storing {path}: {message}")]
    Io { path: String, message: String },

    #[error("Document rejected: {0}")]
    Rejected(String),
}

/// Blob storage for identity proofs, live photos and signatures.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Persist `blob` at `path` and return a URL it can be fetched from.
    async fn store(&self, blob: &[u8], path: &str) -> Result<String, DocumentError>;
}

/// One file captured by the booking form.
#[derive(Debug, Clone, Deserialize)]
pub struct Upload {
    pub file_name: String,
    #[serde(default)]
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Lower-cased extension of the original file name, if it has a sensible one.
    pub fn extension(&self) -> Option<String> {
        let (_, ext) = self.file_name.rsplit_once('.')?;
        let ext = ext.to_ascii_lowercase();
        (!ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric())).then_some(ext)
    }
}
