use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{debug, instrument};

use super::{ObjectStore, VendorError};

/// Keeps objects as files in one directory, served under a public URL prefix
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
    public_base_url: String,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }
}

/// Keys are flat file names
fn validate_key(key: &str) -> Result<(), VendorError> {
    if key.is_empty() || key.contains('/') || key.contains('\\') || key.contains("..") {
        return Err(VendorError::InvalidKey(key.to_string()));
    }
    Ok(())
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    /// Writes `bytes` to `<root>/<key>`
    ///
    /// Files carry no metadata, so the content type is not recorded; the
    /// media route infers it from the key's extension when serving.
    #[instrument(skip(self, bytes, _content_type), fields(size = bytes.len()))]
    async fn put(&self, key: &str, bytes: Vec<u8>, _content_type: &str) -> Result<String, VendorError> {
        validate_key(key)?;

        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.root.join(key), bytes).await?;

        debug!("Stored object {}", key);
        Ok(format!("{}/{}", self.public_base_url, key))
    }
}
