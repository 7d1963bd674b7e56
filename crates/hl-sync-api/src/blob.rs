use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;

/// Image persistence collaborator. `put` returns a stable URL. Blob writes
/// are not transactional with the run insert: a request aborted between the
/// two leaves an orphaned blob, and a retried request hits the idempotency
/// lookup before writing anything new.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, bytes: &[u8]) -> Result<String>;
}

pub struct FsBlobStore {
    dir: PathBuf,
}

impl FsBlobStore {
    pub fn new(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("creating blob dir {}", dir.display()))?;
        Ok(Self { dir })
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, bytes: &[u8]) -> Result<String> {
        let name = format!("{}.jpg", uuid::Uuid::new_v4());
        let path = self.dir.join(&name);
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("writing blob {}", path.display()))?;
        Ok(format!("/media/{name}"))
    }
}
