use crate::shared::error::AppError;
use async_trait::async_trait;

/// Access to captured image files. Reads can fail for individual files
/// (moved, corrupted, storage detached) without poisoning the sync pass.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn read(&self, path: &str) -> Result<Vec<u8>, AppError>;
}
