use crate::application::ports::ImageSource;
use crate::shared::error::AppError;
use async_trait::async_trait;

#[derive(Default)]
pub struct FsImageSource;

impl FsImageSource {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ImageSource for FsImageSource {
    async fn read(&self, path: &str) -> Result<Vec<u8>, AppError> {
        Ok(tokio::fs::read(path).await?)
    }
}
