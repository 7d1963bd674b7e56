use crate::domain::entities::CapturedRecord;
use crate::domain::value_objects::RemoteRunId;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Image bytes that were actually readable for one record, with the angle
/// label they were captured under.
#[derive(Debug, Clone)]
pub struct ReadImage {
    pub bytes: Vec<u8>,
    pub angle_label: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SyncAck {
    pub remote_id: RemoteRunId,
    pub image_urls: Vec<String>,
    pub synced_at: DateTime<Utc>,
}

/// Client for the server-side ingestion endpoint. Safe to call repeatedly
/// for the same record; the server dedupes on (owner id, client timestamp).
#[async_trait]
pub trait SyncGateway: Send + Sync {
    async fn submit(
        &self,
        record: &CapturedRecord,
        images: Vec<ReadImage>,
    ) -> Result<SyncAck, AppError>;
}
