use crate::application::ports::{ReadImage, SyncAck, SyncGateway};
use crate::domain::entities::CapturedRecord;
use crate::domain::value_objects::RemoteRunId;
use crate::shared::error::AppError;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::DateTime;
use hl_types::wire::{SyncRecordRequest, SyncRecordResponse};

/// reqwest-backed client for the ingestion endpoint. A non-success status
/// is surfaced as a network error so the engine leaves the record queued.
pub struct HttpSyncGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSyncGateway {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl SyncGateway for HttpSyncGateway {
    async fn submit(
        &self,
        record: &CapturedRecord,
        images: Vec<ReadImage>,
    ) -> Result<SyncAck, AppError> {
        let mut encoded = Vec::with_capacity(images.len());
        let mut angle_labels = Vec::with_capacity(images.len());
        for image in &images {
            encoded.push(STANDARD.encode(&image.bytes));
            angle_labels.push(image.angle_label.clone());
        }

        let request = SyncRecordRequest {
            images: encoded,
            angle_labels,
            predictions: record.predictions.clone(),
            owner_id: record.owner_id.clone(),
            owner_name: record.owner_name.clone(),
            role: record.role.clone(),
            latitude: record.geolocation.map(|g| g.latitude),
            longitude: record.geolocation.map(|g| g.longitude),
            location_name: record.location_name.clone(),
            client_timestamp: record.created_at.timestamp(),
            details: record.details.clone(),
        };

        let url = format!("{}/sync/{}", self.base_url, record.kind);
        let response = self.client.post(&url).json(&request).send().await?;
        if !response.status().is_success() {
            return Err(AppError::Network(format!(
                "sync endpoint returned {}",
                response.status()
            )));
        }

        let body: SyncRecordResponse = response.json().await?;
        let remote_id = RemoteRunId::new(body.remote_id).map_err(AppError::Network)?;
        let synced_at = DateTime::from_timestamp(body.synced_at, 0)
            .ok_or_else(|| AppError::Network("invalid syncedAt timestamp".to_string()))?;

        Ok(SyncAck {
            remote_id,
            image_urls: body.image_urls,
            synced_at,
        })
    }
}
