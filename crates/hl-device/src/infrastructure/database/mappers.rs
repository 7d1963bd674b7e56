use super::rows::CaptureRecordRow;
use crate::domain::entities::{CapturedRecord, Geolocation};
use crate::domain::value_objects::{LocalRecordId, RemoteRunId, SyncState};
use crate::shared::error::AppError;
use chrono::{DateTime, Utc};
use hl_types::CaptureKind;

pub fn record_from_row(kind: CaptureKind, row: CaptureRecordRow) -> Result<CapturedRecord, AppError> {
    let image_paths: Vec<String> = serde_json::from_str(&row.image_paths)?;
    let angle_labels: Vec<Option<String>> = serde_json::from_str(&row.angle_labels)?;
    let predictions = serde_json::from_str(&row.predictions)?;
    let details = row
        .details
        .as_deref()
        .map(serde_json::from_str)
        .transpose()?;

    let geolocation = match (row.latitude, row.longitude) {
        (Some(latitude), Some(longitude)) => Some(Geolocation {
            latitude,
            longitude,
        }),
        _ => None,
    };

    let remote_id = row
        .remote_id
        .map(RemoteRunId::new)
        .transpose()
        .map_err(AppError::Database)?;

    Ok(CapturedRecord {
        record_id: LocalRecordId::new(row.id),
        kind,
        image_paths,
        angle_labels,
        predictions,
        owner_id: row.owner_id,
        owner_name: row.owner_name,
        role: row.role,
        geolocation,
        location_name: row.location_name,
        details,
        created_at: timestamp_to_datetime(row.created_at),
        sync_state: SyncState::from(row.is_synced),
        remote_id,
        synced_at: row.synced_at.map(timestamp_to_datetime),
    })
}

fn timestamp_to_datetime(seconds: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(seconds, 0).unwrap_or_default()
}
