use crate::domain::value_objects::{LocalRecordId, RemoteRunId, SyncState};
use chrono::{DateTime, Utc};
use hl_types::{CaptureKind, Prediction};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geolocation {
    pub latitude: f64,
    pub longitude: f64,
}

/// A capture as entered on the device, before the local store has assigned
/// it a row id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureDraft {
    pub kind: CaptureKind,
    pub image_paths: Vec<String>,
    pub angle_labels: Vec<Option<String>>,
    pub predictions: Vec<Prediction>,
    pub owner_id: String,
    pub owner_name: String,
    pub role: String,
    pub geolocation: Option<Geolocation>,
    pub location_name: Option<String>,
    pub details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// A stored capture. Immutable after creation apart from the single
/// `mark_synced` transition; the device never edits or deletes records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedRecord {
    pub record_id: LocalRecordId,
    pub kind: CaptureKind,
    pub image_paths: Vec<String>,
    pub angle_labels: Vec<Option<String>>,
    pub predictions: Vec<Prediction>,
    pub owner_id: String,
    pub owner_name: String,
    pub role: String,
    pub geolocation: Option<Geolocation>,
    pub location_name: Option<String>,
    pub details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub sync_state: SyncState,
    pub remote_id: Option<RemoteRunId>,
    pub synced_at: Option<DateTime<Utc>>,
}

impl CapturedRecord {
    /// Angle label recorded for image position `index`, if any.
    pub fn angle_label(&self, index: usize) -> Option<&str> {
        self.angle_labels
            .get(index)
            .and_then(|label| label.as_deref())
    }
}
