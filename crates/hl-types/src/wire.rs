//! Request and response bodies shared by the device gateways and the two
//! HTTP services. Field names follow the external interface (camelCase on
//! the wire, snake_case in Rust).

use serde::{Deserialize, Serialize};

use crate::{Disposition, Prediction, QualityChecks};

/// Body of `POST /sync/scan` and `POST /sync/registration`. Image bytes
/// travel inline as base64 strings, ordered; `angle_labels` aligns with
/// `images` by position when present.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncRecordRequest {
    pub images: Vec<String>,
    #[serde(default)]
    pub angle_labels: Vec<Option<String>>,
    pub predictions: Vec<Prediction>,
    pub owner_id: String,
    pub owner_name: String,
    pub role: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_name: Option<String>,
    /// Client-clock creation time, unix seconds. Half of the idempotency
    /// key together with `owner_id`.
    pub client_timestamp: i64,
    /// Registration-only free-form fields; absent for scans.
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncRecordResponse {
    pub remote_id: String,
    pub image_urls: Vec<String>,
    pub synced_at: i64,
}

/// One row of `GET /evaluations/pending`.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PendingRunSummary {
    pub run_id: String,
    pub owner_name: String,
    pub total_images: u32,
    pub pending_count: u32,
    pub top_prediction: Option<Prediction>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RunImageStatus {
    pub url: String,
    pub angle_label: String,
    pub disposition: Disposition,
}

/// Body of `GET /evaluations/run/{run_id}`.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RunDetail {
    pub run_id: String,
    pub owner_name: String,
    pub kind: String,
    pub predictions: Vec<Prediction>,
    pub created_at: i64,
    pub images: Vec<RunImageStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApproveRequest {
    pub run_id: String,
    pub image_url: String,
    pub final_label: String,
    pub quality: QualityChecks,
    pub reviewer_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RejectRequest {
    pub run_id: String,
    pub image_url: String,
    pub reason: String,
    pub reviewer_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DecisionResponse {
    pub decision_id: i64,
    pub disposition: Disposition,
    /// True when the same decision already existed and this call was
    /// absorbed as a replay.
    pub already_decided: bool,
}
