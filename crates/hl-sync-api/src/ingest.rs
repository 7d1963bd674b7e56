use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hl_types::wire::{SyncRecordRequest, SyncRecordResponse};
use hl_types::{CaptureKind, RunImage};
use sqlx::Row;

use crate::{ApiError, ApiResult, AppState};

const MAX_IMAGES_PER_RUN: usize = 3;

#[utoipa::path(
    post,
    path = "/sync/scan",
    tag = "sync",
    request_body = SyncRecordRequest,
    responses(
        (status = 200, description = "Run created or resubmission absorbed", body = SyncRecordResponse),
        (status = 422, description = "Invalid payload")
    )
)]
pub async fn sync_scan(
    State(state): State<AppState>,
    Json(request): Json<SyncRecordRequest>,
) -> ApiResult<Json<SyncRecordResponse>> {
    ingest(state, CaptureKind::Scan, request).await
}

#[utoipa::path(
    post,
    path = "/sync/registration",
    tag = "sync",
    request_body = SyncRecordRequest,
    responses(
        (status = 200, description = "Run created or resubmission absorbed", body = SyncRecordResponse),
        (status = 422, description = "Invalid payload")
    )
)]
pub async fn sync_registration(
    State(state): State<AppState>,
    Json(request): Json<SyncRecordRequest>,
) -> ApiResult<Json<SyncRecordResponse>> {
    ingest(state, CaptureKind::Registration, request).await
}

/// Idempotent ingestion. The unique key on (owner_id, client_created_at)
/// is the source of truth: the pre-insert lookup is an optimization that
/// skips blob writes on replays, and a lost race falls through to the
/// conflict-handling insert which re-reads the winning row.
async fn ingest(
    state: AppState,
    kind: CaptureKind,
    request: SyncRecordRequest,
) -> ApiResult<Json<SyncRecordResponse>> {
    let image_bytes = validate(&request)?;

    if let Some(existing) = find_existing(&state, &request).await? {
        tracing::info!(
            owner_id = %request.owner_id,
            client_timestamp = request.client_timestamp,
            remote_id = %existing.remote_id,
            "resubmission absorbed, images discarded"
        );
        return Ok(Json(existing));
    }

    let mut images = Vec::with_capacity(image_bytes.len());
    for (index, bytes) in image_bytes.iter().enumerate() {
        let url = state.blob_store.put(bytes).await.map_err(|err| {
            ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "BLOB_ERROR",
                err.to_string(),
            )
        })?;
        images.push(RunImage {
            url,
            angle_label: request.angle_labels.get(index).cloned().flatten(),
        });
    }

    let run_id = uuid::Uuid::new_v4().to_string();
    let created_at = chrono::Utc::now().timestamp();
    let images_json = encode_json(&images)?;
    let predictions_json = encode_json(&request.predictions)?;
    let details_json = request
        .details
        .as_ref()
        .map(encode_json)
        .transpose()?;

    let result = sqlx::query(
        r#"
        INSERT INTO runs (
            run_id, kind, owner_id, owner_name, role, images, predictions,
            latitude, longitude, location_name, details,
            client_created_at, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
        ON CONFLICT (owner_id, client_created_at) DO NOTHING
        "#,
    )
    .bind(&run_id)
    .bind(kind.as_str())
    .bind(&request.owner_id)
    .bind(&request.owner_name)
    .bind(&request.role)
    .bind(&images_json)
    .bind(&predictions_json)
    .bind(request.latitude)
    .bind(request.longitude)
    .bind(&request.location_name)
    .bind(&details_json)
    .bind(request.client_timestamp)
    .bind(created_at)
    .execute(&state.pool)
    .await?;

    if result.rows_affected() == 0 {
        // A concurrent request with the same key won the insert; its blobs
        // are authoritative and ours are orphaned.
        let winner = find_existing(&state, &request).await?.ok_or_else(|| {
            ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "DB_ERROR",
                "conflicting run disappeared",
            )
        })?;
        return Ok(Json(winner));
    }

    Ok(Json(SyncRecordResponse {
        remote_id: run_id,
        image_urls: images.into_iter().map(|image| image.url).collect(),
        synced_at: created_at,
    }))
}

fn validate(request: &SyncRecordRequest) -> Result<Vec<Vec<u8>>, ApiError> {
    if request.owner_id.trim().is_empty() {
        return Err(validation_error("ownerId is required"));
    }
    if request.owner_name.trim().is_empty() {
        return Err(validation_error("ownerName is required"));
    }
    if request.role.trim().is_empty() {
        return Err(validation_error("role is required"));
    }
    if request.client_timestamp <= 0 {
        return Err(validation_error("clientTimestamp must be positive"));
    }
    if request.images.is_empty() {
        return Err(validation_error("at least one image is required"));
    }
    if request.images.len() > MAX_IMAGES_PER_RUN {
        return Err(validation_error("a run carries at most 3 images"));
    }
    if !request.angle_labels.is_empty() && request.angle_labels.len() != request.images.len() {
        return Err(validation_error("angleLabels must align with images"));
    }
    for prediction in &request.predictions {
        prediction
            .validate()
            .map_err(|err| validation_error(&err.to_string()))?;
    }

    let mut decoded = Vec::with_capacity(request.images.len());
    for image in &request.images {
        let bytes = STANDARD
            .decode(image)
            .map_err(|_| validation_error("images must be base64-encoded"))?;
        if bytes.is_empty() {
            return Err(validation_error("image payload cannot be empty"));
        }
        decoded.push(bytes);
    }
    Ok(decoded)
}

fn validation_error(message: &str) -> ApiError {
    ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION", message)
}

fn encode_json<T: serde::Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string(value).map_err(|err| {
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "SERIALIZATION_ERROR",
            err.to_string(),
        )
    })
}

struct ExistingRun {
    remote_id: String,
    image_urls: Vec<String>,
    synced_at: i64,
}

impl From<ExistingRun> for SyncRecordResponse {
    fn from(run: ExistingRun) -> Self {
        SyncRecordResponse {
            remote_id: run.remote_id,
            image_urls: run.image_urls,
            synced_at: run.synced_at,
        }
    }
}

async fn find_existing(
    state: &AppState,
    request: &SyncRecordRequest,
) -> Result<Option<SyncRecordResponse>, ApiError> {
    let row = sqlx::query(
        "SELECT run_id, images, created_at FROM runs          WHERE owner_id = ?1 AND client_created_at = ?2",
    )
    .bind(&request.owner_id)
    .bind(request.client_timestamp)
    .fetch_optional(&state.pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let images_json: String = row.try_get("images")?;
    let images: Vec<RunImage> = serde_json::from_str(&images_json).map_err(|err| {
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "SERIALIZATION_ERROR",
            err.to_string(),
        )
    })?;

    Ok(Some(SyncRecordResponse::from(ExistingRun {
        remote_id: row.try_get("run_id")?,
        image_urls: images.into_iter().map(|image| image.url).collect(),
        synced_at: row.try_get("created_at")?,
    })))
}
