//! Terminal decision endpoints. Each table carries UNIQUE(run_id,
//! image_url); a same-table conflict is an idempotent replay of the same
//! decision, an opposite-table hit is a 409 so an image can never hold two
//! dispositions.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use hl_types::wire::{ApproveRequest, DecisionResponse, RejectRequest};
use hl_types::{Disposition, RunImage};
use serde_json::json;
use sqlx::{Row, Sqlite, Transaction};

use crate::{ApiError, ApiResult, AppState};

#[utoipa::path(
    post,
    path = "/evaluations/approve",
    tag = "evaluations",
    request_body = ApproveRequest,
    responses(
        (status = 200, description = "Approval recorded (or replayed)", body = DecisionResponse),
        (status = 404, description = "Unknown run or image"),
        (status = 409, description = "Image already rejected")
    )
)]
pub async fn approve(
    State(state): State<AppState>,
    Json(request): Json<ApproveRequest>,
) -> ApiResult<Json<DecisionResponse>> {
    if request.final_label.trim().is_empty() {
        return Err(validation_error("finalLabel is required"));
    }
    if request.reviewer_id.trim().is_empty() {
        return Err(validation_error("reviewerId is required"));
    }
    let quality = serde_json::to_string(&request.quality).map_err(|err| {
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "SERIALIZATION_ERROR",
            err.to_string(),
        )
    })?;

    let mut tx = state.pool.begin().await?;
    ensure_image_belongs_to_run(&mut tx, &request.run_id, &request.image_url).await?;
    ensure_not_decided_in(
        &mut tx,
        "rejected_samples",
        Disposition::Rejected,
        &request.run_id,
        &request.image_url,
    )
    .await?;

    let result = sqlx::query(
        r#"
        INSERT INTO approved_samples (
            run_id, image_url, final_label, quality, reviewer_id, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT (run_id, image_url) DO NOTHING
        "#,
    )
    .bind(&request.run_id)
    .bind(&request.image_url)
    .bind(&request.final_label)
    .bind(&quality)
    .bind(&request.reviewer_id)
    .bind(chrono::Utc::now().timestamp())
    .execute(&mut *tx)
    .await?;

    let response = finish_decision(
        &mut tx,
        "approved_samples",
        Disposition::Approved,
        &request.run_id,
        &request.image_url,
        result.rows_affected(),
    )
    .await?;
    tx.commit().await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/evaluations/reject",
    tag = "evaluations",
    request_body = RejectRequest,
    responses(
        (status = 200, description = "Rejection recorded (or replayed)", body = DecisionResponse),
        (status = 404, description = "Unknown run or image"),
        (status = 409, description = "Image already approved")
    )
)]
pub async fn reject(
    State(state): State<AppState>,
    Json(request): Json<RejectRequest>,
) -> ApiResult<Json<DecisionResponse>> {
    if request.reason.trim().is_empty() {
        return Err(validation_error("reason is required"));
    }
    if request.reviewer_id.trim().is_empty() {
        return Err(validation_error("reviewerId is required"));
    }

    let mut tx = state.pool.begin().await?;
    ensure_image_belongs_to_run(&mut tx, &request.run_id, &request.image_url).await?;
    ensure_not_decided_in(
        &mut tx,
        "approved_samples",
        Disposition::Approved,
        &request.run_id,
        &request.image_url,
    )
    .await?;

    let result = sqlx::query(
        r#"
        INSERT INTO rejected_samples (
            run_id, image_url, reason, reviewer_id, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT (run_id, image_url) DO NOTHING
        "#,
    )
    .bind(&request.run_id)
    .bind(&request.image_url)
    .bind(&request.reason)
    .bind(&request.reviewer_id)
    .bind(chrono::Utc::now().timestamp())
    .execute(&mut *tx)
    .await?;

    let response = finish_decision(
        &mut tx,
        "rejected_samples",
        Disposition::Rejected,
        &request.run_id,
        &request.image_url,
        result.rows_affected(),
    )
    .await?;
    tx.commit().await?;
    Ok(Json(response))
}

fn validation_error(message: &str) -> ApiError {
    ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION", message)
}

async fn ensure_image_belongs_to_run(
    tx: &mut Transaction<'_, Sqlite>,
    run_id: &str,
    image_url: &str,
) -> Result<(), ApiError> {
    let row = sqlx::query("SELECT images FROM runs WHERE run_id = ?1")
        .bind(run_id)
        .fetch_optional(&mut **tx)
        .await?;
    let Some(row) = row else {
        return Err(ApiError::new(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("run {run_id} not found"),
        ));
    };

    let images_json: String = row.try_get("images")?;
    let images: Vec<RunImage> = serde_json::from_str(&images_json).map_err(|err| {
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "SERIALIZATION_ERROR",
            err.to_string(),
        )
    })?;
    if !images.iter().any(|image| image.url == image_url) {
        return Err(ApiError::new(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("image does not belong to run {run_id}"),
        ));
    }
    Ok(())
}

async fn ensure_not_decided_in(
    tx: &mut Transaction<'_, Sqlite>,
    opposite_table: &str,
    opposite: Disposition,
    run_id: &str,
    image_url: &str,
) -> Result<(), ApiError> {
    let query = format!(
        "SELECT id FROM {opposite_table} WHERE run_id = ?1 AND image_url = ?2 LIMIT 1"
    );
    let existing = sqlx::query(&query)
        .bind(run_id)
        .bind(image_url)
        .fetch_optional(&mut **tx)
        .await?;
    if existing.is_some() {
        return Err(ApiError::new(
            StatusCode::CONFLICT,
            "ALREADY_DECIDED",
            "image already holds the opposite disposition",
        )
        .with_details(json!({ "disposition": opposite.as_str() })));
    }
    Ok(())
}

/// Resolves the decision id after the conflict-handling insert: a fresh
/// insert reports its row, a replay reports the original row.
async fn finish_decision(
    tx: &mut Transaction<'_, Sqlite>,
    table: &str,
    disposition: Disposition,
    run_id: &str,
    image_url: &str,
    rows_affected: u64,
) -> Result<DecisionResponse, ApiError> {
    let query = format!("SELECT id FROM {table} WHERE run_id = ?1 AND image_url = ?2");
    let row = sqlx::query(&query)
        .bind(run_id)
        .bind(image_url)
        .fetch_one(&mut **tx)
        .await?;
    let decision_id: i64 = row.try_get("id")?;

    if rows_affected == 0 {
        tracing::info!(
            run_id = %run_id,
            image_url = %image_url,
            disposition = %disposition,
            "duplicate decision absorbed"
        );
    }

    Ok(DecisionResponse {
        decision_id,
        disposition,
        already_decided: rows_affected == 0,
    })
}
