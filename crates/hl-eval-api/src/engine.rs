//! Pending-work derivation. There is no stored "pending" table: an image is
//! pending exactly until one decision row references its URL, so the
//! pending set is computed on demand by set difference against the two
//! append-only decision tables.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use hl_types::wire::{PendingRunSummary, RunDetail, RunImageStatus};
use hl_types::{angle_label_or_default, Disposition, Prediction, RunImage};
use sqlx::{FromRow, Pool, Sqlite};
use std::collections::HashSet;

use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, FromRow)]
struct RunRow {
    run_id: String,
    kind: String,
    owner_name: String,
    images: String,
    predictions: String,
    created_at: i64,
}

#[utoipa::path(
    get,
    path = "/evaluations/pending",
    tag = "evaluations",
    responses((status = 200, description = "Runs with at least one undecided image, most recent first", body = [PendingRunSummary]))
)]
pub async fn pending_runs(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<PendingRunSummary>>> {
    let decided = decided_urls(&state.pool).await?;
    let rows = sqlx::query_as::<_, RunRow>(
        "SELECT run_id, kind, owner_name, images, predictions, created_at          FROM runs ORDER BY created_at DESC, run_id ASC",
    )
    .fetch_all(&state.pool)
    .await?;

    let mut summaries = Vec::new();
    for row in rows {
        let images = decode_images(&row.images)?;
        let pending_count = images
            .iter()
            .filter(|image| !decided.contains(&image.url))
            .count() as u32;
        if pending_count == 0 {
            continue;
        }
        let predictions: Vec<Prediction> = decode_json(&row.predictions)?;
        summaries.push(PendingRunSummary {
            run_id: row.run_id,
            owner_name: row.owner_name,
            total_images: images.len() as u32,
            pending_count,
            top_prediction: predictions.into_iter().next(),
            created_at: row.created_at,
        });
    }

    Ok(Json(summaries))
}

#[utoipa::path(
    get,
    path = "/evaluations/run/{run_id}",
    tag = "evaluations",
    params(("run_id" = String, Path, description = "Server-assigned run id")),
    responses(
        (status = 200, description = "Run detail with per-image dispositions", body = RunDetail),
        (status = 404, description = "Unknown run")
    )
)]
pub async fn run_detail(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> ApiResult<Json<RunDetail>> {
    let row = sqlx::query_as::<_, RunRow>(
        "SELECT run_id, kind, owner_name, images, predictions, created_at          FROM runs WHERE run_id = ?1",
    )
    .bind(&run_id)
    .fetch_optional(&state.pool)
    .await?;
    let Some(row) = row else {
        return Err(ApiError::new(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("run {run_id} not found"),
        ));
    };

    let approved = urls_for_run(&state.pool, "approved_samples", &run_id).await?;
    let rejected = urls_for_run(&state.pool, "rejected_samples", &run_id).await?;

    let images = decode_images(&row.images)?
        .into_iter()
        .enumerate()
        .map(|(index, image)| {
            let disposition = if approved.contains(&image.url) {
                Disposition::Approved
            } else if rejected.contains(&image.url) {
                Disposition::Rejected
            } else {
                Disposition::Pending
            };
            RunImageStatus {
                angle_label: angle_label_or_default(image.angle_label.as_deref(), index + 1),
                url: image.url,
                disposition,
            }
        })
        .collect();

    Ok(Json(RunDetail {
        run_id: row.run_id,
        owner_name: row.owner_name,
        kind: row.kind,
        predictions: decode_json(&row.predictions)?,
        created_at: row.created_at,
        images,
    }))
}

async fn decided_urls(pool: &Pool<Sqlite>) -> Result<HashSet<String>, ApiError> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT image_url FROM approved_samples          UNION SELECT image_url FROM rejected_samples",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|(url,)| url).collect())
}

async fn urls_for_run(
    pool: &Pool<Sqlite>,
    table: &str,
    run_id: &str,
) -> Result<HashSet<String>, ApiError> {
    let query = format!("SELECT image_url FROM {table} WHERE run_id = ?1");
    let rows: Vec<(String,)> = sqlx::query_as(&query).bind(run_id).fetch_all(pool).await?;
    Ok(rows.into_iter().map(|(url,)| url).collect())
}

fn decode_images(json: &str) -> Result<Vec<RunImage>, ApiError> {
    decode_json(json)
}

fn decode_json<T: serde::de::DeserializeOwned>(json: &str) -> Result<T, ApiError> {
    serde_json::from_str(json).map_err(|err| {
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "SERIALIZATION_ERROR",
            err.to_string(),
        )
    })
}
