use super::mappers::record_from_row;
use super::rows::CaptureRecordRow;
use crate::application::ports::RecordStore;
use crate::domain::entities::{CaptureDraft, CapturedRecord};
use crate::domain::value_objects::{LocalRecordId, RemoteRunId};
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use hl_types::CaptureKind;
use sqlx::{Row, SqlitePool};

fn table_for(kind: CaptureKind) -> &'static str {
    match kind {
        CaptureKind::Scan => "scan_records",
        CaptureKind::Registration => "registration_records",
    }
}

pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Full capture history for one kind, oldest first. Backs the local
    /// history view; sync never uses it.
    pub async fn list_all(&self, kind: CaptureKind) -> Result<Vec<CapturedRecord>, AppError> {
        let query = format!(
            "SELECT * FROM {} ORDER BY created_at ASC, id ASC",
            table_for(kind)
        );
        let rows = sqlx::query_as::<_, CaptureRecordRow>(&query)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(|row| record_from_row(kind, row))
            .collect()
    }

    async fn fetch_by_id(
        &self,
        kind: CaptureKind,
        id: i64,
    ) -> Result<CapturedRecord, AppError> {
        let query = format!("SELECT * FROM {} WHERE id = ?1", table_for(kind));
        let row = sqlx::query_as::<_, CaptureRecordRow>(&query)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        record_from_row(kind, row)
    }

    async fn list_unsynced_for(
        &self,
        kind: CaptureKind,
    ) -> Result<Vec<CapturedRecord>, AppError> {
        let query = format!(
            "SELECT * FROM {} WHERE is_synced = 0 ORDER BY created_at ASC, id ASC",
            table_for(kind)
        );
        let rows = sqlx::query_as::<_, CaptureRecordRow>(&query)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(|row| record_from_row(kind, row))
            .collect()
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn append(&self, draft: CaptureDraft) -> Result<CapturedRecord, AppError> {
        let image_paths = serde_json::to_string(&draft.image_paths)?;
        let angle_labels = serde_json::to_string(&draft.angle_labels)?;
        let predictions = serde_json::to_string(&draft.predictions)?;
        let details = draft
            .details
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let query = format!(
            r#"
            INSERT INTO {} (
                owner_id, owner_name, role, image_paths, angle_labels,
                predictions, latitude, longitude, location_name, details,
                created_at, is_synced
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 0)
            "#,
            table_for(draft.kind)
        );
        let result = sqlx::query(&query)
            .bind(&draft.owner_id)
            .bind(&draft.owner_name)
            .bind(&draft.role)
            .bind(&image_paths)
            .bind(&angle_labels)
            .bind(&predictions)
            .bind(draft.geolocation.map(|g| g.latitude))
            .bind(draft.geolocation.map(|g| g.longitude))
            .bind(&draft.location_name)
            .bind(&details)
            .bind(draft.created_at.timestamp())
            .execute(&self.pool)
            .await?;

        self.fetch_by_id(draft.kind, result.last_insert_rowid())
            .await
    }

    async fn list_unsynced(&self) -> Result<Vec<CapturedRecord>, AppError> {
        let mut records = self.list_unsynced_for(CaptureKind::Scan).await?;
        records.extend(self.list_unsynced_for(CaptureKind::Registration).await?);
        records.sort_by_key(|record| (record.created_at, record.record_id.value()));
        Ok(records)
    }

    async fn mark_synced(
        &self,
        kind: CaptureKind,
        record_id: LocalRecordId,
        remote_id: &RemoteRunId,
    ) -> Result<(), AppError> {
        // The `is_synced = 0` predicate makes the transition monotonic:
        // a second call is a no-op and nothing ever flips a row back.
        let query = format!(
            r#"
            UPDATE {}
            SET is_synced = 1, remote_id = ?2, synced_at = ?3
            WHERE id = ?1 AND is_synced = 0
            "#,
            table_for(kind)
        );
        sqlx::query(&query)
            .bind(record_id.value())
            .bind(remote_id.as_str())
            .bind(Utc::now().timestamp())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn count_unsynced(&self) -> Result<u32, AppError> {
        let mut total: i64 = 0;
        for kind in [CaptureKind::Scan, CaptureKind::Registration] {
            let query = format!(
                "SELECT COUNT(*) as count FROM {} WHERE is_synced = 0",
                table_for(kind)
            );
            let row = sqlx::query(&query).fetch_one(&self.pool).await?;
            total += row.try_get::<i64, _>("count").unwrap_or(0);
        }
        Ok(total as u32)
    }
}
