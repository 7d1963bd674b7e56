use crate::domain::entities::{CaptureDraft, CapturedRecord};
use crate::domain::value_objects::{LocalRecordId, RemoteRunId};
use crate::shared::error::AppError;
use async_trait::async_trait;
use hl_types::CaptureKind;

/// Durable on-device store of captured records. Append-only plus one
/// monotonic state transition per row; there is no update or delete.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Inserts a new record with `SyncState::Unsynced`. Atomic: readers
    /// never observe a partial row.
    async fn append(&self, draft: CaptureDraft) -> Result<CapturedRecord, AppError>;

    /// All unsynced records across both capture kinds, oldest first by
    /// creation timestamp. This derived view is the pending queue.
    async fn list_unsynced(&self) -> Result<Vec<CapturedRecord>, AppError>;

    /// Transitions a row to `Synced` and stores the remote id. Idempotent;
    /// a row that is already synced is left untouched.
    async fn mark_synced(
        &self,
        kind: CaptureKind,
        record_id: LocalRecordId,
        remote_id: &RemoteRunId,
    ) -> Result<(), AppError>;

    async fn count_unsynced(&self) -> Result<u32, AppError>;
}
