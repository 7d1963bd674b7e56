mod record_id;
mod remote_run_id;
mod sync_state;

pub use record_id::LocalRecordId;
pub use remote_run_id::RemoteRunId;
pub use sync_state::SyncState;
