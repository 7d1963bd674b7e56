mod capture_service;
mod review_service;
mod sync_engine;

pub use capture_service::CaptureService;
pub use review_service::ReviewService;
pub use sync_engine::{SyncEngine, SyncOutcome, SyncReport, SyncStatus};
