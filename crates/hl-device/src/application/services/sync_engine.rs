use crate::application::ports::{Connectivity, ImageSource, ReadImage, RecordStore, SyncGateway};
use crate::domain::entities::CapturedRecord;
use crate::shared::error::AppError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncStatus {
    pub is_syncing: bool,
    pub last_sync: Option<i64>,
    pub sync_errors: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub synced: u32,
    pub failed: u32,
    pub skipped: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// A pass ran to the end of the queue.
    Completed(SyncReport),
    /// Another pass holds the guard; this trigger is dropped, not queued.
    AlreadyRunning,
    /// Device offline; nothing attempted.
    Offline,
}

/// Drains the derived pending queue. One logical worker per device: the
/// guard admits a single pass at a time, and a trigger that arrives
/// mid-pass is a no-op that relies on the next trigger.
pub struct SyncEngine {
    store: Arc<dyn RecordStore>,
    connectivity: Arc<dyn Connectivity>,
    images: Arc<dyn ImageSource>,
    gateway: Arc<dyn SyncGateway>,
    status: Arc<RwLock<SyncStatus>>,
}

impl SyncEngine {
    pub fn new(
        store: Arc<dyn RecordStore>,
        connectivity: Arc<dyn Connectivity>,
        images: Arc<dyn ImageSource>,
        gateway: Arc<dyn SyncGateway>,
    ) -> Self {
        Self {
            store,
            connectivity,
            images,
            gateway,
            status: Arc::new(RwLock::new(SyncStatus {
                is_syncing: false,
                last_sync: None,
                sync_errors: 0,
            })),
        }
    }

    /// Entry point for every trigger: app start, connectivity restored,
    /// record appended while online.
    pub async fn trigger_sync(&self) -> Result<SyncOutcome, AppError> {
        {
            let mut status = self.status.write().await;
            if status.is_syncing {
                return Ok(SyncOutcome::AlreadyRunning);
            }
            status.is_syncing = true;
        }

        let result = self.run_pass().await;

        let mut status = self.status.write().await;
        status.is_syncing = false;
        match &result {
            Ok(SyncOutcome::Completed(report)) => {
                status.last_sync = Some(chrono::Utc::now().timestamp());
                status.sync_errors += report.failed;
            }
            Ok(_) => {}
            Err(_) => {
                status.sync_errors += 1;
            }
        }

        result
    }

    pub async fn status(&self) -> SyncStatus {
        self.status.read().await.clone()
    }

    async fn run_pass(&self) -> Result<SyncOutcome, AppError> {
        if !self.connectivity.is_online().await {
            return Ok(SyncOutcome::Offline);
        }

        let mut report = SyncReport::default();
        for record in self.store.list_unsynced().await? {
            match self.sync_record(&record).await {
                Ok(true) => report.synced += 1,
                Ok(false) => {
                    // No readable image; the record stays queued for a
                    // later pass.
                    report.skipped += 1;
                }
                Err(err) => {
                    tracing::warn!(
                        record_id = %record.record_id,
                        kind = %record.kind,
                        error = %err,
                        "sync attempt failed, leaving record unsynced"
                    );
                    report.failed += 1;
                }
            }
        }

        Ok(SyncOutcome::Completed(report))
    }

    async fn sync_record(&self, record: &CapturedRecord) -> Result<bool, AppError> {
        let mut images = Vec::new();
        for (index, path) in record.image_paths.iter().enumerate() {
            match self.images.read(path).await {
                Ok(bytes) => images.push(ReadImage {
                    bytes,
                    angle_label: record.angle_label(index).map(str::to_string),
                }),
                Err(err) => {
                    tracing::warn!(
                        record_id = %record.record_id,
                        path = %path,
                        error = %err,
                        "skipping unreadable image"
                    );
                }
            }
        }

        if images.is_empty() {
            return Ok(false);
        }

        let ack = self.gateway.submit(record, images).await?;
        self.store
            .mark_synced(record.kind, record.record_id, &ack.remote_id)
            .await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::CaptureDraft;
    use crate::domain::value_objects::{RemoteRunId, SyncState};
    use crate::infrastructure::database::{ConnectionPool, SqliteRecordStore};
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use hl_types::{CaptureKind, Prediction};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::sync::Mutex;

    struct FakeConnectivity {
        online: AtomicBool,
    }

    impl FakeConnectivity {
        fn new(online: bool) -> Self {
            Self {
                online: AtomicBool::new(online),
            }
        }
    }

    #[async_trait]
    impl Connectivity for FakeConnectivity {
        async fn is_online(&self) -> bool {
            self.online.load(Ordering::SeqCst)
        }
    }

    struct MapImageSource {
        files: HashMap<String, Vec<u8>>,
    }

    #[async_trait]
    impl ImageSource for MapImageSource {
        async fn read(&self, path: &str) -> Result<Vec<u8>, AppError> {
            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| AppError::Storage(format!("unreadable: {path}")))
        }
    }

    struct RecordingGateway {
        counter: AtomicU64,
        submissions: Mutex<Vec<(i64, usize)>>,
        fail_owner_ids: Vec<String>,
        delay_ms: u64,
    }

    impl RecordingGateway {
        fn new() -> Self {
            Self {
                counter: AtomicU64::new(1),
                submissions: Mutex::new(Vec::new()),
                fail_owner_ids: Vec::new(),
                delay_ms: 0,
            }
        }

        fn failing_for(owner_id: &str) -> Self {
            Self {
                fail_owner_ids: vec![owner_id.to_string()],
                ..Self::new()
            }
        }

        fn with_delay(delay_ms: u64) -> Self {
            Self {
                delay_ms,
                ..Self::new()
            }
        }

        fn submissions(&self) -> Vec<(i64, usize)> {
            self.submissions.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SyncGateway for RecordingGateway {
        async fn submit(
            &self,
            record: &CapturedRecord,
            images: Vec<ReadImage>,
        ) -> Result<SyncAck, AppError> {
            if self.delay_ms > 0 {
                tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
            }
            if self.fail_owner_ids.contains(&record.owner_id) {
                return Err(AppError::Network("server unreachable".to_string()));
            }
            self.submissions
                .lock()
                .unwrap()
                .push((record.record_id.value(), images.len()));
            let seq = self.counter.fetch_add(1, Ordering::SeqCst);
            Ok(SyncAck {
                remote_id: RemoteRunId::new(format!("run-{seq}")).unwrap(),
                image_urls: (0..images.len()).map(|i| format!("/media/{seq}-{i}.jpg")).collect(),
                synced_at: Utc::now(),
            })
        }
    }

    use crate::application::ports::SyncAck;

    fn draft(owner_id: &str, paths: Vec<&str>, age_secs: i64) -> CaptureDraft {
        CaptureDraft {
            kind: CaptureKind::Scan,
            image_paths: paths.iter().map(|p| p.to_string()).collect(),
            angle_labels: Vec::new(),
            predictions: vec![Prediction {
                label: "Gir".into(),
                confidence: 0.8,
            }],
            owner_id: owner_id.into(),
            owner_name: "Asha".into(),
            role: "flw".into(),
            geolocation: None,
            location_name: None,
            details: None,
            created_at: Utc::now() - Duration::seconds(age_secs),
        }
    }

    async fn setup_store() -> Arc<SqliteRecordStore> {
        let pool = ConnectionPool::from_memory().await.unwrap();
        pool.migrate().await.unwrap();
        Arc::new(SqliteRecordStore::new(pool.get_pool().clone()))
    }

    fn engine(
        store: Arc<SqliteRecordStore>,
        connectivity: FakeConnectivity,
        images: MapImageSource,
        gateway: Arc<RecordingGateway>,
    ) -> SyncEngine {
        SyncEngine::new(store, Arc::new(connectivity), Arc::new(images), gateway)
    }

    fn image_map(entries: &[(&str, &[u8])]) -> MapImageSource {
        MapImageSource {
            files: entries
                .iter()
                .map(|(path, bytes)| (path.to_string(), bytes.to_vec()))
                .collect(),
        }
    }

    #[tokio::test]
    async fn three_offline_records_sync_on_one_trigger_with_distinct_remote_ids() {
        let store = setup_store().await;
        for (i, age) in [30, 20, 10].iter().enumerate() {
            let path = format!("/img/{i}.jpg");
            store
                .append(draft("flw-1", vec![path.as_str()], *age))
                .await
                .unwrap();
        }
        let images = image_map(&[
            ("/img/0.jpg", b"a"),
            ("/img/1.jpg", b"b"),
            ("/img/2.jpg", b"c"),
        ]);
        let gateway = Arc::new(RecordingGateway::new());
        let engine = engine(store.clone(), FakeConnectivity::new(true), images, gateway.clone());

        let outcome = engine.trigger_sync().await.unwrap();

        assert_eq!(
            outcome,
            SyncOutcome::Completed(SyncReport {
                synced: 3,
                failed: 0,
                skipped: 0,
            })
        );
        assert!(store.list_unsynced().await.unwrap().is_empty());
        assert_eq!(store.count_unsynced().await.unwrap(), 0);

        let remote_ids: Vec<String> = store
            .list_all(CaptureKind::Scan)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.remote_id.unwrap().as_str().to_string())
            .collect();
        assert_eq!(remote_ids.len(), 3);
        let mut deduped = remote_ids.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), 3, "remote ids must be distinct");
    }

    #[tokio::test]
    async fn records_are_submitted_oldest_first() {
        let store = setup_store().await;
        store.append(draft("flw-1", vec!["/img/new.jpg"], 5)).await.unwrap();
        let oldest = store.append(draft("flw-1", vec!["/img/old.jpg"], 500)).await.unwrap();
        let images = image_map(&[("/img/new.jpg", b"n"), ("/img/old.jpg", b"o")]);
        let gateway = Arc::new(RecordingGateway::new());
        let engine = engine(store, FakeConnectivity::new(true), images, gateway.clone());

        engine.trigger_sync().await.unwrap();

        let submissions = gateway.submissions();
        assert_eq!(submissions.len(), 2);
        assert_eq!(submissions[0].0, oldest.record_id.value());
    }

    #[tokio::test]
    async fn offline_trigger_is_a_noop() {
        let store = setup_store().await;
        store.append(draft("flw-1", vec!["/img/a.jpg"], 10)).await.unwrap();
        let gateway = Arc::new(RecordingGateway::new());
        let engine = engine(
            store.clone(),
            FakeConnectivity::new(false),
            image_map(&[("/img/a.jpg", b"a")]),
            gateway.clone(),
        );

        let outcome = engine.trigger_sync().await.unwrap();

        assert_eq!(outcome, SyncOutcome::Offline);
        assert!(gateway.submissions().is_empty());
        assert_eq!(store.count_unsynced().await.unwrap(), 1);
        assert!(!engine.status().await.is_syncing);
    }

    #[tokio::test]
    async fn concurrent_triggers_admit_exactly_one_pass() {
        let store = setup_store().await;
        store.append(draft("flw-1", vec!["/img/a.jpg"], 10)).await.unwrap();
        let gateway = Arc::new(RecordingGateway::with_delay(100));
        let engine = Arc::new(engine(
            store,
            FakeConnectivity::new(true),
            image_map(&[("/img/a.jpg", b"a")]),
            gateway.clone(),
        ));

        let first = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.trigger_sync().await.unwrap() })
        };
        // Let the first pass take the guard and park inside the gateway.
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        let second = engine.trigger_sync().await.unwrap();

        assert_eq!(second, SyncOutcome::AlreadyRunning);
        let first = first.await.unwrap();
        assert_eq!(
            first,
            SyncOutcome::Completed(SyncReport {
                synced: 1,
                failed: 0,
                skipped: 0,
            })
        );
        // One set of network calls, not two.
        assert_eq!(gateway.submissions().len(), 1);
    }

    #[tokio::test]
    async fn record_with_no_readable_image_is_skipped_and_stays_queued() {
        let store = setup_store().await;
        store.append(draft("flw-1", vec!["/img/gone.jpg"], 20)).await.unwrap();
        let readable = store.append(draft("flw-1", vec!["/img/ok.jpg"], 10)).await.unwrap();
        let gateway = Arc::new(RecordingGateway::new());
        let engine = engine(
            store.clone(),
            FakeConnectivity::new(true),
            image_map(&[("/img/ok.jpg", b"ok")]),
            gateway.clone(),
        );

        let outcome = engine.trigger_sync().await.unwrap();

        assert_eq!(
            outcome,
            SyncOutcome::Completed(SyncReport {
                synced: 1,
                failed: 0,
                skipped: 1,
            })
        );
        let unsynced = store.list_unsynced().await.unwrap();
        assert_eq!(unsynced.len(), 1);
        assert_ne!(unsynced[0].record_id, readable.record_id);
    }

    #[tokio::test]
    async fn partially_readable_record_is_submitted_with_readable_subset() {
        let store = setup_store().await;
        store
            .append(draft("flw-1", vec!["/img/kept.jpg", "/img/lost.jpg"], 10))
            .await
            .unwrap();
        let gateway = Arc::new(RecordingGateway::new());
        let engine = engine(
            store.clone(),
            FakeConnectivity::new(true),
            image_map(&[("/img/kept.jpg", b"kept")]),
            gateway.clone(),
        );

        engine.trigger_sync().await.unwrap();

        let submissions = gateway.submissions();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].1, 1, "only the readable image is sent");
        assert_eq!(store.count_unsynced().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn gateway_failure_for_one_record_does_not_abort_the_pass() {
        let store = setup_store().await;
        store.append(draft("flw-down", vec!["/img/a.jpg"], 20)).await.unwrap();
        store.append(draft("flw-up", vec!["/img/b.jpg"], 10)).await.unwrap();
        let gateway = Arc::new(RecordingGateway::failing_for("flw-down"));
        let engine = engine(
            store.clone(),
            FakeConnectivity::new(true),
            image_map(&[("/img/a.jpg", b"a"), ("/img/b.jpg", b"b")]),
            gateway.clone(),
        );

        let outcome = engine.trigger_sync().await.unwrap();

        assert_eq!(
            outcome,
            SyncOutcome::Completed(SyncReport {
                synced: 1,
                failed: 1,
                skipped: 0,
            })
        );
        assert_eq!(store.count_unsynced().await.unwrap(), 1);
        assert_eq!(engine.status().await.sync_errors, 1);
    }

    #[tokio::test]
    async fn failed_record_is_not_retried_until_the_next_trigger() {
        let store = setup_store().await;
        store.append(draft("flw-down", vec!["/img/a.jpg"], 10)).await.unwrap();
        let gateway = Arc::new(RecordingGateway::failing_for("flw-down"));
        let engine = engine(
            store.clone(),
            FakeConnectivity::new(true),
            image_map(&[("/img/a.jpg", b"a")]),
            gateway.clone(),
        );

        engine.trigger_sync().await.unwrap();
        assert_eq!(store.count_unsynced().await.unwrap(), 1);

        // Best-effort semantics: no background retry happened; only an
        // explicit second trigger attempts the record again.
        engine.trigger_sync().await.unwrap();
        assert_eq!(engine.status().await.sync_errors, 2);
    }

    #[tokio::test]
    async fn synced_records_stay_synced_across_further_triggers() {
        let store = setup_store().await;
        let record = store.append(draft("flw-1", vec!["/img/a.jpg"], 10)).await.unwrap();
        let gateway = Arc::new(RecordingGateway::new());
        let engine = engine(
            store.clone(),
            FakeConnectivity::new(true),
            image_map(&[("/img/a.jpg", b"a")]),
            gateway.clone(),
        );

        engine.trigger_sync().await.unwrap();
        engine.trigger_sync().await.unwrap();
        engine.trigger_sync().await.unwrap();

        assert_eq!(gateway.submissions().len(), 1);
        let rows = store.list_all(CaptureKind::Scan).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].record_id, record.record_id);
        assert_eq!(rows[0].sync_state, SyncState::Synced);
        assert_eq!(rows[0].remote_id.as_ref().unwrap().as_str(), "run-1");
    }
}
