use crate::application::ports::RecordStore;
use crate::domain::entities::{CaptureDraft, CapturedRecord};
use crate::shared::error::AppError;
use std::sync::Arc;

const MAX_IMAGES_PER_CAPTURE: usize = 3;

/// Capture path. Validates and appends; never touches the network, so a
/// capture succeeds locally regardless of sync state.
pub struct CaptureService {
    store: Arc<dyn RecordStore>,
}

impl CaptureService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn capture(&self, draft: CaptureDraft) -> Result<CapturedRecord, AppError> {
        Self::validate(&draft)?;
        self.store.append(draft).await
    }

    /// Aggregate "pending uploads" counter shown to the capturing user.
    pub async fn pending_uploads(&self) -> Result<u32, AppError> {
        self.store.count_unsynced().await
    }

    fn validate(draft: &CaptureDraft) -> Result<(), AppError> {
        if draft.image_paths.is_empty() {
            return Err(AppError::InvalidInput(
                "a capture needs at least one image".to_string(),
            ));
        }
        if draft.image_paths.len() > MAX_IMAGES_PER_CAPTURE {
            return Err(AppError::InvalidInput(format!(
                "a capture carries at most {MAX_IMAGES_PER_CAPTURE} images"
            )));
        }
        if !draft.angle_labels.is_empty() && draft.angle_labels.len() != draft.image_paths.len() {
            return Err(AppError::InvalidInput(
                "angle labels must align with images".to_string(),
            ));
        }
        if draft.owner_id.trim().is_empty() {
            return Err(AppError::InvalidInput("owner id is required".to_string()));
        }
        for prediction in &draft.predictions {
            prediction
                .validate()
                .map_err(|err| AppError::ValidationError(err.to_string()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::{ConnectionPool, SqliteRecordStore};
    use chrono::Utc;
    use hl_types::{CaptureKind, Prediction};

    async fn setup() -> CaptureService {
        let pool = ConnectionPool::from_memory().await.unwrap();
        pool.migrate().await.unwrap();
        CaptureService::new(Arc::new(SqliteRecordStore::new(pool.get_pool().clone())))
    }

    fn draft() -> CaptureDraft {
        CaptureDraft {
            kind: CaptureKind::Scan,
            image_paths: vec!["/data/img/a.jpg".into()],
            angle_labels: vec![Some("Muzzle".into())],
            predictions: vec![Prediction {
                label: "Gir".into(),
                confidence: 0.9,
            }],
            owner_id: "flw-1".into(),
            owner_name: "Asha".into(),
            role: "flw".into(),
            geolocation: None,
            location_name: None,
            details: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn capture_appends_and_counts_pending() {
        let service = setup().await;

        service.capture(draft()).await.unwrap();

        assert_eq!(service.pending_uploads().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn capture_rejects_empty_image_list() {
        let service = setup().await;
        let mut empty = draft();
        empty.image_paths.clear();
        empty.angle_labels.clear();

        let result = service.capture(empty).await;

        assert!(matches!(result, Err(AppError::InvalidInput(_))));
        assert_eq!(service.pending_uploads().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn capture_rejects_more_than_three_images() {
        let service = setup().await;
        let mut oversized = draft();
        oversized.image_paths = (0..4).map(|i| format!("/data/img/{i}.jpg")).collect();
        oversized.angle_labels.clear();

        assert!(matches!(
            service.capture(oversized).await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn capture_rejects_misaligned_angle_labels() {
        let service = setup().await;
        let mut misaligned = draft();
        misaligned.angle_labels = vec![Some("Muzzle".into()), Some("Left".into())];

        assert!(matches!(
            service.capture(misaligned).await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn capture_rejects_invalid_prediction() {
        let service = setup().await;
        let mut invalid = draft();
        invalid.predictions[0].confidence = 1.4;

        assert!(matches!(
            service.capture(invalid).await,
            Err(AppError::ValidationError(_))
        ));
    }
}
