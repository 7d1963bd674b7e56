use sqlx::FromRow;

/// Raw row shape shared by the two capture tables; JSON columns are kept as
/// text and decoded by the mapper.
#[derive(Debug, Clone, FromRow)]
pub struct CaptureRecordRow {
    pub id: i64,
    pub owner_id: String,
    pub owner_name: String,
    pub role: String,
    pub image_paths: String,
    pub angle_labels: String,
    pub predictions: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_name: Option<String>,
    pub details: Option<String>,
    pub created_at: i64,
    pub is_synced: bool,
    pub remote_id: Option<String>,
    pub synced_at: Option<i64>,
}
