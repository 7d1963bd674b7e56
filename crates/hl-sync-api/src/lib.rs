use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use hl_core::{config, db, http, logging, server};
use serde::Serialize;
use serde_json::Value;
use sqlx::{Pool, Sqlite};
use std::path::PathBuf;
use std::sync::Arc;
use utoipa::OpenApi;

mod blob;
mod ingest;


pub use blob::{BlobStore, FsBlobStore};

const SERVICE_NAME: &str = "hl-sync-api";

#[derive(Clone)]
pub struct AppState {
    pub(crate) pool: Pool<Sqlite>,
    pub(crate) blob_store: Arc<dyn BlobStore>,
}

impl AppState {
    pub fn new(pool: Pool<Sqlite>, blob_store: Arc<dyn BlobStore>) -> Self {
        Self { pool, blob_store }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    code: &'static str,
    message: String,
    details: Option<Value>,
}

#[derive(Debug)]
pub(crate) struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    details: Option<Value>,
}

impl ApiError {
    pub(crate) fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            details: None,
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "DB_ERROR", err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let payload = ErrorResponse {
            code: self.code,
            message: self.message,
            details: self.details,
        };
        (self.status, Json(payload)).into_response()
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize, utoipa::ToSchema)]
struct HealthStatus {
    status: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(healthz, ingest::sync_scan, ingest::sync_registration),
    components(schemas(
        HealthStatus,
        hl_types::Prediction,
        hl_types::wire::SyncRecordRequest,
        hl_types::wire::SyncRecordResponse,
    )),
    tags(
        (name = "health", description = "Service health"),
        (name = "sync", description = "Idempotent capture ingestion")
    )
)]
struct ApiDoc;

pub struct SyncApiConfig {
    pub addr: std::net::SocketAddr,
    pub database_url: String,
    pub blob_dir: PathBuf,
}

pub fn load_config() -> Result<SyncApiConfig> {
    let addr = config::socket_addr_from_env("SYNC_API_ADDR", "0.0.0.0:8080")?;
    let database_url = config::required_env("DATABASE_URL")?;
    let blob_dir = PathBuf::from(config::env_or("BLOB_DIR", "data/media"));
    Ok(SyncApiConfig {
        addr,
        database_url,
        blob_dir,
    })
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/v1/openapi.json", get(openapi_json))
        .route("/sync/scan", post(ingest::sync_scan))
        .route("/sync/registration", post(ingest::sync_registration))
        .with_state(state)
}

pub async fn run(config: SyncApiConfig) -> Result<()> {
    logging::init(SERVICE_NAME);
    let pool = db::connect(&config.database_url).await?;
    hl_core::migrations::run(&pool).await?;
    let blob_store: Arc<dyn BlobStore> = Arc::new(FsBlobStore::new(config.blob_dir)?);
    let state = AppState::new(pool, blob_store);

    let router = http::apply_standard_layers(router(state), SERVICE_NAME);
    server::serve(config.addr, router).await
}

#[utoipa::path(
    get,
    path = "/healthz",
    tag = "health",
    responses((status = 200, description = "Ready", body = HealthStatus))
)]
async fn healthz(State(state): State<AppState>) -> impl IntoResponse {
    match db::check_ready(&state.pool).await {
        Ok(_) => (StatusCode::OK, Json(HealthStatus { status: "ok".into() })),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthStatus {
                status: "unavailable".into(),
            }),
        ),
    }
}

async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
