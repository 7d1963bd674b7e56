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
use utoipa::OpenApi;

mod decisions;
mod engine;


const SERVICE_NAME: &str = "hl-eval-api";

#[derive(Clone)]
pub struct AppState {
    pub(crate) pool: Pool<Sqlite>,
}

impl AppState {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
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

    pub(crate) fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
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
    paths(
        healthz,
        engine::pending_runs,
        engine::run_detail,
        decisions::approve,
        decisions::reject,
    ),
    components(schemas(
        HealthStatus,
        hl_types::Prediction,
        hl_types::QualityChecks,
        hl_types::Disposition,
        hl_types::wire::PendingRunSummary,
        hl_types::wire::RunDetail,
        hl_types::wire::RunImageStatus,
        hl_types::wire::ApproveRequest,
        hl_types::wire::RejectRequest,
        hl_types::wire::DecisionResponse,
    )),
    tags(
        (name = "health", description = "Service health"),
        (name = "evaluations", description = "Per-image review workflow")
    )
)]
struct ApiDoc;

pub struct EvalApiConfig {
    pub addr: std::net::SocketAddr,
    pub database_url: String,
}

pub fn load_config() -> Result<EvalApiConfig> {
    let addr = config::socket_addr_from_env("EVAL_API_ADDR", "0.0.0.0:8081")?;
    let database_url = config::required_env("DATABASE_URL")?;
    Ok(EvalApiConfig { addr, database_url })
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/v1/openapi.json", get(openapi_json))
        .route("/evaluations/pending", get(engine::pending_runs))
        .route("/evaluations/run/{run_id}", get(engine::run_detail))
        .route("/evaluations/approve", post(decisions::approve))
        .route("/evaluations/reject", post(decisions::reject))
        .with_state(state)
}

pub async fn run(config: EvalApiConfig) -> Result<()> {
    logging::init(SERVICE_NAME);
    let pool = db::connect(&config.database_url).await?;
    hl_core::migrations::run(&pool).await?;
    let state = AppState::new(pool);

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
