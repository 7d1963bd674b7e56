use crate::shared::error::AppError;
use async_trait::async_trait;
use hl_types::wire::{
    ApproveRequest, DecisionResponse, PendingRunSummary, RejectRequest, RunDetail,
};

/// Client for the evaluation service used by the reviewer flow.
#[async_trait]
pub trait EvaluationGateway: Send + Sync {
    async fn pending_runs(&self) -> Result<Vec<PendingRunSummary>, AppError>;
    async fn run_detail(&self, run_id: &str) -> Result<RunDetail, AppError>;
    async fn approve(&self, request: ApproveRequest) -> Result<DecisionResponse, AppError>;
    async fn reject(&self, request: RejectRequest) -> Result<DecisionResponse, AppError>;
}
