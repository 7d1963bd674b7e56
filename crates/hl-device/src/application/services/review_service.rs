use crate::application::ports::EvaluationGateway;
use crate::domain::review::EvaluationDecision;
use crate::shared::error::AppError;
use hl_types::wire::{
    ApproveRequest, DecisionResponse, PendingRunSummary, RejectRequest, RunDetail,
};
use std::sync::Arc;

/// Reviewer-side glue: fetches pending work and writes the terminal
/// decision a finished `EvaluationWorkflow` produced. The workflow value
/// itself is consumed here and discarded; it is not resumable.
pub struct ReviewService {
    gateway: Arc<dyn EvaluationGateway>,
}

impl ReviewService {
    pub fn new(gateway: Arc<dyn EvaluationGateway>) -> Self {
        Self { gateway }
    }

    pub async fn pending_runs(&self) -> Result<Vec<PendingRunSummary>, AppError> {
        self.gateway.pending_runs().await
    }

    pub async fn run_detail(&self, run_id: &str) -> Result<RunDetail, AppError> {
        self.gateway.run_detail(run_id).await
    }

    pub async fn submit_decision(
        &self,
        run_id: &str,
        image_url: &str,
        reviewer_id: &str,
        decision: EvaluationDecision,
    ) -> Result<DecisionResponse, AppError> {
        match decision {
            EvaluationDecision::Approved {
                final_label,
                quality,
                ..
            } => {
                self.gateway
                    .approve(ApproveRequest {
                        run_id: run_id.to_string(),
                        image_url: image_url.to_string(),
                        final_label,
                        quality,
                        reviewer_id: reviewer_id.to_string(),
                    })
                    .await
            }
            EvaluationDecision::Rejected { reason } => {
                self.gateway
                    .reject(RejectRequest {
                        run_id: run_id.to_string(),
                        image_url: image_url.to_string(),
                        reason,
                        reviewer_id: reviewer_id.to_string(),
                    })
                    .await
            }
        }
    }
}
