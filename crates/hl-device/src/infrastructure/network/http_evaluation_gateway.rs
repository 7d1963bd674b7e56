use crate::application::ports::EvaluationGateway;
use crate::shared::error::AppError;
use async_trait::async_trait;
use hl_types::wire::{
    ApproveRequest, DecisionResponse, PendingRunSummary, RejectRequest, RunDetail,
};

pub struct HttpEvaluationGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpEvaluationGateway {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn check_status(status: reqwest::StatusCode, context: &str) -> Result<(), AppError> {
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(context.to_string()));
        }
        if !status.is_success() {
            return Err(AppError::Network(format!("{context} returned {status}")));
        }
        Ok(())
    }
}

#[async_trait]
impl EvaluationGateway for HttpEvaluationGateway {
    async fn pending_runs(&self) -> Result<Vec<PendingRunSummary>, AppError> {
        let url = format!("{}/evaluations/pending", self.base_url);
        let response = self.client.get(&url).send().await?;
        Self::check_status(response.status(), "pending evaluations")?;
        Ok(response.json().await?)
    }

    async fn run_detail(&self, run_id: &str) -> Result<RunDetail, AppError> {
        let url = format!("{}/evaluations/run/{run_id}", self.base_url);
        let response = self.client.get(&url).send().await?;
        Self::check_status(response.status(), "run detail")?;
        Ok(response.json().await?)
    }

    async fn approve(&self, request: ApproveRequest) -> Result<DecisionResponse, AppError> {
        let url = format!("{}/evaluations/approve", self.base_url);
        let response = self.client.post(&url).json(&request).send().await?;
        Self::check_status(response.status(), "approve")?;
        Ok(response.json().await?)
    }

    async fn reject(&self, request: RejectRequest) -> Result<DecisionResponse, AppError> {
        let url = format!("{}/evaluations/reject", self.base_url);
        let response = self.client.post(&url).json(&request).send().await?;
        Self::check_status(response.status(), "reject")?;
        Ok(response.json().await?)
    }
}
