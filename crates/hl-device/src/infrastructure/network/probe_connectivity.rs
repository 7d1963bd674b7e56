use crate::application::ports::Connectivity;
use async_trait::async_trait;
use std::time::Duration;

/// Connectivity check against the sync service's health endpoint. Any
/// failure (DNS, timeout, non-2xx) reads as offline; the next trigger will
/// probe again.
pub struct ProbeConnectivity {
    client: reqwest::Client,
    health_url: String,
}

impl ProbeConnectivity {
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_default();
        Self {
            client,
            health_url: format!("{}/healthz", base_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl Connectivity for ProbeConnectivity {
    async fn is_online(&self) -> bool {
        match self.client.get(&self.health_url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
