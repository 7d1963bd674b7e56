mod http_evaluation_gateway;
mod http_sync_gateway;
mod probe_connectivity;

pub use http_evaluation_gateway::HttpEvaluationGateway;
pub use http_sync_gateway::HttpSyncGateway;
pub use probe_connectivity::ProbeConnectivity;
