// crates/auditproof-rpc/src/handlers/metrics.rs
//
// Metrics handler: GetMetrics.

use serde::{Deserialize, Serialize};

use auditproof_core::error::AuditProofError;
use auditproof_store::{MetricsAggregator, MetricsReport};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetMetricsRequest {}

pub async fn handle_get_metrics(
    metrics: &MetricsAggregator,
    _request: GetMetricsRequest,
) -> Result<MetricsReport, AuditProofError> {
    Ok(metrics.report().await)
}
