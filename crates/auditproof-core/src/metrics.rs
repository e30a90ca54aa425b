// crates/auditproof-core/src/metrics.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which pipeline stage a metric sample describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// Proof generation (latency in milliseconds).
    Generation,
    /// Verify-and-record (gas used and end-to-end latency).
    Verification,
}

/// A single latency / cost / success observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSample {
    pub kind: MetricKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_used: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<f64>,
    pub success: bool,
    pub timestamp: DateTime<Utc>,
}

impl MetricSample {
    /// A proof-generation sample.
    pub fn generation(duration_ms: f64, success: bool) -> Self {
        Self {
            kind: MetricKind::Generation,
            duration_ms: Some(duration_ms),
            gas_used: None,
            latency_ms: None,
            success,
            timestamp: Utc::now(),
        }
    }

    /// A verify-and-record sample. `gas_used` is absent when the transaction
    /// never produced a receipt.
    pub fn verification(gas_used: Option<u64>, latency_ms: f64, success: bool) -> Self {
        Self {
            kind: MetricKind::Verification,
            duration_ms: None,
            gas_used,
            latency_ms: Some(latency_ms),
            success,
            timestamp: Utc::now(),
        }
    }
}
