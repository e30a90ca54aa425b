// crates/auditproof-store/src/metrics.rs
//
// MetricsAggregator: bounded sample windows for proof generation and
// verify-and-record.
//
// Each kind keeps its most recent `window` samples; older samples are
// evicted first. Statistics are derived on read and rounded to two
// decimals. Nothing is maintained incrementally.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use auditproof_core::error::AuditProofError;
use auditproof_core::metrics::{MetricKind, MetricSample};

use crate::snapshot::Snapshot;

/// Default number of samples retained per kind.
pub const DEFAULT_WINDOW: usize = 200;

/// Number of samples echoed back in `recent`.
const RECENT: usize = 10;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SampleWindows {
    #[serde(default)]
    proof_generation: VecDeque<MetricSample>,
    #[serde(default)]
    proof_verification: VecDeque<MetricSample>,
}

impl SampleWindows {
    fn window_mut(&mut self, kind: MetricKind) -> &mut VecDeque<MetricSample> {
        match kind {
            MetricKind::Generation => &mut self.proof_generation,
            MetricKind::Verification => &mut self.proof_verification,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationStats {
    pub count: usize,
    pub average_ms: f64,
    pub median_ms: f64,
    pub last: Option<MetricSample>,
    pub recent: Vec<MetricSample>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationStats {
    pub count: usize,
    pub average_gas: f64,
    pub median_gas: f64,
    pub median_latency_ms: f64,
    /// Percentage of successful samples.
    pub success_rate: f64,
    pub last: Option<MetricSample>,
    pub recent: Vec<MetricSample>,
}

/// Headline numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub proof_time_ms: f64,
    pub verify_gas: f64,
    pub success_rate: f64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsReport {
    pub proof_generation: GenerationStats,
    pub proof_verification: VerificationStats,
    pub summary: MetricsSummary,
}

#[derive(Debug)]
pub struct MetricsAggregator {
    window: usize,
    snapshot: Option<Snapshot>,
    samples: Mutex<SampleWindows>,
}

impl MetricsAggregator {
    pub fn in_memory(window: usize) -> Self {
        Self {
            window: window.max(1),
            snapshot: None,
            samples: Mutex::new(SampleWindows::default()),
        }
    }

    /// Open with persistence. A malformed snapshot is discarded with a
    /// warning and overwritten on the next record.
    pub async fn open(snapshot: Snapshot, window: usize) -> Self {
        let mut samples = match snapshot.load::<SampleWindows>().await {
            Ok(loaded) => loaded.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(
                    "Ignoring unreadable metrics snapshot {}: {}",
                    snapshot.path().display(),
                    e
                );
                SampleWindows::default()
            }
        };
        let window = window.max(1);
        trim(&mut samples.proof_generation, window);
        trim(&mut samples.proof_verification, window);
        Self {
            window,
            snapshot: Some(snapshot),
            samples: Mutex::new(samples),
        }
    }

    /// Append a sample, evicting the oldest of its kind beyond the window.
    /// The window is left as it was if the snapshot cannot be written.
    pub async fn record(&self, sample: MetricSample) -> Result<(), AuditProofError> {
        let mut samples = self.samples.lock().await;
        let kind = sample.kind;
        let mut staged = samples.window_mut(kind).clone();
        staged.push_back(sample);
        trim(&mut staged, self.window);
        let previous = std::mem::replace(samples.window_mut(kind), staged);

        if let Some(snapshot) = &self.snapshot {
            if let Err(e) = snapshot.save(&*samples).await {
                *samples.window_mut(kind) = previous;
                return Err(e);
            }
        }
        Ok(())
    }

    /// Number of retained samples of `kind`.
    pub async fn len(&self, kind: MetricKind) -> usize {
        self.samples.lock().await.window_mut(kind).len()
    }

    pub async fn report(&self) -> MetricsReport {
        let samples = self.samples.lock().await;
        let generation = &samples.proof_generation;
        let verification = &samples.proof_verification;

        let durations: Vec<f64> = generation.iter().filter_map(|s| s.duration_ms).collect();
        let gas: Vec<f64> = verification
            .iter()
            .filter_map(|s| s.gas_used.map(|g| g as f64))
            .collect();
        let latencies: Vec<f64> = verification.iter().filter_map(|s| s.latency_ms).collect();

        let proof_time = round2(median(&durations));
        let verify_gas = round2(median(&gas));
        let success = round2(success_rate(verification));

        let updated_at = verification
            .back()
            .or_else(|| generation.back())
            .map(|s| s.timestamp)
            .unwrap_or_else(Utc::now);

        MetricsReport {
            proof_generation: GenerationStats {
                count: generation.len(),
                average_ms: round2(mean(&durations)),
                median_ms: proof_time,
                last: generation.back().cloned(),
                recent: recent(generation),
            },
            proof_verification: VerificationStats {
                count: verification.len(),
                average_gas: round2(mean(&gas)),
                median_gas: verify_gas,
                median_latency_ms: round2(median(&latencies)),
                success_rate: success,
                last: verification.back().cloned(),
                recent: recent(verification),
            },
            summary: MetricsSummary {
                proof_time_ms: proof_time,
                verify_gas,
                success_rate: success,
                updated_at,
            },
        }
    }
}

fn trim(window: &mut VecDeque<MetricSample>, cap: usize) {
    while window.len() > cap {
        window.pop_front();
    }
}

fn recent(window: &VecDeque<MetricSample>) -> Vec<MetricSample> {
    let skip = window.len().saturating_sub(RECENT);
    window.iter().skip(skip).cloned().collect()
}

fn mean(values: &[f64]) -> f64 {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return 0.0;
    }
    finite.iter().sum::<f64>() / finite.len() as f64
}

fn median(values: &[f64]) -> f64 {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return 0.0;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn success_rate(window: &VecDeque<MetricSample>) -> f64 {
    if window.is_empty() {
        return 0.0;
    }
    let successes = window.iter().filter(|s| s.success).count();
    successes as f64 / window.len() as f64 * 100.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
