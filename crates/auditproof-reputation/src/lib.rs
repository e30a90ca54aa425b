// crates/auditproof-reputation/src/lib.rs
//
// auditproof-reputation: credibility scoring for newly approved auditors.
//
// The finalizer asks a ReputationSource for a score after an approval; a
// positive score is written to the registry with updateCredibilityScore.
// Scoring is best-effort: a failing source never blocks finalization.

pub mod handles;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use auditproof_core::auditor::Auditor;
use auditproof_core::error::AuditProofError;
use auditproof_core::types::Address;

pub use handles::{HandleReputation, HandleWeights};

/// The inputs a reputation source scores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditorProfile {
    pub address: Address,
    pub github_handle: String,
    pub code4rena_handle: String,
    pub immunefi_handle: String,
    pub credential_count: u64,
}

impl From<&Auditor> for AuditorProfile {
    fn from(auditor: &Auditor) -> Self {
        Self {
            address: auditor.address,
            github_handle: auditor.github_handle.clone(),
            code4rena_handle: auditor.code4rena_handle.clone(),
            immunefi_handle: auditor.immunefi_handle.clone(),
            credential_count: auditor.credential_count,
        }
    }
}

/// One contribution to a credibility score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    pub source: String,
    pub detail: String,
    pub points: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reputation {
    pub address: Address,
    pub credibility_score: u64,
    pub signals: Vec<Signal>,
}

/// A collaborator that computes an auditor's credibility from external
/// signals.
#[async_trait]
pub trait ReputationSource: Send + Sync {
    async fn reputation(&self, profile: &AuditorProfile) -> Result<Reputation, AuditProofError>;
}
