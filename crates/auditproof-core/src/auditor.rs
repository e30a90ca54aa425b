// crates/auditproof-core/src/auditor.rs

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AuditProofError;
use crate::types::Address;

/// On-chain admission record for an auditor.
///
/// `credential_count` only grows, and only through the credential ledger.
/// `credibility_score` can only be written while `is_approved` is true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Auditor {
    pub address: Address,
    pub is_approved: bool,
    pub github_handle: String,
    pub code4rena_handle: String,
    pub immunefi_handle: String,
    pub credential_count: u64,
    pub credibility_score: u64,
    /// Time of the most recent approval.
    pub approved_at: Option<DateTime<Utc>>,
}

impl Auditor {
    /// The record returned for an address the registry has never seen.
    pub fn unknown(address: Address) -> Self {
        Self {
            address,
            is_approved: false,
            github_handle: String::new(),
            code4rena_handle: String::new(),
            immunefi_handle: String::new(),
            credential_count: 0,
            credibility_score: 0,
            approved_at: None,
        }
    }
}

/// Review lifecycle of an off-chain auditor application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplicationStatus::Pending => write!(f, "pending"),
            ApplicationStatus::Approved => write!(f, "approved"),
            ApplicationStatus::Rejected => write!(f, "rejected"),
        }
    }
}

impl FromStr for ApplicationStatus {
    type Err = AuditProofError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ApplicationStatus::Pending),
            "approved" => Ok(ApplicationStatus::Approved),
            "rejected" => Ok(ApplicationStatus::Rejected),
            other => Err(AuditProofError::Validation(format!(
                "Unknown application status: {}",
                other
            ))),
        }
    }
}

/// Off-chain review record for an address requesting auditor status.
///
/// A best-effort mirror of on-chain approval state, keyed by the
/// lower-cased wallet address. Never authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub wallet_address: Address,
    pub status: ApplicationStatus,
    pub submitted_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<String>,
}

impl Application {
    /// A fresh pending application.
    pub fn pending(wallet_address: Address, submitted_at: DateTime<Utc>) -> Self {
        Self {
            wallet_address,
            status: ApplicationStatus::Pending,
            submitted_at,
            reviewed_at: None,
            reviewed_by: None,
        }
    }
}
