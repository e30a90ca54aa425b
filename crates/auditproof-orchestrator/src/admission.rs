// crates/auditproof-orchestrator/src/admission.rs
//
// AdmissionService: approve, reject, and list auditor applications.
//
// Approval is the only path that touches the chain. It returns as soon as
// the approval transaction is accepted; confirmation, reputation, the
// credibility credential, and the score update all happen in the Finalizer.
// The Application store is marked `approved` optimistically and is never
// authoritative.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use auditproof_core::auditor::{Application, ApplicationStatus};
use auditproof_core::chain::ContractCall;
use auditproof_core::error::AuditProofError;
use auditproof_core::types::{Address, TxHash};
use auditproof_store::ApplicationStore;

use crate::finalizer::{FinalizeJob, FinalizerHandle};
use crate::signing::SigningContext;

/// Reviewer identity stamped on applications reviewed through this service.
pub const ADMIN_REVIEWER: &str = "admin";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveRequest {
    #[serde(default)]
    pub auditor_address: String,
    #[serde(default)]
    pub github_handle: Option<String>,
    #[serde(default)]
    pub code4rena_handle: Option<String>,
    #[serde(default)]
    pub immunefi_handle: Option<String>,
}

/// The auditor as reported back to the approving admin. The score is not
/// known yet; it is computed in the background.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovedAuditor {
    pub address: Address,
    pub is_approved: bool,
    pub credibility_score: Option<u64>,
    pub credential_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveResponse {
    pub auditor: ApprovedAuditor,
    pub tx_hash: TxHash,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationList {
    pub count: usize,
    pub applications: Vec<Application>,
}

pub struct AdmissionService {
    signer: Arc<SigningContext>,
    applications: Arc<ApplicationStore>,
    finalizer: Option<FinalizerHandle>,
}

impl AdmissionService {
    pub fn new(signer: Arc<SigningContext>, applications: Arc<ApplicationStore>) -> Self {
        Self {
            signer,
            applications,
            finalizer: None,
        }
    }

    /// Hand every accepted approval to `finalizer`.
    pub fn with_finalizer(mut self, finalizer: FinalizerHandle) -> Self {
        self.finalizer = Some(finalizer);
        self
    }

    pub fn applications(&self) -> &Arc<ApplicationStore> {
        &self.applications
    }

    /// Approve an auditor on-chain.
    ///
    /// Fails fast on a malformed or already approved address. Never waits
    /// for confirmation.
    pub async fn approve(&self, request: ApproveRequest) -> Result<ApproveResponse, AuditProofError> {
        let auditor = Address::parse(&request.auditor_address)?;
        if auditor.is_zero() {
            return Err(AuditProofError::Validation(
                "Auditor address must not be zero".to_string(),
            ));
        }

        let info = self
            .signer
            .chain()
            .auditor_info(&auditor)
            .await
            .map_err(|e| AuditProofError::ChainSubmission(e.to_string()))?;
        if info.is_approved {
            return Err(AuditProofError::AlreadyApproved(auditor));
        }

        let tx_hash = self
            .signer
            .send(ContractCall::ApproveAuditor { auditor })
            .await?;

        if let Err(e) = self
            .applications
            .mark_reviewed(&auditor, ApplicationStatus::Approved, ADMIN_REVIEWER)
            .await
        {
            tracing::warn!("Failed to mirror approval of {} locally: {}", auditor, e);
        }

        match &self.finalizer {
            Some(finalizer) => {
                finalizer.enqueue(FinalizeJob {
                    auditor,
                    approval_tx: tx_hash,
                    github_handle: request.github_handle.unwrap_or_default(),
                    code4rena_handle: request.code4rena_handle.unwrap_or_default(),
                    immunefi_handle: request.immunefi_handle.unwrap_or_default(),
                });
            }
            None => tracing::debug!("No finalizer configured; skipping finalization for {}", auditor),
        }

        Ok(ApproveResponse {
            auditor: ApprovedAuditor {
                address: auditor,
                is_approved: true,
                credibility_score: None,
                credential_count: 0,
            },
            tx_hash,
            message: "Auditor approved. Finalization continues in the background.".to_string(),
        })
    }

    /// Reject a pending application. Synchronous and off-chain.
    pub async fn reject(&self, wallet_address: &str) -> Result<Application, AuditProofError> {
        let wallet = Address::parse(wallet_address)?;
        self.applications
            .mark_reviewed(&wallet, ApplicationStatus::Rejected, ADMIN_REVIEWER)
            .await?
            .ok_or_else(|| AuditProofError::NotFound("Application not found".to_string()))
    }

    /// List applications, optionally filtered by status. An unrecognized
    /// status is ignored and every application is returned.
    pub async fn list(&self, status: Option<&str>) -> ApplicationList {
        let status = status.and_then(|s| match s.trim().parse::<ApplicationStatus>() {
            Ok(status) => Some(status),
            Err(_) => {
                tracing::debug!("Ignoring unknown status filter '{}'", s);
                None
            }
        });
        let applications = self.applications.list(status).await;
        ApplicationList {
            count: applications.len(),
            applications,
        }
    }

    /// Record a new application for `wallet_address`.
    pub async fn submit_application(&self, wallet_address: &str) -> Result<Application, AuditProofError> {
        let wallet = Address::parse(wallet_address)?;
        let application = self.applications.submit(wallet).await?;
        tracing::info!("Application from {} is {}", wallet, application.status);
        Ok(application)
    }

    /// Revoke an approved auditor on-chain and return the transaction hash.
    pub async fn revoke(&self, auditor_address: &str) -> Result<TxHash, AuditProofError> {
        let auditor = Address::parse(auditor_address)?;
        self.signer.send(ContractCall::RevokeAuditor { auditor }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approve_request_accepts_missing_handles() {
        let request: ApproveRequest =
            serde_json::from_str(r#"{"auditorAddress":"0x1111111111111111111111111111111111111111"}"#)
                .unwrap();
        assert!(request.github_handle.is_none());
        assert_eq!(
            request.auditor_address,
            "0x1111111111111111111111111111111111111111"
        );
    }

    #[test]
    fn test_approve_response_shape() {
        let response = ApproveResponse {
            auditor: ApprovedAuditor {
                address: Address([0xaa; 20]),
                is_approved: true,
                credibility_score: None,
                credential_count: 0,
            },
            tx_hash: TxHash::ZERO,
            message: String::new(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["auditor"]["isApproved"], serde_json::json!(true));
        assert!(json["txHash"].is_string());
    }
}
