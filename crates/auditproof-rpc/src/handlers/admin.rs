// crates/auditproof-rpc/src/handlers/admin.rs
//
// Admin handlers: ApproveAuditor, ListApplications, RejectApplication,
// RevokeAuditor. All transactions are sent from the daemon's admin identity.

use serde::{Deserialize, Serialize};

use auditproof_core::error::AuditProofError;
use auditproof_core::types::TxHash;
use auditproof_orchestrator::{AdmissionService, ApplicationList, ApproveRequest, ApproveResponse};

// ---------------------------------------------------------------------------
// ApproveAuditor
// ---------------------------------------------------------------------------

/// Handle an ApproveAuditor request.
///
/// Returns once the approval transaction is accepted. Confirmation and
/// credibility scoring continue in the background.
pub async fn handle_approve_auditor(
    admission: &AdmissionService,
    request: ApproveRequest,
) -> Result<ApproveResponse, AuditProofError> {
    admission.approve(request).await
}

// ---------------------------------------------------------------------------
// ListApplications
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListApplicationsRequest {
    /// One of "pending", "approved", "rejected". Anything else lists all.
    #[serde(default)]
    pub status: Option<String>,
}

pub async fn handle_list_applications(
    admission: &AdmissionService,
    request: ListApplicationsRequest,
) -> Result<ApplicationList, AuditProofError> {
    Ok(admission.list(request.status.as_deref()).await)
}

// ---------------------------------------------------------------------------
// RejectApplication
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectApplicationRequest {
    #[serde(default)]
    pub wallet_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectApplicationResponse {
    pub ok: bool,
}

pub async fn handle_reject_application(
    admission: &AdmissionService,
    request: RejectApplicationRequest,
) -> Result<RejectApplicationResponse, AuditProofError> {
    admission.reject(&request.wallet_address).await?;
    Ok(RejectApplicationResponse { ok: true })
}

// ---------------------------------------------------------------------------
// RevokeAuditor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokeAuditorRequest {
    #[serde(default)]
    pub auditor_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokeAuditorResponse {
    pub ok: bool,
    pub tx_hash: TxHash,
}

pub async fn handle_revoke_auditor(
    admission: &AdmissionService,
    request: RevokeAuditorRequest,
) -> Result<RevokeAuditorResponse, AuditProofError> {
    let tx_hash = admission.revoke(&request.auditor_address).await?;
    Ok(RevokeAuditorResponse { ok: true, tx_hash })
}
