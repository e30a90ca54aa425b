// crates/auditproof-rpc/src/handlers/applications.rs
//
// Public application handler: SubmitApplication.

use serde::{Deserialize, Serialize};

use auditproof_core::auditor::Application;
use auditproof_core::error::AuditProofError;
use auditproof_orchestrator::AdmissionService;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitApplicationRequest {
    #[serde(default)]
    pub wallet_address: String,
}

/// Handle a SubmitApplication request. Resubmitting after a rejection
/// resets the application to pending.
pub async fn handle_submit_application(
    admission: &AdmissionService,
    request: SubmitApplicationRequest,
) -> Result<Application, AuditProofError> {
    admission.submit_application(&request.wallet_address).await
}
