// crates/auditproof-rpc/src/handlers/proofs.rs
//
// Proof handlers: GenerateProof, VerifyProof.

use serde::{Deserialize, Serialize};

use auditproof_core::error::AuditProofError;
use auditproof_orchestrator::{
    GeneratedProof, IssuanceService, VerificationService, VerifyRequest, VerifyResponse,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateProofRequest {
    #[serde(default)]
    pub credential_id: String,
}

/// Handle a GenerateProof request. Falls back to a locally attested proof
/// when no verifier identity is configured or the issuer is unreachable.
pub async fn handle_generate_proof(
    issuance: &IssuanceService,
    request: GenerateProofRequest,
) -> Result<GeneratedProof, AuditProofError> {
    issuance.generate_proof(&request.credential_id).await
}

/// Handle a VerifyProof request: check the attestation locally, then record
/// the verification on-chain.
pub async fn handle_verify_proof(
    verification: &VerificationService,
    request: VerifyRequest,
) -> Result<VerifyResponse, AuditProofError> {
    verification.verify_and_record(request).await
}
