// crates/auditproof-orchestrator/src/verification.rs
//
// VerificationService: verify a proof locally, then record it on-chain.
//
// The proof is checked against the same verifier the ledger uses before
// anything is signed, so an invalid proof is a 400 rather than a failed
// transaction. The on-chain digest binds issuer = auditor and
// subject = project; a proof issued for another pair is rejected here.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use auditproof_core::chain::{ContractCall, RecordVerificationCall};
use auditproof_core::credential::Proof;
use auditproof_core::crypto::id_to_bytes32;
use auditproof_core::error::AuditProofError;
use auditproof_core::metrics::MetricSample;
use auditproof_core::traits::ProofVerifier;
use auditproof_core::types::{Address, Bytes32, TxHash};
use auditproof_store::{CredentialStore, MetricsAggregator};

use crate::signing::SigningContext;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    #[serde(default)]
    pub proof: Option<Proof>,
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub auditor: String,
    #[serde(default)]
    pub status: String,
    /// Off-chain credential id the proof was generated for, if any.
    #[serde(default)]
    pub credential_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub ok: bool,
    pub tx_hash: TxHash,
    /// False when the confirmation wait timed out. The verification was
    /// still accepted.
    pub confirmed: bool,
    pub gas_used: Option<u64>,
}

pub struct VerificationService {
    signer: Arc<SigningContext>,
    verifier: Arc<dyn ProofVerifier>,
    credentials: Arc<CredentialStore>,
    metrics: Arc<MetricsAggregator>,
    confirmation_timeout: Duration,
}

impl VerificationService {
    pub fn new(
        signer: Arc<SigningContext>,
        verifier: Arc<dyn ProofVerifier>,
        credentials: Arc<CredentialStore>,
        metrics: Arc<MetricsAggregator>,
    ) -> Self {
        Self {
            signer,
            verifier,
            credentials,
            metrics,
            confirmation_timeout: Duration::from_secs(60),
        }
    }

    pub fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.confirmation_timeout = timeout;
        self
    }

    /// Verify `request.proof` and record the outcome for the project.
    pub async fn verify_and_record(&self, request: VerifyRequest) -> Result<VerifyResponse, AuditProofError> {
        let (call, proof) = self.prepare(request).await?;
        let project = call.project;

        let started = Instant::now();
        let outcome = self.record(call, &proof).await;
        let latency_ms = started.elapsed().as_secs_f64() * 1_000.0;

        let sample = match &outcome {
            Ok(response) => MetricSample::verification(response.gas_used, latency_ms, true),
            Err(_) => MetricSample::verification(None, latency_ms, false),
        };
        if let Err(e) = self.metrics.record(sample).await {
            tracing::warn!("Failed to record verification metric: {}", e);
        }

        match &outcome {
            Ok(response) => tracing::info!(
                "Verification for {} recorded in {} (confirmed: {})",
                project,
                response.tx_hash,
                response.confirmed
            ),
            Err(e) => tracing::warn!("Verification for {} failed: {}", project, e),
        }
        outcome
    }

    async fn prepare(&self, request: VerifyRequest) -> Result<(RecordVerificationCall, Proof), AuditProofError> {
        let status = request.status.trim();
        let proof = match request.proof {
            Some(proof) if !request.project.trim().is_empty()
                && !request.auditor.trim().is_empty()
                && !status.is_empty() =>
            {
                proof
            }
            _ => return Err(AuditProofError::Validation("Missing fields".to_string())),
        };
        let project = Address::parse(&request.project)?;
        let auditor = Address::parse(&request.auditor)?;

        if proof.issuer != auditor || proof.subject != project {
            return Err(AuditProofError::InvalidProof(
                "Proof was not issued for this auditor and project".to_string(),
            ));
        }

        let credential_id = match request.credential_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => match self.credentials.get(id).await {
                Some(credential) => credential.anchor_id(),
                None => id_to_bytes32(id),
            },
            _ => Bytes32::ZERO,
        };

        let call = RecordVerificationCall {
            project,
            auditor,
            status: status.to_string(),
            credential_id,
            proof_id: proof.proof_id,
            proof_bytes: proof.proof_bytes.clone(),
            public_inputs: proof.public_inputs.clone(),
            signature: proof.signature.clone(),
        };
        Ok((call, proof))
    }

    async fn record(&self, call: RecordVerificationCall, proof: &Proof) -> Result<VerifyResponse, AuditProofError> {
        if !self.verifier.verify_proof(proof) {
            return Err(AuditProofError::InvalidProof(
                "Signature was not produced by the trusted signer".to_string(),
            ));
        }

        let tx_hash = self
            .signer
            .send(ContractCall::RecordVerification(Box::new(call)))
            .await?;

        let confirmed = self
            .signer
            .confirm(&tx_hash, self.confirmation_timeout)
            .await
            .is_confirmed();
        let gas_used = match self.signer.chain().receipt(&tx_hash).await {
            Ok(receipt) => receipt.map(|r| r.gas_used),
            Err(e) => {
                tracing::debug!("No receipt for {}: {}", tx_hash, e);
                None
            }
        };

        Ok(VerifyResponse {
            ok: true,
            tx_hash,
            confirmed,
            gas_used,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_request_defaults() {
        let request: VerifyRequest = serde_json::from_str(r#"{"status":"Verified"}"#).unwrap();
        assert!(request.proof.is_none());
        assert!(request.project.is_empty());
        assert!(request.credential_id.is_none());
    }
}
