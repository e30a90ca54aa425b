// crates/auditproof-orchestrator/src/issuance.rs
//
// IssuanceService: credential issuance and proof generation with a local
// fallback.
//
// Fallback rules:
//   - issue: synthesize a credential when the issuer is unreachable, or on
//     any issuer error when `fallback_on_error` is set.
//   - generate proof: synthesize immediately when no verifier identity is
//     configured; otherwise as for issue.
// A synthesized proof is attested by the local TrustedProver when one is
// configured, so it can still be recorded on-chain.

use std::sync::Arc;

use chrono::Utc;
use tokio::time::Instant;
use uuid::Uuid;

use auditproof_core::credential::Credential;
use auditproof_core::crypto::{hash_bytes, id_to_bytes32};
use auditproof_core::error::AuditProofError;
use auditproof_core::metrics::MetricSample;
use auditproof_core::types::{Address, Bytes32};
use auditproof_reputation::Reputation;
use auditproof_store::{CredentialStore, MetricsAggregator};
use auditproof_verify::TrustedProver;

use crate::issuer::{
    CredentialIssuer, GeneratedProof, IssueRequest, IssuedCredential, AUDIT_CREDENTIAL_TYPE,
    CREDIBILITY_CREDENTIAL_TYPE,
};

pub struct IssuanceService {
    issuer: Arc<dyn CredentialIssuer>,
    credentials: Arc<CredentialStore>,
    metrics: Arc<MetricsAggregator>,
    prover: Option<Arc<TrustedProver>>,
    fallback_on_error: bool,
}

impl IssuanceService {
    pub fn new(
        issuer: Arc<dyn CredentialIssuer>,
        credentials: Arc<CredentialStore>,
        metrics: Arc<MetricsAggregator>,
    ) -> Self {
        Self {
            issuer,
            credentials,
            metrics,
            prover: None,
            fallback_on_error: false,
        }
    }

    /// Attest synthesized proofs with `prover`.
    pub fn with_prover(mut self, prover: Arc<TrustedProver>) -> Self {
        self.prover = Some(prover);
        self
    }

    /// Fall back on every issuer error, not only on network failures.
    pub fn with_fallback_on_error(mut self, enabled: bool) -> Self {
        self.fallback_on_error = enabled;
        self
    }

    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.credentials
    }

    fn should_fall_back(&self, e: &AuditProofError) -> bool {
        matches!(e, AuditProofError::UpstreamUnavailable(_)) || self.fallback_on_error
    }

    /// Issue an audit credential and store it.
    ///
    /// All four fields are required; addresses and the summary hash must be
    /// well formed.
    pub async fn issue(
        &self,
        issuer: &str,
        subject: &str,
        summary_hash: &str,
        status: &str,
    ) -> Result<Credential, AuditProofError> {
        if [issuer, subject, summary_hash, status]
            .iter()
            .any(|field| field.trim().is_empty())
        {
            return Err(AuditProofError::Validation("Missing fields".to_string()));
        }
        let request = IssueRequest {
            issuer: Address::parse(issuer)?,
            subject: Address::parse(subject)?,
            summary_hash: Bytes32::parse(summary_hash)?,
            status: status.trim().to_string(),
            credential_type: AUDIT_CREDENTIAL_TYPE,
        };
        self.issue_request(&request).await
    }

    /// Issue a credibility credential for a newly approved auditor. The
    /// platform identity is the issuer; the summary hash commits to the
    /// reputation breakdown.
    pub async fn issue_credibility(
        &self,
        platform: Address,
        reputation: &Reputation,
    ) -> Result<Credential, AuditProofError> {
        let encoded = serde_json::to_vec(reputation)?;
        let request = IssueRequest {
            issuer: platform,
            subject: reputation.address,
            summary_hash: Bytes32(hash_bytes(&encoded)),
            status: format!("Credibility Score: {}", reputation.credibility_score),
            credential_type: CREDIBILITY_CREDENTIAL_TYPE,
        };
        self.issue_request(&request).await
    }

    async fn issue_request(&self, request: &IssueRequest) -> Result<Credential, AuditProofError> {
        let (issued, synthesized) = match self.issuer.issue(request).await {
            Ok(issued) => (issued, false),
            Err(e) if self.should_fall_back(&e) => {
                tracing::warn!("Issuer unavailable ({}); synthesizing credential locally", e);
                let issued = IssuedCredential {
                    credential_id: Uuid::new_v4().to_string(),
                    issued_at: Utc::now(),
                    on_chain_id: None,
                };
                (issued, true)
            }
            Err(e) => return Err(e),
        };

        let credential = Credential {
            id: issued.credential_id,
            issuer: request.issuer,
            subject: request.subject,
            summary_hash: request.summary_hash,
            status: request.status.clone(),
            issued_at: issued.issued_at,
            on_chain_id: issued.on_chain_id,
            synthesized,
            created_at: None,
            updated_at: None,
        };
        let stored = self.credentials.upsert(credential).await?;
        tracing::info!(
            "Issued {} credential {} for {}{}",
            request.credential_type,
            stored.id,
            stored.subject,
            if synthesized { " (synthesized)" } else { "" }
        );
        Ok(stored)
    }

    /// Generate a proof for a stored credential and record a generation
    /// sample.
    pub async fn generate_proof(&self, credential_id: &str) -> Result<GeneratedProof, AuditProofError> {
        let credential_id = credential_id.trim();
        if credential_id.is_empty() {
            return Err(AuditProofError::Validation("Missing credentialId".to_string()));
        }
        let credential = self
            .credentials
            .get(credential_id)
            .await
            .ok_or_else(|| AuditProofError::NotFound(format!("Credential {}", credential_id)))?;

        let started = Instant::now();
        let outcome = if !self.issuer.has_verifier() {
            Ok(self.synthesize_proof(&credential))
        } else {
            match self.issuer.generate_proof(&credential).await {
                Ok(proof) => Ok(proof),
                Err(e) if self.should_fall_back(&e) => {
                    tracing::warn!("Proof generation upstream failed ({}); synthesizing locally", e);
                    Ok(self.synthesize_proof(&credential))
                }
                Err(e) => Err(e),
            }
        };
        let elapsed_ms = started.elapsed().as_secs_f64() * 1_000.0;

        let success = matches!(&outcome, Ok(proof) if proof.valid);
        if let Err(e) = self
            .metrics
            .record(MetricSample::generation(elapsed_ms, success))
            .await
        {
            tracing::warn!("Failed to record generation metric: {}", e);
        }
        outcome
    }

    fn synthesize_proof(&self, credential: &Credential) -> GeneratedProof {
        let proof_id = Uuid::new_v4().to_string();
        let proof = self
            .prover
            .as_ref()
            .map(|prover| prover.prove_credential(id_to_bytes32(&proof_id), credential));
        GeneratedProof {
            proof_id,
            credential_id: credential.id.clone(),
            valid: true,
            synthesized: true,
            proof,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use auditproof_core::crypto::Keypair;
    use auditproof_core::metrics::MetricKind;
    use auditproof_core::traits::ProofVerifier;
    use auditproof_verify::verifier::context_id_for;
    use auditproof_verify::SignatureVerifier;

    /// How a stub issuer responds.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub(crate) enum StubMode {
        Ok,
        /// Succeeds and reports the ledger key it assigned.
        Anchored,
        Unreachable,
        HttpError,
    }

    pub(crate) struct StubIssuer {
        pub mode: StubMode,
        pub verifier: bool,
    }

    impl StubIssuer {
        fn fail(&self) -> Option<AuditProofError> {
            match self.mode {
                StubMode::Ok | StubMode::Anchored => None,
                StubMode::Unreachable => {
                    Some(AuditProofError::UpstreamUnavailable("connection refused".into()))
                }
                StubMode::HttpError => Some(AuditProofError::Upstream("500 Internal".into())),
            }
        }
    }

    #[async_trait]
    impl CredentialIssuer for StubIssuer {
        async fn issue(&self, _request: &IssueRequest) -> Result<IssuedCredential, AuditProofError> {
            if let Some(e) = self.fail() {
                return Err(e);
            }
            Ok(IssuedCredential {
                credential_id: "air3-cred-1".to_string(),
                issued_at: Utc::now(),
                on_chain_id: (self.mode == StubMode::Anchored).then_some(ANCHOR_KEY),
            })
        }

        async fn generate_proof(&self, credential: &Credential) -> Result<GeneratedProof, AuditProofError> {
            if let Some(e) = self.fail() {
                return Err(e);
            }
            Ok(GeneratedProof {
                proof_id: "air3-proof-1".to_string(),
                credential_id: credential.id.clone(),
                valid: true,
                synthesized: false,
                proof: None,
            })
        }

        fn has_verifier(&self) -> bool {
            self.verifier
        }
    }

    const ISSUER: &str = "0x1111111111111111111111111111111111111111";
    const SUBJECT: &str = "0x2222222222222222222222222222222222222222";
    const SUMMARY: &str = "0x3333333333333333333333333333333333333333333333333333333333333333";
    const ANCHOR_KEY: Bytes32 = Bytes32([0x44; 32]);

    fn service(mode: StubMode, verifier: bool) -> IssuanceService {
        IssuanceService::new(
            Arc::new(StubIssuer { mode, verifier }),
            Arc::new(CredentialStore::in_memory()),
            Arc::new(MetricsAggregator::in_memory(200)),
        )
    }

    #[tokio::test]
    async fn test_issue_requires_all_fields() {
        let svc = service(StubMode::Ok, true);
        let err = svc.issue(ISSUER, SUBJECT, SUMMARY, "  ").await.unwrap_err();
        assert!(matches!(err, AuditProofError::Validation(ref m) if m == "Missing fields"));
        let err = svc.issue("0x12", SUBJECT, SUMMARY, "Verified").await.unwrap_err();
        assert!(matches!(err, AuditProofError::Validation(_)));
    }

    #[tokio::test]
    async fn test_issue_stores_upstream_credential() {
        let svc = service(StubMode::Ok, true);
        let credential = svc.issue(ISSUER, SUBJECT, SUMMARY, "Verified").await.unwrap();
        assert_eq!(credential.id, "air3-cred-1");
        assert!(!credential.synthesized);
        assert!(svc.credentials().get("air3-cred-1").await.is_some());
    }

    #[tokio::test]
    async fn test_issuer_ledger_key_is_kept() {
        let svc = service(StubMode::Anchored, true);
        let credential = svc.issue(ISSUER, SUBJECT, SUMMARY, "Verified").await.unwrap();
        assert_eq!(credential.on_chain_id, Some(ANCHOR_KEY));
        assert_eq!(credential.anchor_id(), ANCHOR_KEY);

        let stored = svc.credentials().get("air3-cred-1").await.unwrap();
        assert_eq!(stored.anchor_id(), ANCHOR_KEY);

        let plain = service(StubMode::Ok, true);
        let credential = plain.issue(ISSUER, SUBJECT, SUMMARY, "Verified").await.unwrap();
        assert_eq!(credential.anchor_id(), id_to_bytes32("air3-cred-1"));
    }

    #[tokio::test]
    async fn test_issue_falls_back_when_unreachable() {
        let svc = service(StubMode::Unreachable, true);
        let credential = svc.issue(ISSUER, SUBJECT, SUMMARY, "Verified").await.unwrap();
        assert!(credential.synthesized);
        assert!(Uuid::parse_str(&credential.id).is_ok());
        assert_eq!(credential.subject, Address::parse(SUBJECT).unwrap());
    }

    #[tokio::test]
    async fn test_http_error_propagates_unless_fallback_enabled() {
        let svc = service(StubMode::HttpError, true);
        let err = svc.issue(ISSUER, SUBJECT, SUMMARY, "Verified").await.unwrap_err();
        assert_eq!(err.status_code(), 502);

        let svc = service(StubMode::HttpError, true).with_fallback_on_error(true);
        assert!(svc.issue(ISSUER, SUBJECT, SUMMARY, "Verified").await.unwrap().synthesized);
    }

    #[tokio::test]
    async fn test_generate_without_verifier_synthesizes_attested_proof() {
        let prover_key = Keypair::generate();
        let prover = Arc::new(TrustedProver::new(prover_key, context_id_for("issuance")));
        let verifier = SignatureVerifier::for_deployment("issuance", prover.address());

        let svc = service(StubMode::Ok, false).with_prover(prover);
        let credential = svc.issue(ISSUER, SUBJECT, SUMMARY, "Verified").await.unwrap();
        let generated = svc.generate_proof(&credential.id).await.unwrap();

        assert!(generated.valid && generated.synthesized);
        let proof = generated.proof.unwrap();
        assert_eq!(proof.proof_id, id_to_bytes32(&generated.proof_id));
        assert!(verifier.verify_proof(&proof));
        assert_eq!(svc.metrics.len(MetricKind::Generation).await, 1);
    }

    #[tokio::test]
    async fn test_generate_uses_upstream_when_verifier_configured() {
        let svc = service(StubMode::Ok, true);
        let credential = svc.issue(ISSUER, SUBJECT, SUMMARY, "Verified").await.unwrap();
        let generated = svc.generate_proof(&credential.id).await.unwrap();
        assert_eq!(generated.proof_id, "air3-proof-1");
        assert!(!generated.synthesized);
    }

    #[tokio::test]
    async fn test_generate_failure_is_recorded() {
        let svc = service(StubMode::HttpError, true);
        svc.credentials()
            .upsert(Credential {
                id: "c".to_string(),
                issuer: Address::parse(ISSUER).unwrap(),
                subject: Address::parse(SUBJECT).unwrap(),
                summary_hash: Bytes32::ZERO,
                status: "Verified".to_string(),
                issued_at: Utc::now(),
                on_chain_id: None,
                synthesized: false,
                created_at: None,
                updated_at: None,
            })
            .await
            .unwrap();
        assert!(svc.generate_proof("c").await.is_err());
        let report = svc.metrics.report().await;
        assert_eq!(report.proof_generation.count, 1);
        assert!(!report.proof_generation.last.unwrap().success);
    }

    #[tokio::test]
    async fn test_generate_requires_known_credential() {
        let svc = service(StubMode::Ok, false);
        assert!(matches!(
            svc.generate_proof("").await,
            Err(AuditProofError::Validation(_))
        ));
        assert!(matches!(
            svc.generate_proof("nope").await,
            Err(AuditProofError::NotFound(_))
        ));
    }
}
