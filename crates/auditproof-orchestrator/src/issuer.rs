// crates/auditproof-orchestrator/src/issuer.rs
//
// The external credential-issuance collaborator.
//
// CredentialIssuer is the seam; Air3Issuer talks to the AIR3 partner API
// over HTTP. Transport failures (connection refused, DNS, timeouts) are
// classified as UpstreamUnavailable, which makes them eligible for the
// local fallback in IssuanceService. HTTP error statuses are Upstream.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use auditproof_core::credential::{Credential, Proof};
use auditproof_core::error::AuditProofError;
use auditproof_core::types::{Address, Bytes32};

/// Credential type requested from the issuer for audit attestations.
pub const AUDIT_CREDENTIAL_TYPE: &str = "SmartContractAudit";

/// Credential type requested for auditor credibility attestations.
pub const CREDIBILITY_CREDENTIAL_TYPE: &str = "AuditorCredibility";

/// A validated issuance request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRequest {
    pub issuer: Address,
    pub subject: Address,
    pub summary_hash: Bytes32,
    pub status: String,
    pub credential_type: &'static str,
}

/// What the issuer returns for a credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCredential {
    pub credential_id: String,
    pub issued_at: DateTime<Utc>,
    /// Ledger key assigned by the issuer, when it anchors credentials itself.
    pub on_chain_id: Option<Bytes32>,
}

/// A proof as returned to callers of `proofs/generate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedProof {
    pub proof_id: String,
    pub credential_id: String,
    pub valid: bool,
    /// True when produced locally because the issuer was unavailable or no
    /// verifier identity is configured.
    #[serde(default)]
    pub synthesized: bool,
    /// The attested proof, when one is available for on-chain recording.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<Proof>,
}

#[async_trait]
pub trait CredentialIssuer: Send + Sync {
    async fn issue(&self, request: &IssueRequest) -> Result<IssuedCredential, AuditProofError>;

    async fn generate_proof(&self, credential: &Credential) -> Result<GeneratedProof, AuditProofError>;

    /// Whether a verifier identity is configured. Without one, proof
    /// generation never contacts the issuer.
    fn has_verifier(&self) -> bool;
}

/// Connection settings for [`Air3Issuer`].
#[derive(Debug, Clone)]
pub struct Air3Settings {
    pub api_base: String,
    pub partner_id: Option<String>,
    pub issuer_did: Option<String>,
    pub verifier_did: Option<String>,
    pub request_timeout: Duration,
}

impl Default for Air3Settings {
    fn default() -> Self {
        Self {
            api_base: "https://api.sandbox.air3.com".to_string(),
            partner_id: None,
            issuer_did: None,
            verifier_did: None,
            request_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Serialize)]
struct IssuePayload<'a> {
    partner_id: Option<&'a str>,
    issuer_did: Option<&'a str>,
    subject_did: String,
    verifier_did: Option<&'a str>,
    credential_type: &'a str,
    summary_hash: String,
    status: &'a str,
    metadata: IssueMetadata,
}

#[derive(Debug, Serialize)]
struct IssueMetadata {
    issuer_address: String,
}

#[derive(Debug, Deserialize)]
struct IssueResponse {
    credential_id: String,
    #[serde(default)]
    issued_at: Option<DateTime<Utc>>,
    #[serde(default)]
    on_chain_id: Option<Bytes32>,
}

#[derive(Debug, Serialize)]
struct ProofPayload<'a> {
    credential_id: &'a str,
    verifier_did: &'a str,
}

#[derive(Debug, Deserialize)]
struct ProofResponse {
    proof_id: String,
    #[serde(default)]
    valid: bool,
    #[serde(default)]
    proof_data: Option<serde_json::Value>,
}

/// HTTP client for the AIR3 partner API.
#[derive(Debug, Clone)]
pub struct Air3Issuer {
    settings: Air3Settings,
    client: reqwest::Client,
}

impl Air3Issuer {
    pub fn new(settings: Air3Settings) -> Self {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { settings, client }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.settings.api_base.trim_end_matches('/'), path)
    }

    async fn post<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, AuditProofError> {
        let mut request = self.client.post(self.url(path)).json(body);
        if let Some(partner_id) = &self.settings.partner_id {
            request = request.header("x-partner-id", partner_id);
        }

        let response = request.send().await.map_err(classify_transport_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuditProofError::Upstream(format!(
                "{} returned {}: {}",
                path, status, body
            )));
        }
        response
            .json::<R>()
            .await
            .map_err(|e| AuditProofError::Upstream(format!("Malformed response from {}: {}", path, e)))
    }
}

#[async_trait]
impl CredentialIssuer for Air3Issuer {
    async fn issue(&self, request: &IssueRequest) -> Result<IssuedCredential, AuditProofError> {
        let payload = IssuePayload {
            partner_id: self.settings.partner_id.as_deref(),
            issuer_did: self.settings.issuer_did.as_deref(),
            subject_did: request.subject.to_string(),
            verifier_did: self.settings.verifier_did.as_deref(),
            credential_type: request.credential_type,
            summary_hash: request.summary_hash.to_string(),
            status: &request.status,
            metadata: IssueMetadata {
                issuer_address: request.issuer.to_string(),
            },
        };
        let response: IssueResponse = self.post("/issuer/credentials", &payload).await?;
        Ok(IssuedCredential {
            credential_id: response.credential_id,
            issued_at: response.issued_at.unwrap_or_else(Utc::now),
            on_chain_id: response.on_chain_id,
        })
    }

    async fn generate_proof(&self, credential: &Credential) -> Result<GeneratedProof, AuditProofError> {
        let verifier_did = self.settings.verifier_did.as_deref().ok_or_else(|| {
            AuditProofError::Validation("No verifier DID configured".to_string())
        })?;
        let payload = ProofPayload {
            credential_id: &credential.id,
            verifier_did,
        };
        let response: ProofResponse = self.post("/proofs/generate", &payload).await?;
        let proof = response
            .proof_data
            .and_then(|data| serde_json::from_value::<Proof>(data).ok());
        Ok(GeneratedProof {
            proof_id: response.proof_id,
            credential_id: credential.id.clone(),
            valid: response.valid,
            synthesized: false,
            proof,
        })
    }

    fn has_verifier(&self) -> bool {
        self.settings.verifier_did.is_some()
    }
}

/// Map a reqwest transport failure onto the error taxonomy.
fn classify_transport_error(e: reqwest::Error) -> AuditProofError {
    if e.is_connect() || e.is_timeout() || e.is_request() {
        AuditProofError::UpstreamUnavailable(e.to_string())
    } else {
        AuditProofError::Upstream(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_issuer_is_upstream_unavailable() {
        // Nothing listens on port 9 of the loopback interface.
        let issuer = Air3Issuer::new(Air3Settings {
            api_base: "http://127.0.0.1:9".to_string(),
            request_timeout: Duration::from_secs(2),
            ..Air3Settings::default()
        });
        let request = IssueRequest {
            issuer: Address([1u8; 20]),
            subject: Address([2u8; 20]),
            summary_hash: Bytes32::ZERO,
            status: "Verified".to_string(),
            credential_type: AUDIT_CREDENTIAL_TYPE,
        };
        let err = issuer.issue(&request).await.unwrap_err();
        assert!(matches!(err, AuditProofError::UpstreamUnavailable(_)), "{:?}", err);
    }

    #[test]
    fn test_issue_response_ledger_key_is_optional() {
        let bare: IssueResponse = serde_json::from_str(r#"{"credential_id":"c-1"}"#).unwrap();
        assert!(bare.on_chain_id.is_none());

        let key = format!("0x{}", "ab".repeat(32));
        let json = format!(r#"{{"credential_id":"c-2","on_chain_id":"{}"}}"#, key);
        let anchored: IssueResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(anchored.on_chain_id, Some(Bytes32([0xab; 32])));
    }

    #[test]
    fn test_has_verifier_tracks_did() {
        let mut settings = Air3Settings::default();
        assert!(!Air3Issuer::new(settings.clone()).has_verifier());
        settings.verifier_did = Some("did:air:verifier".to_string());
        assert!(Air3Issuer::new(settings).has_verifier());
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let issuer = Air3Issuer::new(Air3Settings {
            api_base: "https://api.sandbox.air3.com/".to_string(),
            ..Air3Settings::default()
        });
        assert_eq!(
            issuer.url("/proofs/generate"),
            "https://api.sandbox.air3.com/proofs/generate"
        );
    }
}
