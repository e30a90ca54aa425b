// crates/auditproof-rpc/src/handlers/credentials.rs
//
// Credential handlers: IssueCredential, GetCredential, ListCredentials.

use serde::{Deserialize, Serialize};

use auditproof_core::credential::Credential;
use auditproof_core::error::AuditProofError;
use auditproof_core::types::Address;
use auditproof_orchestrator::IssuanceService;
use auditproof_store::{CredentialFilter, CredentialStore};

// ---------------------------------------------------------------------------
// IssueCredential
// ---------------------------------------------------------------------------

/// Request to issue an audit credential. Fields are validated by the
/// issuance service so that a missing field is a 400, not a decode error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueCredentialRequest {
    #[serde(default)]
    pub issuer: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub summary_hash: String,
    #[serde(default)]
    pub status: String,
}

pub async fn handle_issue_credential(
    issuance: &IssuanceService,
    request: IssueCredentialRequest,
) -> Result<Credential, AuditProofError> {
    issuance
        .issue(
            &request.issuer,
            &request.subject,
            &request.summary_hash,
            &request.status,
        )
        .await
}

// ---------------------------------------------------------------------------
// GetCredential
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetCredentialRequest {
    #[serde(default)]
    pub id: String,
}

pub async fn handle_get_credential(
    credentials: &CredentialStore,
    request: GetCredentialRequest,
) -> Result<Credential, AuditProofError> {
    credentials
        .get(&request.id)
        .await
        .ok_or_else(|| AuditProofError::NotFound(format!("Credential {}", request.id)))
}

// ---------------------------------------------------------------------------
// ListCredentials
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListCredentialsRequest {
    #[serde(default)]
    pub issuer: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListCredentialsResponse {
    pub count: usize,
    pub credentials: Vec<Credential>,
}

pub async fn handle_list_credentials(
    credentials: &CredentialStore,
    request: ListCredentialsRequest,
) -> Result<ListCredentialsResponse, AuditProofError> {
    let filter = CredentialFilter {
        issuer: parse_filter(request.issuer.as_deref())?,
        subject: parse_filter(request.subject.as_deref())?,
    };
    let credentials = credentials.list(filter).await;
    Ok(ListCredentialsResponse {
        count: credentials.len(),
        credentials,
    })
}

fn parse_filter(raw: Option<&str>) -> Result<Option<Address>, AuditProofError> {
    match raw.map(str::trim) {
        Some(s) if !s.is_empty() => Address::parse(s).map(Some),
        _ => Ok(None),
    }
}
