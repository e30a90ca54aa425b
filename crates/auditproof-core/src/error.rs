use thiserror::Error;

use crate::types::{Address, Bytes32};

/// Protocol-wide error types for the auditproof trust pipeline.
#[derive(Debug, Error)]
pub enum AuditProofError {
    /// Malformed address, missing required field, empty status.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Approval requested for an address that is already approved.
    #[error("Auditor already approved: {0}")]
    AlreadyApproved(Address),

    /// Operation requires an approved auditor.
    #[error("Not an approved auditor: {0}")]
    NotApproved(Address),

    /// Credential id has already been anchored.
    #[error("Credential already anchored: {0}")]
    AlreadyAnchored(Bytes32),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller is not permitted to perform the operation.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Proof attestation was not produced by the trusted signer.
    #[error("Invalid proof: {0}")]
    InvalidProof(String),

    /// Network failure reaching the external issuer (fallback-eligible).
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// External issuer answered with an error.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Signing or transaction submission failure.
    #[error("Chain submission error: {0}")]
    ChainSubmission(String),

    /// Cryptographic error (key parsing, signing).
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Snapshot or file store error.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl AuditProofError {
    /// HTTP-equivalent status code for surfacing this error to a caller.
    pub fn status_code(&self) -> u16 {
        match self {
            AuditProofError::Validation(_)
            | AuditProofError::AlreadyApproved(_)
            | AuditProofError::NotApproved(_)
            | AuditProofError::AlreadyAnchored(_)
            | AuditProofError::InvalidProof(_) => 400,
            AuditProofError::Unauthorized(_) => 401,
            AuditProofError::NotFound(_) => 404,
            AuditProofError::UpstreamUnavailable(_) | AuditProofError::Upstream(_) => 502,
            AuditProofError::ChainSubmission(_)
            | AuditProofError::Crypto(_)
            | AuditProofError::Serialization(_)
            | AuditProofError::Storage(_) => 500,
        }
    }

    /// Whether this error is a client-side state conflict (never retried).
    pub fn is_state_conflict(&self) -> bool {
        matches!(
            self,
            AuditProofError::AlreadyApproved(_)
                | AuditProofError::NotApproved(_)
                | AuditProofError::AlreadyAnchored(_)
                | AuditProofError::NotFound(_)
        )
    }
}

impl From<serde_json::Error> for AuditProofError {
    fn from(e: serde_json::Error) -> Self {
        AuditProofError::Serialization(e.to_string())
    }
}

impl From<std::io::Error> for AuditProofError {
    fn from(e: std::io::Error) -> Self {
        AuditProofError::Storage(e.to_string())
    }
}

impl From<ed25519_dalek::SignatureError> for AuditProofError {
    fn from(e: ed25519_dalek::SignatureError) -> Self {
        AuditProofError::Crypto(e.to_string())
    }
}
