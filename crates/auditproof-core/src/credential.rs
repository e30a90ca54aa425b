// crates/auditproof-core/src/credential.rs
//
// Credential, anchoring, verification, and proof types.
//
// A Credential is issued off-chain (by the external issuer or the local
// fallback) and optionally anchored on-chain under a 32-byte id. Anchoring
// is one-time and irreversible per id. A Proof is ephemeral: it is
// validated against the trusted signer and never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::id_to_bytes32;
use crate::types::{hex_bytes, Address, Bytes32};

/// An audit credential issued to a project by an auditor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    /// Globally unique credential id (issuer-assigned or synthesized UUID).
    pub id: String,
    /// The issuing auditor.
    pub issuer: Address,
    /// The audited project.
    pub subject: Address,
    /// Hash of the audit summary document.
    pub summary_hash: Bytes32,
    /// Human-readable verification status, e.g. "Verified - No Critical Issues".
    pub status: String,
    pub issued_at: DateTime<Utc>,
    /// On-chain anchor id, once anchored.
    #[serde(default)]
    pub on_chain_id: Option<Bytes32>,
    /// True when the credential was synthesized locally because the
    /// upstream issuer was unreachable.
    #[serde(default)]
    pub synthesized: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Credential {
    /// The 32-byte id under which this credential is anchored.
    pub fn anchor_id(&self) -> Bytes32 {
        self.on_chain_id.unwrap_or_else(|| id_to_bytes32(&self.id))
    }
}

/// On-chain record of a credential's existence and issuing auditor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorRecord {
    pub credential_id: Bytes32,
    pub auditor: Address,
    pub summary_hash: Bytes32,
    pub anchored_at: DateTime<Utc>,
}

/// The current verification outcome for a project. Overwritten, not
/// appended, by each successful verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRecord {
    pub project: Address,
    pub auditor: Address,
    pub status: String,
    pub verified_at: DateTime<Utc>,
}

/// A trusted-signer attestation over a proof blob and its public inputs.
///
/// This is not a zero-knowledge proof: validity means exactly "the
/// configured trusted signer signed this digest".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    pub proof_id: Bytes32,
    pub issuer: Address,
    pub subject: Address,
    #[serde(with = "hex_bytes")]
    pub proof_bytes: Vec<u8>,
    pub public_inputs: Vec<Bytes32>,
    /// Signer attestation: `public_key || signature`.
    #[serde(with = "hex_bytes")]
    pub signature: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_id_prefers_on_chain_id() {
        let now = Utc::now();
        let mut credential = Credential {
            id: "cred-1".to_string(),
            issuer: Address([1u8; 20]),
            subject: Address([2u8; 20]),
            summary_hash: Bytes32([3u8; 32]),
            status: "Verified".to_string(),
            issued_at: now,
            on_chain_id: None,
            synthesized: false,
            created_at: None,
            updated_at: None,
        };
        assert_eq!(credential.anchor_id(), id_to_bytes32("cred-1"));

        credential.on_chain_id = Some(Bytes32([9u8; 32]));
        assert_eq!(credential.anchor_id(), Bytes32([9u8; 32]));
    }

    #[test]
    fn test_proof_bytes_serialize_as_hex() {
        let proof = Proof {
            proof_id: Bytes32::ZERO,
            issuer: Address::ZERO,
            subject: Address::ZERO,
            proof_bytes: vec![0xde, 0xad],
            public_inputs: vec![],
            signature: vec![],
        };
        let json = serde_json::to_value(&proof).unwrap();
        assert_eq!(json["proofBytes"], serde_json::json!("0xdead"));
        assert_eq!(json["signature"], serde_json::json!("0x"));
    }
}
