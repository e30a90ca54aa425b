// crates/auditproof-core/src/chain.rs
//
// Contract calls, signed transactions, receipts, and events.
//
// Every state-changing operation on the registry or ledger travels as a
// `ContractCall` wrapped in a `SignedCall`. The sender is never asserted
// by the caller: the chain recovers it from the signer attestation over
// `(nonce, call)`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::{hash_bytes, recover_signer, Keypair};
use crate::error::AuditProofError;
use crate::types::{hex_bytes, Address, Bytes32, TxHash};

/// Domain tag mixed into every transaction signing payload.
const TX_DOMAIN: &[u8] = b"auditproof-tx-v1";

/// Base cost charged to every transaction receipt.
const BASE_GAS: u64 = 21_000;

/// Cost per byte of encoded call data.
const GAS_PER_BYTE: u64 = 16;

/// Arguments of `recordVerification(address,address,string,bytes32,bytes32,bytes,uint256[],bytes)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordVerificationCall {
    pub project: Address,
    pub auditor: Address,
    pub status: String,
    pub credential_id: Bytes32,
    pub proof_id: Bytes32,
    #[serde(with = "hex_bytes")]
    pub proof_bytes: Vec<u8>,
    pub public_inputs: Vec<Bytes32>,
    #[serde(with = "hex_bytes")]
    pub signature: Vec<u8>,
}

/// A state-changing call against the auditor registry or credential ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", content = "args", rename_all = "camelCase")]
pub enum ContractCall {
    ApproveAuditor {
        auditor: Address,
    },
    RevokeAuditor {
        auditor: Address,
    },
    UpdateAuditorProfile {
        github: String,
        code4rena: String,
        immunefi: String,
    },
    UpdateCredibilityScore {
        auditor: Address,
        score: u64,
    },
    TransferAdmin {
        new_admin: Address,
    },
    SetCredentialLedger {
        ledger: Address,
    },
    AnchorCredential {
        credential_id: Bytes32,
        summary_hash: Bytes32,
        auditor: Address,
    },
    RecordVerification(Box<RecordVerificationCall>),
}

impl ContractCall {
    /// The contract function signature this call targets.
    pub fn signature(&self) -> &'static str {
        match self {
            ContractCall::ApproveAuditor { .. } => "approveAuditor(address)",
            ContractCall::RevokeAuditor { .. } => "revokeAuditor(address)",
            ContractCall::UpdateAuditorProfile { .. } => "updateAuditorProfile(string,string,string)",
            ContractCall::UpdateCredibilityScore { .. } => "updateCredibilityScore(address,uint256)",
            ContractCall::TransferAdmin { .. } => "transferAdmin(address)",
            ContractCall::SetCredentialLedger { .. } => "setCredentialLedger(address)",
            ContractCall::AnchorCredential { .. } => "anchorCredential(bytes32,bytes32,address)",
            ContractCall::RecordVerification(_) => {
                "recordVerification(address,address,string,bytes32,bytes32,bytes,uint256[],bytes)"
            }
        }
    }

    /// Canonical call-data encoding.
    pub fn encode(&self) -> Result<Vec<u8>, AuditProofError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Deterministic cost of executing this call.
    pub fn gas_cost(&self) -> Result<u64, AuditProofError> {
        Ok(BASE_GAS + GAS_PER_BYTE * self.encode()?.len() as u64)
    }
}

/// A contract call authenticated by its sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedCall {
    pub call: ContractCall,
    /// Per-account sequence number.
    pub nonce: u64,
    /// Signer attestation over the signing payload.
    #[serde(with = "hex_bytes")]
    pub attestation: Vec<u8>,
}

impl SignedCall {
    /// Sign `call` at `nonce` with `keypair`.
    pub fn sign(keypair: &Keypair, call: ContractCall, nonce: u64) -> Result<Self, AuditProofError> {
        let payload = Self::signing_payload(&call, nonce)?;
        Ok(Self {
            call,
            nonce,
            attestation: keypair.attest(&payload),
        })
    }

    /// Recover the sender, or fail with `Unauthorized` if the attestation
    /// does not verify.
    pub fn sender(&self) -> Result<Address, AuditProofError> {
        let payload = Self::signing_payload(&self.call, self.nonce)?;
        recover_signer(&payload, &self.attestation).ok_or_else(|| {
            AuditProofError::Unauthorized("Transaction signature does not verify".to_string())
        })
    }

    /// Hash identifying this transaction.
    pub fn tx_hash(&self) -> Result<TxHash, AuditProofError> {
        let mut data = Self::signing_payload(&self.call, self.nonce)?;
        data.extend_from_slice(&self.attestation);
        Ok(Bytes32(hash_bytes(&data)))
    }

    fn signing_payload(call: &ContractCall, nonce: u64) -> Result<Vec<u8>, AuditProofError> {
        let mut data = Vec::new();
        data.extend_from_slice(TX_DOMAIN);
        data.extend_from_slice(&nonce.to_be_bytes());
        data.extend_from_slice(&call.encode()?);
        Ok(hash_bytes(&data).to_vec())
    }
}

/// Events emitted by successful registry and ledger mutations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ChainEvent {
    AuditorApproved {
        auditor: Address,
        at: DateTime<Utc>,
    },
    AuditorRevoked {
        auditor: Address,
        at: DateTime<Utc>,
    },
    AuditorProfileUpdated {
        auditor: Address,
        github: String,
        code4rena: String,
        immunefi: String,
    },
    CredibilityScoreUpdated {
        auditor: Address,
        score: u64,
    },
    CredentialIssued {
        auditor: Address,
    },
    AdminTransferred {
        from: Address,
        to: Address,
    },
    CredentialLedgerSet {
        ledger: Address,
    },
    CredentialAnchored {
        credential_id: Bytes32,
        auditor: Address,
        summary_hash: Bytes32,
        at: DateTime<Utc>,
    },
    ProofValidated {
        proof_id: Bytes32,
        credential_id: Bytes32,
        project: Address,
        auditor: Address,
        summary_hash: Option<Bytes32>,
        at: DateTime<Utc>,
    },
    VerificationRecorded {
        project: Address,
        auditor: Address,
        status: String,
        at: DateTime<Utc>,
    },
}

/// Result of executing a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub tx_hash: TxHash,
    pub from: Address,
    pub nonce: u64,
    pub block_number: u64,
    pub gas_used: u64,
    pub events: Vec<ChainEvent>,
    pub submitted_at: DateTime<Utc>,
}

/// Outcome of a bounded confirmation wait. A timeout is a degraded state,
/// not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Confirmation {
    Confirmed { block_number: u64 },
    TimedOut,
}

impl Confirmation {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Confirmation::Confirmed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_call_recovers_sender() {
        let keypair = Keypair::generate();
        let call = ContractCall::ApproveAuditor {
            auditor: Address([7u8; 20]),
        };
        let signed = SignedCall::sign(&keypair, call, 3).unwrap();
        assert_eq!(signed.sender().unwrap(), keypair.address());
    }

    #[test]
    fn test_tampered_call_is_rejected() {
        let keypair = Keypair::generate();
        let call = ContractCall::UpdateCredibilityScore {
            auditor: Address([7u8; 20]),
            score: 10,
        };
        let mut signed = SignedCall::sign(&keypair, call, 0).unwrap();
        signed.call = ContractCall::UpdateCredibilityScore {
            auditor: Address([7u8; 20]),
            score: 1_000,
        };
        assert!(matches!(signed.sender(), Err(AuditProofError::Unauthorized(_))));
    }

    #[test]
    fn test_tx_hash_depends_on_nonce() {
        let keypair = Keypair::generate();
        let call = ContractCall::RevokeAuditor {
            auditor: Address([1u8; 20]),
        };
        let a = SignedCall::sign(&keypair, call.clone(), 0).unwrap();
        let b = SignedCall::sign(&keypair, call, 1).unwrap();
        assert_ne!(a.tx_hash().unwrap(), b.tx_hash().unwrap());
    }

    #[test]
    fn test_call_signatures() {
        let call = ContractCall::AnchorCredential {
            credential_id: Bytes32::ZERO,
            summary_hash: Bytes32::ZERO,
            auditor: Address::ZERO,
        };
        assert_eq!(call.signature(), "anchorCredential(bytes32,bytes32,address)");
        assert!(call.gas_cost().unwrap() > BASE_GAS);
    }
}
