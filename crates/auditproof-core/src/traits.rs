// crates/auditproof-core/src/traits.rs

use std::time::Duration;

use async_trait::async_trait;

use crate::auditor::Auditor;
use crate::chain::{Confirmation, Receipt, SignedCall};
use crate::credential::Proof;
use crate::error::AuditProofError;
use crate::types::{Address, Bytes32, TxHash};

/// Connection to the chain hosting the auditor registry and credential ledger.
///
/// Implemented by auditproof-ledger (`LocalChain`).
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Read `getAuditorInfo(address)`. Unknown addresses yield an unapproved record.
    async fn auditor_info(&self, auditor: &Address) -> Result<Auditor, AuditProofError>;

    /// Read `isVerified(address)`.
    async fn is_verified(&self, project: &Address) -> Result<bool, AuditProofError>;

    /// Read `isCredentialAnchored(bytes32)`.
    async fn is_credential_anchored(&self, credential_id: &Bytes32) -> Result<bool, AuditProofError>;

    /// Next unused sequence number for `account`.
    async fn next_nonce(&self, account: &Address) -> Result<u64, AuditProofError>;

    /// Submit a signed call. Returns as soon as the transaction is accepted;
    /// confirmation is awaited separately.
    async fn submit(&self, call: SignedCall) -> Result<TxHash, AuditProofError>;

    /// Receipt for a previously submitted transaction, if known.
    async fn receipt(&self, tx_hash: &TxHash) -> Result<Option<Receipt>, AuditProofError>;

    /// Wait for one confirmation of `tx_hash`, giving up after `timeout`.
    async fn wait_for_confirmation(
        &self,
        tx_hash: &TxHash,
        timeout: Duration,
    ) -> Result<Confirmation, AuditProofError>;
}

/// Trait for proof attestation verification.
///
/// Implemented by auditproof-verify.
pub trait ProofVerifier: Send + Sync {
    /// Returns `true` iff the proof was attested by the trusted signer.
    /// Never errors on a mismatch.
    fn verify_proof(&self, proof: &Proof) -> bool;
}
