// crates/auditproof-orchestrator/src/signing.rs
//
// SigningContext: the service's single signing identity and chain handle.
//
// Constructed once at startup and shared by handle. Nonce allocation and
// submission happen under one async mutex, so concurrent admin operations
// are sequenced per account instead of racing for the same nonce.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use auditproof_core::chain::{Confirmation, ContractCall, SignedCall};
use auditproof_core::crypto::Keypair;
use auditproof_core::error::AuditProofError;
use auditproof_core::traits::ChainClient;
use auditproof_core::types::{Address, TxHash};

pub struct SigningContext {
    keypair: Keypair,
    chain: Arc<dyn ChainClient>,
    sequencer: Mutex<()>,
}

impl SigningContext {
    pub fn new(keypair: Keypair, chain: Arc<dyn ChainClient>) -> Self {
        Self {
            keypair,
            chain,
            sequencer: Mutex::new(()),
        }
    }

    /// The address transactions are sent from.
    pub fn address(&self) -> Address {
        self.keypair.address()
    }

    pub fn chain(&self) -> &Arc<dyn ChainClient> {
        &self.chain
    }

    /// Sign and submit `call` at the account's next nonce.
    ///
    /// Returns once the chain has accepted the transaction. State conflicts
    /// reported by the chain are returned unchanged; every other failure is
    /// a `ChainSubmission` error.
    pub async fn send(&self, call: ContractCall) -> Result<TxHash, AuditProofError> {
        let method = call.signature();
        let _turn = self.sequencer.lock().await;

        let nonce = self
            .chain
            .next_nonce(&self.address())
            .await
            .map_err(submission_error)?;
        let signed = SignedCall::sign(&self.keypair, call, nonce).map_err(submission_error)?;
        let tx_hash = self.chain.submit(signed).await.map_err(submission_error)?;

        tracing::info!("{} tx sent: {} (nonce {})", method, tx_hash, nonce);
        Ok(tx_hash)
    }

    /// Wait for one confirmation of `tx_hash`. A lookup failure is treated
    /// the same as a timeout: unconfirmed, continue.
    pub async fn confirm(&self, tx_hash: &TxHash, timeout: Duration) -> Confirmation {
        match self.chain.wait_for_confirmation(tx_hash, timeout).await {
            Ok(confirmation) => confirmation,
            Err(e) => {
                tracing::warn!("Confirmation lookup for {} failed: {}", tx_hash, e);
                Confirmation::TimedOut
            }
        }
    }
}

fn submission_error(e: AuditProofError) -> AuditProofError {
    if e.is_state_conflict() {
        e
    } else {
        match e {
            AuditProofError::ChainSubmission(_) => e,
            other => AuditProofError::ChainSubmission(other.to_string()),
        }
    }
}
