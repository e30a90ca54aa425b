// crates/auditproof-ledger/src/local_chain.rs
//
// LocalChain: an in-process chain hosting the auditor registry and the
// credential ledger behind the ChainClient trait.
//
// Submission authenticates the SignedCall, enforces the sender's next
// sequence number, and executes the call against a single state lock. A
// call that fails is rejected at submission and does not consume a nonce.
// Accepted calls are sealed into their own block; confirmation becomes
// observable `block_time` after acceptance, which lets callers exercise the
// bounded confirmation wait.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::time::Instant;

use auditproof_core::auditor::Auditor;
use auditproof_core::chain::{Confirmation, ContractCall, Receipt, SignedCall};
use auditproof_core::crypto::hash_bytes;
use auditproof_core::credential::{AnchorRecord, VerificationRecord};
use auditproof_core::error::AuditProofError;
use auditproof_core::traits::ChainClient;
use auditproof_core::types::{Address, Bytes32, TxHash};
use auditproof_verify::SignatureVerifier;

use crate::ledger::CredentialLedger;
use crate::registry::AuditorRegistry;

/// Parameters for a LocalChain deployment.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// Network label reported by health checks.
    pub network: String,
    /// Delay between acceptance of a transaction and its confirmation.
    pub block_time: Duration,
    /// Deployment label hashed into the verifier context id.
    pub verifier_context: String,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            network: "local".to_string(),
            block_time: Duration::from_millis(500),
            verifier_context: "auditproof-local".to_string(),
        }
    }
}

/// Static deployment facts, as reported by `node/health`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainInfo {
    pub network: String,
    pub registry_address: Address,
    pub ledger_address: Address,
    pub trusted_signer: Address,
    pub block_number: u64,
}

struct PendingTx {
    receipt: Receipt,
    confirms_at: Instant,
}

struct ChainState {
    registry: AuditorRegistry,
    ledger: CredentialLedger,
    nonces: HashMap<Address, u64>,
    transactions: HashMap<TxHash, PendingTx>,
    block_number: u64,
}

/// In-process chain implementing [`ChainClient`].
pub struct LocalChain {
    state: RwLock<ChainState>,
    network: String,
    block_time: Duration,
    registry_address: Address,
    ledger_address: Address,
    verifier: SignatureVerifier,
}

impl LocalChain {
    /// Deploy the registry (administered by `admin`) and the ledger (trusting
    /// `trusted_signer`), and link the ledger into the registry.
    pub fn genesis(
        admin: Address,
        trusted_signer: Address,
        config: ChainConfig,
    ) -> Result<Self, AuditProofError> {
        let registry_address = contract_address(&admin, "AuditorRegistry");
        let ledger_address = contract_address(&admin, "CredentialLedger");
        let verifier = SignatureVerifier::for_deployment(&config.verifier_context, trusted_signer);

        let mut registry = AuditorRegistry::new(admin);
        registry.set_credential_ledger(&admin, ledger_address)?;
        registry.drain_events();
        let ledger = CredentialLedger::new(ledger_address, std::sync::Arc::new(verifier.clone()));

        tracing::info!(
            "Local chain '{}' deployed: registry={} ledger={} trusted_signer={}",
            config.network,
            registry_address,
            ledger_address,
            trusted_signer
        );

        Ok(Self {
            state: RwLock::new(ChainState {
                registry,
                ledger,
                nonces: HashMap::new(),
                transactions: HashMap::new(),
                block_number: 0,
            }),
            network: config.network,
            block_time: config.block_time,
            registry_address,
            ledger_address,
            verifier,
        })
    }

    pub fn registry_address(&self) -> Address {
        self.registry_address
    }

    pub fn ledger_address(&self) -> Address {
        self.ledger_address
    }

    /// The verifier the ledger checks proofs against.
    pub fn verifier(&self) -> &SignatureVerifier {
        &self.verifier
    }

    pub async fn info(&self) -> ChainInfo {
        let state = self.state.read().await;
        ChainInfo {
            network: self.network.clone(),
            registry_address: self.registry_address,
            ledger_address: self.ledger_address,
            trusted_signer: self.verifier.trusted_signer(),
            block_number: state.block_number,
        }
    }

    pub async fn block_number(&self) -> u64 {
        self.state.read().await.block_number
    }

    pub async fn admin(&self) -> Address {
        self.state.read().await.registry.admin()
    }

    /// `getAllAuditors()`.
    pub async fn all_auditors(&self) -> Vec<Address> {
        self.state.read().await.registry.get_all_auditors()
    }

    /// `getApprovedAuditorCount()`.
    pub async fn approved_auditor_count(&self) -> usize {
        self.state.read().await.registry.get_approved_auditor_count()
    }

    /// `getAuditor(address)`.
    pub async fn get_auditor(&self, project: &Address) -> Address {
        self.state.read().await.ledger.get_auditor(project)
    }

    pub async fn verification(&self, project: &Address) -> Option<VerificationRecord> {
        self.state.read().await.ledger.verification(project).cloned()
    }

    pub async fn anchor(&self, credential_id: &Bytes32) -> Option<AnchorRecord> {
        self.state.read().await.ledger.anchor(credential_id).cloned()
    }
}

/// Execute `call` as `sender`. Registry and ledger both validate before
/// mutating, so an error here leaves state unchanged.
fn execute(
    state: &mut ChainState,
    sender: &Address,
    call: &ContractCall,
) -> Result<(), AuditProofError> {
    let now = Utc::now();
    match call {
        ContractCall::ApproveAuditor { auditor } => {
            state.registry.approve_auditor(sender, *auditor, now)
        }
        ContractCall::RevokeAuditor { auditor } => {
            state.registry.revoke_auditor(sender, *auditor, now)
        }
        ContractCall::UpdateAuditorProfile {
            github,
            code4rena,
            immunefi,
        } => state
            .registry
            .update_auditor_profile(sender, github, code4rena, immunefi),
        ContractCall::UpdateCredibilityScore { auditor, score } => {
            state
                .registry
                .update_credibility_score(sender, *auditor, *score)
        }
        ContractCall::TransferAdmin { new_admin } => {
            state.registry.transfer_admin(sender, *new_admin)
        }
        ContractCall::SetCredentialLedger { ledger } => {
            state.registry.set_credential_ledger(sender, *ledger)
        }
        ContractCall::AnchorCredential {
            credential_id,
            summary_hash,
            auditor,
        } => state.ledger.anchor_credential(
            &mut state.registry,
            sender,
            *credential_id,
            *summary_hash,
            *auditor,
            now,
        ),
        ContractCall::RecordVerification(args) => {
            state.ledger.record_verification(&state.registry, args, now)
        }
    }
}

#[async_trait]
impl ChainClient for LocalChain {
    async fn auditor_info(&self, auditor: &Address) -> Result<Auditor, AuditProofError> {
        Ok(self.state.read().await.registry.get_auditor_info(auditor))
    }

    async fn is_verified(&self, project: &Address) -> Result<bool, AuditProofError> {
        Ok(self.state.read().await.ledger.is_verified(project))
    }

    async fn is_credential_anchored(&self, credential_id: &Bytes32) -> Result<bool, AuditProofError> {
        Ok(self.state.read().await.ledger.is_credential_anchored(credential_id))
    }

    async fn next_nonce(&self, account: &Address) -> Result<u64, AuditProofError> {
        Ok(self
            .state
            .read()
            .await
            .nonces
            .get(account)
            .copied()
            .unwrap_or(0))
    }

    async fn submit(&self, signed: SignedCall) -> Result<TxHash, AuditProofError> {
        let sender = signed.sender()?;
        let tx_hash = signed.tx_hash()?;
        let gas_used = signed.call.gas_cost()?;

        let mut guard = self.state.write().await;
        let state = &mut *guard;

        let expected = state.nonces.get(&sender).copied().unwrap_or(0);
        if signed.nonce != expected {
            return Err(AuditProofError::ChainSubmission(format!(
                "Nonce mismatch for {}: expected {}, got {}",
                sender, expected, signed.nonce
            )));
        }

        execute(state, &sender, &signed.call)?;

        let mut events = state.registry.drain_events();
        events.extend(state.ledger.drain_events());
        state.nonces.insert(sender, expected + 1);
        state.block_number += 1;

        let receipt = Receipt {
            tx_hash,
            from: sender,
            nonce: signed.nonce,
            block_number: state.block_number,
            gas_used,
            events,
            submitted_at: Utc::now(),
        };
        state.transactions.insert(
            tx_hash,
            PendingTx {
                receipt,
                confirms_at: Instant::now() + self.block_time,
            },
        );

        tracing::debug!(
            "Accepted {} from {} (nonce {}, block {}, tx {})",
            signed.call.signature(),
            sender,
            signed.nonce,
            state.block_number,
            tx_hash
        );
        Ok(tx_hash)
    }

    async fn receipt(&self, tx_hash: &TxHash) -> Result<Option<Receipt>, AuditProofError> {
        Ok(self
            .state
            .read()
            .await
            .transactions
            .get(tx_hash)
            .map(|tx| tx.receipt.clone()))
    }

    async fn wait_for_confirmation(
        &self,
        tx_hash: &TxHash,
        timeout: Duration,
    ) -> Result<Confirmation, AuditProofError> {
        let (confirms_at, block_number) = {
            let state = self.state.read().await;
            let tx = state
                .transactions
                .get(tx_hash)
                .ok_or_else(|| AuditProofError::NotFound(format!("Transaction {}", tx_hash)))?;
            (tx.confirms_at, tx.receipt.block_number)
        };

        match tokio::time::timeout(timeout, tokio::time::sleep_until(confirms_at)).await {
            Ok(()) => Ok(Confirmation::Confirmed { block_number }),
            Err(_) => Ok(Confirmation::TimedOut),
        }
    }
}

/// Deterministic contract address for a deployment by `deployer`.
fn contract_address(deployer: &Address, contract: &str) -> Address {
    let mut data = deployer.0.to_vec();
    data.extend_from_slice(contract.as_bytes());
    let digest = hash_bytes(&data);
    let mut out = [0u8; 20];
    out.copy_from_slice(&digest[12..]);
    Address(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use auditproof_core::chain::ChainEvent;
    use auditproof_core::crypto::Keypair;

    fn chain(admin: &Keypair, block_time: Duration) -> LocalChain {
        LocalChain::genesis(
            admin.address(),
            Keypair::generate().address(),
            ChainConfig {
                block_time,
                ..ChainConfig::default()
            },
        )
        .unwrap()
    }

    async fn send(chain: &LocalChain, keypair: &Keypair, call: ContractCall) -> Result<TxHash, AuditProofError> {
        let nonce = chain.next_nonce(&keypair.address()).await?;
        chain.submit(SignedCall::sign(keypair, call, nonce)?).await
    }

    #[tokio::test]
    async fn test_submit_executes_and_produces_receipt() {
        let admin = Keypair::generate();
        let chain = chain(&admin, Duration::from_millis(10));
        let auditor = Address([0xa1; 20]);

        let tx = send(&chain, &admin, ContractCall::ApproveAuditor { auditor })
            .await
            .unwrap();
        assert!(chain.auditor_info(&auditor).await.unwrap().is_approved);

        let receipt = chain.receipt(&tx).await.unwrap().unwrap();
        assert_eq!(receipt.from, admin.address());
        assert_eq!(receipt.block_number, 1);
        assert!(receipt.gas_used > 21_000);
        assert!(matches!(
            receipt.events.as_slice(),
            [ChainEvent::AuditorApproved { auditor: a, .. }] if *a == auditor
        ));
        assert_eq!(chain.next_nonce(&admin.address()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_reverted_call_does_not_consume_nonce() {
        let admin = Keypair::generate();
        let chain = chain(&admin, Duration::from_millis(10));
        let auditor = Address([0xa1; 20]);

        send(&chain, &admin, ContractCall::ApproveAuditor { auditor })
            .await
            .unwrap();
        let err = send(&chain, &admin, ContractCall::ApproveAuditor { auditor })
            .await
            .unwrap_err();
        assert!(matches!(err, AuditProofError::AlreadyApproved(_)));
        assert_eq!(chain.next_nonce(&admin.address()).await.unwrap(), 1);
        assert_eq!(chain.block_number().await, 1);
    }

    #[tokio::test]
    async fn test_stale_nonce_is_rejected() {
        let admin = Keypair::generate();
        let chain = chain(&admin, Duration::from_millis(10));
        let call = ContractCall::ApproveAuditor {
            auditor: Address([0xa1; 20]),
        };
        let signed = SignedCall::sign(&admin, call, 5).unwrap();
        assert!(matches!(
            chain.submit(signed).await,
            Err(AuditProofError::ChainSubmission(_))
        ));
    }

    #[tokio::test]
    async fn test_non_admin_sender_is_recovered_from_signature() {
        let admin = Keypair::generate();
        let outsider = Keypair::generate();
        let chain = chain(&admin, Duration::from_millis(10));
        let err = send(
            &chain,
            &outsider,
            ContractCall::ApproveAuditor {
                auditor: outsider.address(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AuditProofError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_genesis_links_ledger_for_anchoring() {
        let admin = Keypair::generate();
        let auditor = Keypair::generate();
        let chain = chain(&admin, Duration::from_millis(10));
        send(
            &chain,
            &admin,
            ContractCall::ApproveAuditor {
                auditor: auditor.address(),
            },
        )
        .await
        .unwrap();

        let id = Bytes32([5u8; 32]);
        send(
            &chain,
            &auditor,
            ContractCall::AnchorCredential {
                credential_id: id,
                summary_hash: Bytes32([6u8; 32]),
                auditor: auditor.address(),
            },
        )
        .await
        .unwrap();

        assert!(chain.is_credential_anchored(&id).await.unwrap());
        assert_eq!(
            chain.auditor_info(&auditor.address()).await.unwrap().credential_count,
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirmation_respects_block_time() {
        let admin = Keypair::generate();
        let chain = chain(&admin, Duration::from_secs(120));
        let tx = send(
            &chain,
            &admin,
            ContractCall::ApproveAuditor {
                auditor: Address([0xa1; 20]),
            },
        )
        .await
        .unwrap();

        let first = chain
            .wait_for_confirmation(&tx, Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(first, Confirmation::TimedOut);

        let second = chain
            .wait_for_confirmation(&tx, Duration::from_secs(120))
            .await
            .unwrap();
        assert_eq!(second, Confirmation::Confirmed { block_number: 1 });
    }

    #[tokio::test]
    async fn test_unknown_transaction_wait_is_not_found() {
        let admin = Keypair::generate();
        let chain = chain(&admin, Duration::from_millis(10));
        assert!(matches!(
            chain
                .wait_for_confirmation(&Bytes32([1u8; 32]), Duration::from_secs(1))
                .await,
            Err(AuditProofError::NotFound(_))
        ));
    }
}
