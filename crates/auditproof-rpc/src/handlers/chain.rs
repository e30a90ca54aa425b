// crates/auditproof-rpc/src/handlers/chain.rs
//
// Chain access handlers: GetNonce, SendTransaction, GetReceipt, GetAuditor,
// ListAuditors.
//
// Calls sent here are signed by the client. The chain recovers the sender
// from the attestation, so these handlers never act on the daemon's own
// identity.

use serde::{Deserialize, Serialize};

use auditproof_core::auditor::Auditor;
use auditproof_core::chain::{Receipt, SignedCall};
use auditproof_core::error::AuditProofError;
use auditproof_core::traits::ChainClient;
use auditproof_core::types::{Address, Bytes32, TxHash};
use auditproof_ledger::LocalChain;

// ---------------------------------------------------------------------------
// GetNonce
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetNonceRequest {
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetNonceResponse {
    pub address: Address,
    pub nonce: u64,
}

pub async fn handle_get_nonce(
    chain: &dyn ChainClient,
    request: GetNonceRequest,
) -> Result<GetNonceResponse, AuditProofError> {
    let address = Address::parse(&request.address)?;
    let nonce = chain.next_nonce(&address).await?;
    Ok(GetNonceResponse { address, nonce })
}

// ---------------------------------------------------------------------------
// SendTransaction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendTransactionRequest {
    pub signed_call: SignedCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendTransactionResponse {
    pub tx_hash: TxHash,
    pub from: Address,
}

pub async fn handle_send_transaction(
    chain: &dyn ChainClient,
    request: SendTransactionRequest,
) -> Result<SendTransactionResponse, AuditProofError> {
    let from = request.signed_call.sender()?;
    let method = request.signed_call.call.signature();
    let tx_hash = chain.submit(request.signed_call).await?;
    tracing::info!("{} tx from {} accepted: {}", method, from, tx_hash);
    Ok(SendTransactionResponse { tx_hash, from })
}

// ---------------------------------------------------------------------------
// GetReceipt
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetReceiptRequest {
    #[serde(default)]
    pub tx_hash: String,
}

pub async fn handle_get_receipt(
    chain: &dyn ChainClient,
    request: GetReceiptRequest,
) -> Result<Receipt, AuditProofError> {
    let tx_hash = Bytes32::parse(&request.tx_hash)?;
    chain
        .receipt(&tx_hash)
        .await?
        .ok_or_else(|| AuditProofError::NotFound(format!("Transaction {}", tx_hash)))
}

// ---------------------------------------------------------------------------
// GetAuditor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetAuditorRequest {
    #[serde(default)]
    pub address: String,
}

pub async fn handle_get_auditor(
    chain: &dyn ChainClient,
    request: GetAuditorRequest,
) -> Result<Auditor, AuditProofError> {
    let address = Address::parse(&request.address)?;
    chain.auditor_info(&address).await
}

// ---------------------------------------------------------------------------
// ListAuditors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAuditorsRequest {
    /// Skip addresses whose approval has been revoked.
    #[serde(default)]
    pub approved_only: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAuditorsResponse {
    pub count: usize,
    pub approved_count: usize,
    pub auditors: Vec<Auditor>,
}

/// Lists registry entries in the order they were first approved.
pub async fn handle_list_auditors(
    chain: &LocalChain,
    request: ListAuditorsRequest,
) -> Result<ListAuditorsResponse, AuditProofError> {
    let mut auditors = Vec::new();
    for address in chain.all_auditors().await {
        let auditor = chain.auditor_info(&address).await?;
        if request.approved_only && !auditor.is_approved {
            continue;
        }
        auditors.push(auditor);
    }
    Ok(ListAuditorsResponse {
        count: auditors.len(),
        approved_count: chain.approved_auditor_count().await,
        auditors,
    })
}
