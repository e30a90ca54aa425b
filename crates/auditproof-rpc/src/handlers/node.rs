// crates/auditproof-rpc/src/handlers/node.rs
//
// Node health handler: GetHealth.

use serde::{Deserialize, Serialize};

use auditproof_core::error::AuditProofError;
use auditproof_core::types::Address;
use auditproof_ledger::LocalChain;

/// Request for node health status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetHealthRequest {}

/// Response containing node health status.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetHealthResponse {
    /// Overall health: "ok".
    pub status: String,
    /// Software version.
    pub version: String,
    /// Network label of the chain.
    pub network: String,
    pub registry_address: Address,
    pub ledger_address: Address,
    /// The signer whose attestations the ledger accepts.
    pub trusted_signer: Address,
    /// Registry administrator allowed to approve and revoke auditors.
    pub admin: Address,
    pub block_number: u64,
    /// Every address the registry has ever seen.
    pub auditor_count: usize,
    pub approved_auditor_count: usize,
}

pub async fn handle_get_health(
    chain: &LocalChain,
    _request: GetHealthRequest,
) -> Result<GetHealthResponse, AuditProofError> {
    let info = chain.info().await;
    let auditor_count = chain.all_auditors().await.len();
    let approved_auditor_count = chain.approved_auditor_count().await;
    Ok(GetHealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        network: info.network,
        registry_address: info.registry_address,
        ledger_address: info.ledger_address,
        trusted_signer: info.trusted_signer,
        admin: chain.admin().await,
        block_number: info.block_number,
        auditor_count,
        approved_auditor_count,
    })
}
