// crates/auditproof-cli/src/commands/signing.rs
//
// Client-side signing: calls that must come from the auditor's own
// identity are signed locally and relayed through `chain/send-transaction`.

use std::fs;

use auditproof_core::chain::{ContractCall, SignedCall};
use auditproof_core::crypto::Keypair;
use serde::Deserialize;
use serde_json::json;

use crate::rpc_client::RpcClient;

#[derive(Debug, Deserialize)]
struct NonceResponse {
    nonce: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentTransaction {
    pub tx_hash: String,
    pub from: String,
}

pub fn default_key_path() -> Result<String, Box<dyn std::error::Error>> {
    let home = dirs::home_dir().ok_or("Could not determine home directory")?;
    Ok(home
        .join(".auditproof")
        .join("keys")
        .join("auditor.key")
        .to_string_lossy()
        .to_string())
}

/// Load the key at `path`, or the default auditor key.
pub fn load_key(path: Option<&str>) -> Result<Keypair, Box<dyn std::error::Error>> {
    let path = match path {
        Some(p) => p.to_string(),
        None => default_key_path()?,
    };
    let raw = fs::read_to_string(&path)
        .map_err(|e| format!("Could not read key {}: {}", path, e))?;
    Ok(Keypair::from_secret_hex(&raw)?)
}

/// Fetch the signer's next nonce, sign `call`, and submit it.
pub async fn sign_and_send(
    client: &RpcClient,
    keypair: &Keypair,
    call: ContractCall,
) -> Result<SentTransaction, Box<dyn std::error::Error>> {
    let address = keypair.address();
    let nonce: NonceResponse = client
        .call("chain/nonce", json!({ "address": address.to_string() }))
        .await?;

    let signed = SignedCall::sign(keypair, call, nonce.nonce)?;
    let sent: SentTransaction = client
        .call("chain/send-transaction", json!({ "signedCall": signed }))
        .await?;
    Ok(sent)
}
