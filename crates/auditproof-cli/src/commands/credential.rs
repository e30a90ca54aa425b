// crates/auditproof-cli/src/commands/credential.rs
//
// `auditproof credential {issue, get, list, anchor}`.
//
// Issuance goes through the daemon's issuer. Anchoring is signed locally
// with the auditor's key, since the ledger only accepts anchors sent by
// the approved auditor themselves.

use std::fs;

use auditproof_core::chain::ContractCall;
use auditproof_core::crypto::{hash_bytes, id_to_bytes32};
use auditproof_core::types::{Address, Bytes32};
use clap::Subcommand;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tabled::Tabled;

use super::signing::{load_key, sign_and_send};
use crate::output::{abbreviate, format_json, format_table, OutputFormat};
use crate::rpc_client::RpcClient;

/// Credential subcommands.
#[derive(Debug, Subcommand)]
pub enum CredentialCmd {
    /// Issue an audit credential for a project.
    Issue {
        /// Auditor address issuing the credential.
        #[arg(long)]
        issuer: String,
        /// Project address the credential is about.
        #[arg(long)]
        subject: String,
        /// Verification status, e.g. "Verified - No Critical Issues".
        #[arg(long)]
        status: String,
        /// 0x-prefixed SHA-256 of the audit summary.
        #[arg(long, conflicts_with = "summary_file")]
        summary_hash: Option<String>,
        /// Audit summary document to hash.
        #[arg(long)]
        summary_file: Option<String>,
    },
    /// Get a credential by id.
    Get {
        id: String,
    },
    /// List credentials, optionally filtered by issuer or subject.
    List {
        #[arg(long)]
        issuer: Option<String>,
        #[arg(long)]
        subject: Option<String>,
    },
    /// Anchor a credential on-chain. Signed with your auditor key.
    Anchor {
        /// Off-chain credential id.
        id: String,
        /// Auditor key file (default: ~/.auditproof/keys/auditor.key).
        #[arg(long)]
        key: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CredentialView {
    id: String,
    issuer: String,
    subject: String,
    summary_hash: String,
    status: String,
    #[serde(default)]
    on_chain_id: Option<String>,
    #[serde(default)]
    synthesized: bool,
}

#[derive(Debug, Deserialize)]
struct CredentialListView {
    count: usize,
    credentials: Vec<CredentialView>,
}

#[derive(Tabled)]
struct CredentialRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Issuer")]
    issuer: String,
    #[tabled(rename = "Subject")]
    subject: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Local")]
    synthesized: bool,
}

impl From<&CredentialView> for CredentialRow {
    fn from(c: &CredentialView) -> Self {
        Self {
            id: c.id.clone(),
            issuer: abbreviate(&c.issuer),
            subject: abbreviate(&c.subject),
            status: c.status.clone(),
            synthesized: c.synthesized,
        }
    }
}

/// Run the credential subcommand.
pub async fn run(
    client: &RpcClient,
    cmd: &CredentialCmd,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        CredentialCmd::Issue {
            issuer,
            subject,
            status,
            summary_hash,
            summary_file,
        } => {
            let summary_hash = match (summary_hash, summary_file) {
                (Some(hash), _) => hash.clone(),
                (None, Some(path)) => Bytes32(hash_bytes(&fs::read(path)?)).to_string(),
                (None, None) => return Err("One of --summary-hash or --summary-file is required".into()),
            };
            let credential: CredentialView = client
                .call(
                    "credentials/issue",
                    json!({
                        "issuer": issuer,
                        "subject": subject,
                        "summaryHash": summary_hash,
                        "status": status,
                    }),
                )
                .await?;
            if format == OutputFormat::Json {
                println!("{}", format_json(&credential));
            } else {
                println!("Credential issued: {}", credential.id);
                if credential.synthesized {
                    println!("  Note: issuer unavailable; credential synthesized locally.");
                }
                println!("  Anchor it with `auditproof credential anchor {}`", credential.id);
            }
        }
        CredentialCmd::Get { id } => {
            let credential: CredentialView =
                client.call("credentials/get", json!({ "id": id })).await?;
            if format == OutputFormat::Json {
                println!("{}", format_json(&credential));
            } else {
                println!("Credential {}", credential.id);
                println!("  Issuer:       {}", credential.issuer);
                println!("  Subject:      {}", credential.subject);
                println!("  Status:       {}", credential.status);
                println!("  Summary hash: {}", credential.summary_hash);
                println!("  Synthesized:  {}", credential.synthesized);
            }
        }
        CredentialCmd::List { issuer, subject } => {
            let result: Value = client
                .call("credentials/list", json!({ "issuer": issuer, "subject": subject }))
                .await?;
            if format == OutputFormat::Json {
                println!("{}", format_json(&result));
                return Ok(());
            }
            let list: CredentialListView = serde_json::from_value(result)?;
            if list.count == 0 {
                println!("No credentials found.");
            } else {
                let rows: Vec<CredentialRow> = list.credentials.iter().map(Into::into).collect();
                println!("{}", format_table(&rows));
                println!("{} credential(s)", list.count);
            }
        }
        CredentialCmd::Anchor { id, key } => {
            let keypair = load_key(key.as_deref())?;
            let credential: CredentialView =
                client.call("credentials/get", json!({ "id": id })).await?;

            let call = anchor_call(&credential, &keypair.address().to_string())?;
            let sent = sign_and_send(client, &keypair, call).await?;
            println!("Credential {} anchored by {}", credential.id, sent.from);
            println!("  Transaction: {}", sent.tx_hash);
        }
    }

    Ok(())
}

/// Build the anchor call for `credential` as sent by `sender`.
fn anchor_call(credential: &CredentialView, sender: &str) -> Result<ContractCall, Box<dyn std::error::Error>> {
    if !credential.issuer.eq_ignore_ascii_case(sender) {
        return Err(format!(
            "Credential {} was issued by {}, not by this key ({})",
            credential.id, credential.issuer, sender
        )
        .into());
    }
    let credential_id = match &credential.on_chain_id {
        Some(raw) => Bytes32::parse(raw)?,
        None => id_to_bytes32(&credential.id),
    };
    Ok(ContractCall::AnchorCredential {
        credential_id,
        summary_hash: Bytes32::parse(&credential.summary_hash)?,
        auditor: Address::parse(sender)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(issuer: &str) -> CredentialView {
        CredentialView {
            id: "cred-1".to_string(),
            issuer: issuer.to_string(),
            subject: "0x2222222222222222222222222222222222222222".to_string(),
            summary_hash: format!("0x{}", "ab".repeat(32)),
            status: "Verified".to_string(),
            on_chain_id: None,
            synthesized: false,
        }
    }

    #[test]
    fn test_anchor_call_uses_hashed_id() {
        let sender = "0x1111111111111111111111111111111111111111";
        let call = anchor_call(&view(sender), sender).unwrap();
        match call {
            ContractCall::AnchorCredential { credential_id, .. } => {
                assert_eq!(credential_id, id_to_bytes32("cred-1"));
            }
            other => panic!("unexpected call {:?}", other),
        }
    }

    #[test]
    fn test_anchor_call_rejects_foreign_credential() {
        let issuer = "0x1111111111111111111111111111111111111111";
        let other = "0x3333333333333333333333333333333333333333";
        assert!(anchor_call(&view(issuer), other).is_err());
    }
}
