// crates/auditproof-cli/src/commands/auditor.rs
//
// `auditproof auditor {list, get, profile}`: on-chain auditor records.

use auditproof_core::chain::ContractCall;
use clap::Subcommand;
use serde::Deserialize;
use serde_json::{json, Value};
use tabled::Tabled;

use super::signing::{load_key, sign_and_send};
use crate::output::{abbreviate, format_json, format_table, OutputFormat};
use crate::rpc_client::RpcClient;

/// Auditor subcommands.
#[derive(Debug, Subcommand)]
pub enum AuditorCmd {
    /// List every registry entry, revoked ones included.
    List {
        /// Only show currently approved auditors.
        #[arg(long)]
        approved: bool,
    },
    /// Show an auditor's on-chain record.
    Get {
        address: String,
    },
    /// Update your own profile handles. Signed with your auditor key.
    Profile {
        #[arg(long, default_value = "")]
        github: String,
        #[arg(long, default_value = "")]
        code4rena: String,
        #[arg(long, default_value = "")]
        immunefi: String,
        /// Auditor key file (default: ~/.auditproof/keys/auditor.key).
        #[arg(long)]
        key: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuditorView {
    address: String,
    is_approved: bool,
    credibility_score: u64,
    credential_count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuditorListView {
    count: usize,
    approved_count: usize,
    auditors: Vec<AuditorView>,
}

#[derive(Tabled)]
struct AuditorRow {
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Approved")]
    approved: bool,
    #[tabled(rename = "Score")]
    score: u64,
    #[tabled(rename = "Credentials")]
    credentials: u64,
}

impl From<&AuditorView> for AuditorRow {
    fn from(auditor: &AuditorView) -> Self {
        Self {
            address: abbreviate(&auditor.address),
            approved: auditor.is_approved,
            score: auditor.credibility_score,
            credentials: auditor.credential_count,
        }
    }
}

/// Run the auditor subcommand.
pub async fn run(
    client: &RpcClient,
    cmd: &AuditorCmd,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        AuditorCmd::List { approved } => {
            let result: Value = client
                .call("auditors/list", json!({ "approvedOnly": approved }))
                .await?;
            if format == OutputFormat::Json {
                println!("{}", format_json(&result));
                return Ok(());
            }
            let list: AuditorListView = serde_json::from_value(result)?;
            if list.auditors.is_empty() {
                println!("No auditors registered.");
            } else {
                let rows: Vec<AuditorRow> = list.auditors.iter().map(AuditorRow::from).collect();
                println!("{}", format_table(&rows));
                println!("{} listed, {} approved", list.count, list.approved_count);
            }
        }
        AuditorCmd::Get { address } => {
            let auditor: Value = client.call("auditors/get", json!({ "address": address })).await?;
            if format == OutputFormat::Json {
                println!("{}", format_json(&auditor));
                return Ok(());
            }
            println!("Auditor {}", address);
            println!("-------");
            println!("  Approved:          {}", auditor["isApproved"]);
            println!("  Credibility score: {}", auditor["credibilityScore"]);
            println!("  Credentials:       {}", auditor["credentialCount"]);
            for (label, field) in [
                ("GitHub", "githubHandle"),
                ("Code4rena", "code4renaHandle"),
                ("Immunefi", "immunefiHandle"),
            ] {
                if let Some(handle) = auditor[field].as_str().filter(|h| !h.is_empty()) {
                    println!("  {:<18} {}", format!("{}:", label), handle);
                }
            }
        }
        AuditorCmd::Profile {
            github,
            code4rena,
            immunefi,
            key,
        } => {
            let keypair = load_key(key.as_deref())?;
            let sent = sign_and_send(
                client,
                &keypair,
                ContractCall::UpdateAuditorProfile {
                    github: github.clone(),
                    code4rena: code4rena.clone(),
                    immunefi: immunefi.clone(),
                },
            )
            .await?;
            println!("Profile update sent from {}", sent.from);
            println!("  Transaction: {}", sent.tx_hash);
        }
    }

    Ok(())
}
