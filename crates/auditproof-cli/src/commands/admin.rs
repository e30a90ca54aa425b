// crates/auditproof-cli/src/commands/admin.rs
//
// `auditproof admin {approve, reject, applications, revoke}` and
// `auditproof apply`: the admission workflow.

use clap::Subcommand;
use serde::Deserialize;
use serde_json::{json, Value};
use tabled::Tabled;

use crate::output::{abbreviate, format_json, format_table, OutputFormat};
use crate::rpc_client::RpcClient;

/// Admin review subcommands.
#[derive(Debug, Subcommand)]
pub enum AdminCmd {
    /// Approve an auditor on-chain. Scoring and the credibility credential
    /// follow in the background.
    Approve {
        /// Auditor wallet address.
        address: String,
        #[arg(long)]
        github: Option<String>,
        #[arg(long)]
        code4rena: Option<String>,
        #[arg(long)]
        immunefi: Option<String>,
    },
    /// Reject a pending application.
    Reject {
        address: String,
    },
    /// List applications, optionally filtered by status.
    Applications {
        /// Filter by status: pending, approved, rejected.
        #[arg(long)]
        status: Option<String>,
    },
    /// Revoke an approved auditor.
    Revoke {
        address: String,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApplicationView {
    wallet_address: String,
    status: String,
    submitted_at: String,
    #[serde(default)]
    reviewed_by: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApplicationListView {
    count: usize,
    applications: Vec<ApplicationView>,
}

#[derive(Tabled)]
struct ApplicationRow {
    #[tabled(rename = "Wallet")]
    wallet: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Submitted")]
    submitted: String,
    #[tabled(rename = "Reviewed by")]
    reviewed_by: String,
}

impl From<&ApplicationView> for ApplicationRow {
    fn from(app: &ApplicationView) -> Self {
        Self {
            wallet: app.wallet_address.clone(),
            status: app.status.clone(),
            submitted: app.submitted_at.clone(),
            reviewed_by: app.reviewed_by.clone().unwrap_or_else(|| "-".to_string()),
        }
    }
}

/// Run the admin subcommand.
pub async fn run(
    client: &RpcClient,
    cmd: &AdminCmd,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        AdminCmd::Approve {
            address,
            github,
            code4rena,
            immunefi,
        } => {
            let result: Value = client
                .call(
                    "admin/approve-auditor",
                    json!({
                        "auditorAddress": address,
                        "githubHandle": github,
                        "code4renaHandle": code4rena,
                        "immunefiHandle": immunefi,
                    }),
                )
                .await?;
            if format == OutputFormat::Json {
                println!("{}", format_json(&result));
            } else {
                println!("Auditor approved: {}", address);
                println!("  Transaction: {}", result["txHash"].as_str().unwrap_or("-"));
                if let Some(message) = result["message"].as_str() {
                    println!("  {}", message);
                }
            }
        }
        AdminCmd::Reject { address } => {
            let result: Value = client
                .call("admin/reject-application", json!({ "walletAddress": address }))
                .await?;
            if format == OutputFormat::Json {
                println!("{}", format_json(&result));
            } else {
                println!("Application rejected: {}", address);
            }
        }
        AdminCmd::Applications { status } => {
            let result: Value = client
                .call("admin/applications", json!({ "status": status }))
                .await?;
            if format == OutputFormat::Json {
                println!("{}", format_json(&result));
                return Ok(());
            }
            let list: ApplicationListView = serde_json::from_value(result)?;
            if list.count == 0 {
                println!("No applications found.");
            } else {
                let rows: Vec<ApplicationRow> = list.applications.iter().map(Into::into).collect();
                println!("{}", format_table(&rows));
                println!("{} application(s)", list.count);
            }
        }
        AdminCmd::Revoke { address } => {
            let result: Value = client
                .call("admin/revoke-auditor", json!({ "auditorAddress": address }))
                .await?;
            if format == OutputFormat::Json {
                println!("{}", format_json(&result));
            } else {
                println!("Auditor revoked: {}", address);
                println!(
                    "  Transaction: {}",
                    abbreviate(result["txHash"].as_str().unwrap_or("-"))
                );
            }
        }
    }

    Ok(())
}

/// Run `auditproof apply`.
pub async fn apply(
    client: &RpcClient,
    address: &str,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let result: Value = client
        .call("applications/submit", json!({ "walletAddress": address }))
        .await?;
    if format == OutputFormat::Json {
        println!("{}", format_json(&result));
    } else {
        println!(
            "Application for {} is {}",
            address,
            result["status"].as_str().unwrap_or("unknown")
        );
    }
    Ok(())
}
