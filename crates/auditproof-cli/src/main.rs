// crates/auditproof-cli/src/main.rs
//
// CLI entrypoint for the auditproof operator tools.
//
// Provides subcommands for reviewing auditor applications, issuing and
// anchoring credentials, generating and verifying proofs, managing keys,
// and viewing node health and pipeline metrics.

mod commands;
mod output;
mod rpc_client;

use clap::{Parser, Subcommand};
use commands::admin::AdminCmd;
use commands::auditor::AuditorCmd;
use commands::credential::CredentialCmd;
use commands::key::KeyCmd;
use commands::proof::ProofCmd;
use output::OutputFormat;
use rpc_client::RpcClient;

/// auditproof CLI: operator tools for the auditor trust pipeline.
#[derive(Parser, Debug)]
#[command(
    name = "auditproof",
    version = "0.1.0",
    about = "auditproof CLI: auditor admission, credentials, and proof verification"
)]
struct Cli {
    /// RPC endpoint for the auditproof-daemon.
    #[arg(long, global = true, default_value = "http://127.0.0.1:50061")]
    rpc: String,

    /// Print raw JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Key management: generate, show.
    #[command(subcommand)]
    Key(KeyCmd),

    /// Admin review: approve, reject, applications, revoke.
    #[command(subcommand)]
    Admin(AdminCmd),

    /// Submit an auditor application for a wallet.
    Apply {
        /// Wallet address of the applicant.
        address: String,
    },

    /// Auditor records: list, get, profile.
    #[command(subcommand)]
    Auditor(AuditorCmd),

    /// Credentials: issue, get, list, anchor.
    #[command(subcommand)]
    Credential(CredentialCmd),

    /// Proofs: generate, verify.
    #[command(subcommand)]
    Proof(ProofCmd),

    /// Display proof generation and verification metrics.
    Metrics,

    /// Display daemon health and deployment addresses.
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = RpcClient::new(&cli.rpc);
    let format = OutputFormat::from_flag(cli.json);

    match &cli.command {
        Commands::Key(cmd) => commands::key::run(cmd).await?,
        Commands::Admin(cmd) => commands::admin::run(&client, cmd, format).await?,
        Commands::Apply { address } => commands::admin::apply(&client, address, format).await?,
        Commands::Auditor(cmd) => commands::auditor::run(&client, cmd, format).await?,
        Commands::Credential(cmd) => commands::credential::run(&client, cmd, format).await?,
        Commands::Proof(cmd) => commands::proof::run(&client, cmd, format).await?,
        Commands::Metrics => commands::status::metrics(&client, format).await?,
        Commands::Health => commands::status::health(&client, format).await?,
    }

    Ok(())
}
