// crates/auditproof-cli/src/commands/proof.rs
//
// `auditproof proof {generate, verify}`.

use std::fs;

use auditproof_core::credential::Proof;
use clap::Subcommand;
use serde_json::{json, Value};

use crate::output::{format_json, OutputFormat};
use crate::rpc_client::RpcClient;

/// Proof subcommands.
#[derive(Debug, Subcommand)]
pub enum ProofCmd {
    /// Generate a proof for a credential.
    Generate {
        credential_id: String,
        /// Write the generated proof JSON to this file.
        #[arg(long)]
        out: Option<String>,
    },
    /// Verify a proof and record the outcome on-chain.
    Verify {
        /// File holding a proof, or the output of `proof generate`.
        #[arg(long)]
        file: String,
        /// Verification status to record.
        #[arg(long)]
        status: String,
        /// Project address. Defaults to the proof's subject.
        #[arg(long)]
        project: Option<String>,
        /// Auditor address. Defaults to the proof's issuer.
        #[arg(long)]
        auditor: Option<String>,
        /// Credential the proof belongs to. Defaults to the one recorded
        /// alongside a generated proof.
        #[arg(long)]
        credential_id: Option<String>,
    },
}

/// Run the proof subcommand.
pub async fn run(
    client: &RpcClient,
    cmd: &ProofCmd,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        ProofCmd::Generate { credential_id, out } => {
            let generated: Value = client
                .call("proofs/generate", json!({ "credentialId": credential_id }))
                .await?;
            if let Some(path) = out {
                fs::write(path, format_json(&generated))?;
            }
            if format == OutputFormat::Json {
                println!("{}", format_json(&generated));
                return Ok(());
            }
            println!("Proof generated: {}", generated["proofId"].as_str().unwrap_or("-"));
            println!("  Credential:  {}", credential_id);
            println!("  Valid:       {}", generated["valid"]);
            println!("  Synthesized: {}", generated["synthesized"]);
            if let Some(path) = out {
                println!("  Saved to:    {}", path);
            }
        }
        ProofCmd::Verify {
            file,
            status,
            project,
            auditor,
            credential_id,
        } => {
            let contents: Value = serde_json::from_str(&fs::read_to_string(file)?)?;
            let (proof, recorded_credential) = read_proof(contents)?;

            let params = json!({
                "proof": proof,
                "project": project.clone().unwrap_or_else(|| proof.subject.to_string()),
                "auditor": auditor.clone().unwrap_or_else(|| proof.issuer.to_string()),
                "status": status,
                "credentialId": credential_id.clone().or(recorded_credential),
            });
            let result: Value = client.call("proofs/verify", params).await?;
            if format == OutputFormat::Json {
                println!("{}", format_json(&result));
                return Ok(());
            }
            println!("Verification recorded: {}", result["txHash"].as_str().unwrap_or("-"));
            println!("  Confirmed: {}", result["confirmed"]);
            if let Some(gas) = result["gasUsed"].as_u64() {
                println!("  Gas used:  {}", gas);
            }
        }
    }

    Ok(())
}

/// Accept either a bare proof or the envelope written by `proof generate`,
/// returning the proof and the credential id recorded with it.
fn read_proof(contents: Value) -> Result<(Proof, Option<String>), Box<dyn std::error::Error>> {
    match contents.get("proof") {
        Some(inner) if !inner.is_null() => {
            let credential_id = contents["credentialId"].as_str().map(str::to_string);
            Ok((serde_json::from_value(inner.clone())?, credential_id))
        }
        Some(_) => Err("Proof file has no attested proof; it cannot be recorded on-chain".into()),
        None => Ok((serde_json::from_value(contents)?, None)),
    }
}
