// crates/auditproof-cli/src/commands/key.rs
//
// `auditproof key {generate, show}`: local ed25519 key files.

use std::fs;
use std::path::Path;

use auditproof_core::crypto::Keypair;
use clap::Subcommand;

use super::signing::{default_key_path, load_key};

/// Key management subcommands.
#[derive(Debug, Subcommand)]
pub enum KeyCmd {
    /// Generate a new keypair and save its hex-encoded secret.
    Generate {
        /// Destination file (default: ~/.auditproof/keys/auditor.key).
        #[arg(long)]
        path: Option<String>,
        /// Overwrite an existing key file.
        #[arg(long)]
        force: bool,
    },
    /// Print the address of a saved key.
    Show {
        #[arg(long)]
        path: Option<String>,
    },
}

/// Run the key subcommand.
pub async fn run(cmd: &KeyCmd) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        KeyCmd::Generate { path, force } => {
            let path = path.clone().map_or_else(default_key_path, Ok)?;
            generate(Path::new(&path), *force)
        }
        KeyCmd::Show { path } => {
            let keypair = load_key(path.as_deref())?;
            println!("Address:    {}", keypair.address());
            println!("Public key: 0x{}", hex::encode(keypair.public_key_bytes()));
            Ok(())
        }
    }
}

fn generate(path: &Path, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() && !force {
        return Err(format!(
            "{} already exists; pass --force to overwrite",
            path.display()
        )
        .into());
    }

    let keypair = Keypair::generate();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, hex::encode(keypair.signing_key.to_bytes()))?;

    println!("Key created successfully.");
    println!("  Address: {}", keypair.address());
    println!("  Saved to: {}", path.display());
    println!();
    println!("IMPORTANT: Back up your secret key file securely.");
    Ok(())
}
