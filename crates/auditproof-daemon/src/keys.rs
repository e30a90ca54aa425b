// crates/auditproof-daemon/src/keys.rs
//
// Key files: a single line holding the hex-encoded 32-byte ed25519 secret.

use std::fs;
use std::path::Path;

use auditproof_core::crypto::Keypair;
use auditproof_core::error::AuditProofError;

/// Load the keypair stored at `path`, generating and saving a fresh one if
/// the file does not exist.
pub fn load_or_generate(path: &str, label: &str) -> Result<Keypair, AuditProofError> {
    let path = Path::new(path);
    if path.exists() {
        let raw = fs::read_to_string(path)?;
        let keypair = Keypair::from_secret_hex(&raw)?;
        tracing::info!("Loaded {} key {} from {}", label, keypair.address(), path.display());
        return Ok(keypair);
    }

    let keypair = Keypair::generate();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, format!("{}\n", hex::encode(keypair.signing_key.to_bytes())))?;
    tracing::warn!(
        "No {} key at {}; generated {}",
        label,
        path.display(),
        keypair.address()
    );
    Ok(keypair)
}
