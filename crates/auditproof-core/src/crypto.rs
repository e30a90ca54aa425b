// crates/auditproof-core/src/crypto.rs

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use crate::error::AuditProofError;
use crate::types::{Address, Bytes32};

/// Length of a signer attestation: 32-byte public key followed by a
/// 64-byte ed25519 signature.
pub const ATTESTATION_LEN: usize = 96;

/// An ed25519 keypair for signing and verification.
pub struct Keypair {
    pub signing_key: SigningKey,
    pub verifying_key: VerifyingKey,
}

impl Keypair {
    /// Generate a new random ed25519 keypair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        let verifying_key = signing_key.verifying_key();
        Keypair {
            signing_key,
            verifying_key,
        }
    }

    /// Rebuild a keypair from its 32-byte secret.
    pub fn from_secret_bytes(secret: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(secret);
        let verifying_key = signing_key.verifying_key();
        Keypair {
            signing_key,
            verifying_key,
        }
    }

    /// Parse a hex-encoded secret key (optionally `0x`-prefixed, whitespace ignored).
    pub fn from_secret_hex(raw: &str) -> Result<Self, AuditProofError> {
        let cleaned: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        let body = cleaned.strip_prefix("0x").unwrap_or(&cleaned);
        let bytes = hex::decode(body)
            .map_err(|e| AuditProofError::Crypto(format!("Invalid secret key hex: {}", e)))?;
        let secret: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            AuditProofError::Crypto(format!(
                "Invalid secret key length: {} bytes (expected 32)",
                bytes.len()
            ))
        })?;
        Ok(Self::from_secret_bytes(&secret))
    }

    /// Get the public key bytes (32 bytes).
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.verifying_key.to_bytes()
    }

    /// The account address controlled by this keypair.
    pub fn address(&self) -> Address {
        address_from_public_key(&self.public_key_bytes())
    }

    /// Sign a message and return the signature bytes.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        let signature = self.signing_key.sign(message);
        signature.to_bytes().to_vec()
    }

    /// Sign a message and return a self-describing attestation
    /// (`public_key || signature`) from which the signer can be recovered.
    pub fn attest(&self, message: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(ATTESTATION_LEN);
        out.extend_from_slice(&self.public_key_bytes());
        out.extend_from_slice(&self.sign(message));
        out
    }
}

impl Clone for Keypair {
    fn clone(&self) -> Self {
        Keypair::from_secret_bytes(&self.signing_key.to_bytes())
    }
}

/// Derive an account address: the last 20 bytes of SHA-256(public key).
pub fn address_from_public_key(public_key: &[u8; 32]) -> Address {
    let digest = hash_bytes(public_key);
    let mut out = [0u8; 20];
    out.copy_from_slice(&digest[12..]);
    Address(out)
}

/// Verify an ed25519 signature.
///
/// Returns `true` if the signature is valid for the given message and public key.
pub fn verify_signature(
    public_key_bytes: &[u8; 32],
    message: &[u8],
    signature_bytes: &[u8],
) -> Result<bool, AuditProofError> {
    let verifying_key = VerifyingKey::from_bytes(public_key_bytes)
        .map_err(|e| AuditProofError::Crypto(format!("Invalid public key: {}", e)))?;

    let signature_array: [u8; 64] = signature_bytes
        .try_into()
        .map_err(|_| AuditProofError::Crypto("Signature must be exactly 64 bytes".to_string()))?;

    let signature = ed25519_dalek::Signature::from_bytes(&signature_array);

    match verifying_key.verify(message, &signature) {
        Ok(()) => Ok(true),
        Err(_) => Ok(false),
    }
}

/// Recover the signer address from an attestation over `message`.
///
/// Returns `None` when the attestation is malformed or its signature does not
/// verify under the embedded public key.
pub fn recover_signer(message: &[u8], attestation: &[u8]) -> Option<Address> {
    if attestation.len() != ATTESTATION_LEN {
        return None;
    }
    let mut public_key = [0u8; 32];
    public_key.copy_from_slice(&attestation[..32]);
    match verify_signature(&public_key, message, &attestation[32..]) {
        Ok(true) => Some(address_from_public_key(&public_key)),
        _ => None,
    }
}

/// Compute SHA-256 hash of the given bytes.
///
/// Returns a 32-byte hash.
pub fn hash_bytes(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Hash a UTF-8 identifier (credential or proof id) into a 32-byte word.
pub fn id_to_bytes32(id: &str) -> Bytes32 {
    Bytes32(hash_bytes(id.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypair_sign_verify() {
        let keypair = Keypair::generate();
        let message = b"hello auditproof";

        let signature = keypair.sign(message);
        let pubkey = keypair.public_key_bytes();

        let valid = verify_signature(&pubkey, message, &signature).unwrap();
        assert!(valid);

        // Verify wrong message fails
        let wrong_message = b"wrong message";
        let invalid = verify_signature(&pubkey, wrong_message, &signature).unwrap();
        assert!(!invalid);
    }

    #[test]
    fn test_recover_signer_returns_attesting_address() {
        let keypair = Keypair::generate();
        let attestation = keypair.attest(b"digest");
        assert_eq!(attestation.len(), ATTESTATION_LEN);
        assert_eq!(recover_signer(b"digest", &attestation), Some(keypair.address()));
        assert_eq!(recover_signer(b"other", &attestation), None);
        assert_eq!(recover_signer(b"digest", &attestation[..64]), None);
    }

    #[test]
    fn test_secret_hex_roundtrip_preserves_address() {
        let keypair = Keypair::generate();
        let encoded = format!("0x{}\n", hex::encode(keypair.signing_key.to_bytes()));
        let restored = Keypair::from_secret_hex(&encoded).unwrap();
        assert_eq!(restored.address(), keypair.address());
        assert!(Keypair::from_secret_hex("0xdead").is_err());
    }

    #[test]
    fn test_hash_bytes() {
        let data = b"auditproof";
        let hash = hash_bytes(data);
        assert_eq!(hash.len(), 32);

        // Same input should produce same hash
        let hash2 = hash_bytes(data);
        assert_eq!(hash, hash2);

        // Different input should produce different hash
        let hash3 = hash_bytes(b"different");
        assert_ne!(hash, hash3);
    }
}
