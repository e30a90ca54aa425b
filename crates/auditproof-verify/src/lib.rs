// crates/auditproof-verify/src/lib.rs
//
// auditproof-verify: Trusted-signer proof attestation and verification.
//
// A proof is valid iff one designated signer attested to a domain-separated
// digest over the proof's identity, parties, content, and public inputs.
// This is a single point of trust, not a zero-knowledge system: soundness
// rests entirely on the secrecy of that one key.

pub mod prover;
pub mod verifier;

// Re-export key types for ergonomic access from downstream crates.
pub use prover::TrustedProver;
pub use verifier::{proof_digest, SignatureVerifier};
