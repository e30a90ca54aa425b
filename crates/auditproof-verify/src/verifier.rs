// crates/auditproof-verify/src/verifier.rs
//
// SignatureVerifier: implements the ProofVerifier trait from auditproof-core.
//
// Digest layout (each field a 32-byte word):
//   proof_hash  = H(proof_bytes)
//   inputs_hash = H(len || input_0 || ... || input_n)
//   digest      = H(context_id || proof_id || issuer || subject || proof_hash || inputs_hash)
//
// `context_id` binds the digest to one verifier deployment so an
// attestation cannot be replayed against another.

use sha2::{Digest, Sha256};

use auditproof_core::crypto::{hash_bytes, recover_signer};
use auditproof_core::credential::Proof;
use auditproof_core::traits::ProofVerifier;
use auditproof_core::types::{Address, Bytes32};

/// Domain prefix hashed with a deployment label to form a context id.
const CONTEXT_DOMAIN: &[u8] = b"auditproof-verifier-v1:";

/// Verifies proof attestations against a single trusted signer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureVerifier {
    context_id: Bytes32,
    trusted_signer: Address,
}

impl SignatureVerifier {
    /// Create a verifier bound to `context_id` that trusts `trusted_signer`.
    pub fn new(context_id: Bytes32, trusted_signer: Address) -> Self {
        Self {
            context_id,
            trusted_signer,
        }
    }

    /// Create a verifier whose context id is derived from a deployment label.
    pub fn for_deployment(label: &str, trusted_signer: Address) -> Self {
        Self::new(context_id_for(label), trusted_signer)
    }

    pub fn context_id(&self) -> Bytes32 {
        self.context_id
    }

    pub fn trusted_signer(&self) -> Address {
        self.trusted_signer
    }

    /// `verify(bytes32,address,address,bytes,uint256[],bytes) -> bool`.
    ///
    /// Returns `true` iff the signer recovered from `signature` over the
    /// digest is the trusted signer. Malformed signatures yield `false`.
    pub fn verify(
        &self,
        proof_id: &Bytes32,
        issuer: &Address,
        subject: &Address,
        proof_bytes: &[u8],
        public_inputs: &[Bytes32],
        signature: &[u8],
    ) -> bool {
        let digest = proof_digest(
            &self.context_id,
            proof_id,
            issuer,
            subject,
            proof_bytes,
            public_inputs,
        );
        match recover_signer(digest.as_bytes(), signature) {
            Some(signer) => signer == self.trusted_signer,
            None => false,
        }
    }
}

impl ProofVerifier for SignatureVerifier {
    fn verify_proof(&self, proof: &Proof) -> bool {
        self.verify(
            &proof.proof_id,
            &proof.issuer,
            &proof.subject,
            &proof.proof_bytes,
            &proof.public_inputs,
            &proof.signature,
        )
    }
}

/// Derive a verifier context id from a deployment label.
pub fn context_id_for(label: &str) -> Bytes32 {
    let mut data = CONTEXT_DOMAIN.to_vec();
    data.extend_from_slice(label.as_bytes());
    Bytes32(hash_bytes(&data))
}

/// Compute the domain-separated digest the trusted signer attests to.
pub fn proof_digest(
    context_id: &Bytes32,
    proof_id: &Bytes32,
    issuer: &Address,
    subject: &Address,
    proof_bytes: &[u8],
    public_inputs: &[Bytes32],
) -> Bytes32 {
    let proof_hash = hash_bytes(proof_bytes);
    let inputs_hash = hash_bytes(&encode_inputs(public_inputs));

    let mut hasher = Sha256::new();
    hasher.update(context_id.as_bytes());
    hasher.update(proof_id.as_bytes());
    hasher.update(issuer.to_word().as_bytes());
    hasher.update(subject.to_word().as_bytes());
    hasher.update(proof_hash);
    hasher.update(inputs_hash);
    let result = hasher.finalize();
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&result);
    Bytes32(digest)
}

/// Length-prefixed word array encoding of the public inputs.
fn encode_inputs(public_inputs: &[Bytes32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(32 * (public_inputs.len() + 1));
    out.extend_from_slice(Bytes32::from_u64(public_inputs.len() as u64).as_bytes());
    for input in public_inputs {
        out.extend_from_slice(input.as_bytes());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prover::TrustedProver;
    use auditproof_core::crypto::Keypair;

    fn setup() -> (SignatureVerifier, TrustedProver, Proof) {
        let prover = TrustedProver::new(Keypair::generate(), context_id_for("test"));
        let verifier = SignatureVerifier::for_deployment("test", prover.address());
        let issuer = Address([0x11; 20]);
        let subject = Address([0x22; 20]);
        let proof = prover.prove(
            Bytes32([0x33; 32]),
            issuer,
            subject,
            vec![0x5a; 128],
            vec![issuer.to_word(), subject.to_word(), Bytes32::from_u64(1)],
        );
        (verifier, prover, proof)
    }

    fn flip_first_bit(bytes: &mut [u8]) {
        bytes[0] ^= 0x01;
    }

    #[test]
    fn test_accepts_proof_signed_by_trusted_signer() {
        let (verifier, _, proof) = setup();
        assert!(verifier.verify_proof(&proof));
    }

    #[test]
    fn test_rejects_proof_signed_by_unknown_signer() {
        let (verifier, prover, proof) = setup();
        let impostor = TrustedProver::new(Keypair::generate(), prover.context_id());
        let forged = impostor.prove(
            proof.proof_id,
            proof.issuer,
            proof.subject,
            proof.proof_bytes.clone(),
            proof.public_inputs.clone(),
        );
        assert!(!verifier.verify_proof(&forged));
    }

    #[test]
    fn test_every_field_is_bound_by_the_signature() {
        let (verifier, _, proof) = setup();

        let mut p = proof.clone();
        flip_first_bit(&mut p.proof_bytes);
        assert!(!verifier.verify_proof(&p), "proof bytes");

        let mut p = proof.clone();
        flip_first_bit(&mut p.public_inputs[2].0);
        assert!(!verifier.verify_proof(&p), "public inputs");

        let mut p = proof.clone();
        flip_first_bit(&mut p.proof_id.0);
        assert!(!verifier.verify_proof(&p), "proof id");

        let mut p = proof.clone();
        flip_first_bit(&mut p.issuer.0);
        assert!(!verifier.verify_proof(&p), "issuer");

        let mut p = proof.clone();
        flip_first_bit(&mut p.subject.0);
        assert!(!verifier.verify_proof(&p), "subject");

        let mut p = proof;
        p.public_inputs.push(Bytes32::ZERO);
        assert!(!verifier.verify_proof(&p), "appended input");
    }

    #[test]
    fn test_context_id_prevents_cross_deployment_replay() {
        let (_, prover, proof) = setup();
        let other = SignatureVerifier::for_deployment("other", prover.address());
        assert!(!other.verify_proof(&proof));
    }

    #[test]
    fn test_malformed_signature_returns_false() {
        let (verifier, _, mut proof) = setup();
        proof.signature = vec![0xde, 0xad];
        assert!(!verifier.verify_proof(&proof));
        proof.signature = Vec::new();
        assert!(!verifier.verify_proof(&proof));
    }
}
