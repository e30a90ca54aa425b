// crates/auditproof-verify/src/prover.rs
//
// TrustedProver: the signing side of the trusted-signer scheme.
//
// Holds the one key whose attestations SignatureVerifier accepts. Used by
// the daemon's local fallback when the external issuer is unreachable, and
// by tests to produce correctly signed fixtures.

use rand::RngCore;

use auditproof_core::credential::{Credential, Proof};
use auditproof_core::crypto::Keypair;
use auditproof_core::types::{Address, Bytes32};

use crate::verifier::proof_digest;

/// Size of the opaque proof blob produced for locally attested credentials.
const PROOF_BLOB_LEN: usize = 128;

/// Produces proof attestations for a single verifier context.
pub struct TrustedProver {
    keypair: Keypair,
    context_id: Bytes32,
}

impl TrustedProver {
    /// Create a prover signing for the verifier bound to `context_id`.
    pub fn new(keypair: Keypair, context_id: Bytes32) -> Self {
        Self {
            keypair,
            context_id,
        }
    }

    /// The signer address a verifier must trust to accept this prover's proofs.
    pub fn address(&self) -> Address {
        self.keypair.address()
    }

    pub fn context_id(&self) -> Bytes32 {
        self.context_id
    }

    /// Attest to a proof over the given fields.
    pub fn prove(
        &self,
        proof_id: Bytes32,
        issuer: Address,
        subject: Address,
        proof_bytes: Vec<u8>,
        public_inputs: Vec<Bytes32>,
    ) -> Proof {
        let digest = proof_digest(
            &self.context_id,
            &proof_id,
            &issuer,
            &subject,
            &proof_bytes,
            &public_inputs,
        );
        let signature = self.keypair.attest(digest.as_bytes());
        Proof {
            proof_id,
            issuer,
            subject,
            proof_bytes,
            public_inputs,
            signature,
        }
    }

    /// Attest to a credential under `proof_id` with a fresh random blob and
    /// public inputs `[subject, issuer, summary_hash]`.
    pub fn prove_credential(&self, proof_id: Bytes32, credential: &Credential) -> Proof {
        let mut blob = vec![0u8; PROOF_BLOB_LEN];
        rand::thread_rng().fill_bytes(&mut blob);

        self.prove(
            proof_id,
            credential.issuer,
            credential.subject,
            blob,
            credential_public_inputs(credential),
        )
    }
}

/// Public inputs bound into a credential proof.
pub fn credential_public_inputs(credential: &Credential) -> Vec<Bytes32> {
    vec![
        credential.subject.to_word(),
        credential.issuer.to_word(),
        credential.summary_hash,
    ]
}
