// crates/auditproof-ledger/src/ledger.rs
//
// CredentialLedger: credential anchoring and verification recording.
//
// Anchoring records a credential's existence and issuing auditor once per
// id and bumps the auditor's credential count through the registry. It is
// the only writer of that counter. Verification recording checks a proof
// attestation through the configured ProofVerifier and overwrites the
// project's current VerificationRecord. Every check runs before any state
// changes, so a failed call leaves the ledger untouched.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use auditproof_core::chain::{ChainEvent, RecordVerificationCall};
use auditproof_core::credential::{AnchorRecord, Proof, VerificationRecord};
use auditproof_core::error::AuditProofError;
use auditproof_core::traits::ProofVerifier;
use auditproof_core::types::{Address, Bytes32};

use crate::registry::AuditorRegistry;

/// Owns anchor and verification records.
pub struct CredentialLedger {
    /// The ledger's own address, as registered with the auditor registry.
    address: Address,
    verifier: Arc<dyn ProofVerifier>,
    anchors: HashMap<Bytes32, AnchorRecord>,
    verifications: HashMap<Address, VerificationRecord>,
    events: Vec<ChainEvent>,
}

impl CredentialLedger {
    pub fn new(address: Address, verifier: Arc<dyn ProofVerifier>) -> Self {
        Self {
            address,
            verifier,
            anchors: HashMap::new(),
            verifications: HashMap::new(),
            events: Vec::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// `anchorCredential(bytes32,bytes32,address)`.
    pub fn anchor_credential(
        &mut self,
        registry: &mut AuditorRegistry,
        caller: &Address,
        credential_id: Bytes32,
        summary_hash: Bytes32,
        auditor: Address,
        now: DateTime<Utc>,
    ) -> Result<(), AuditProofError> {
        if !registry.is_approved_auditor(caller) {
            return Err(AuditProofError::NotApproved(*caller));
        }
        if auditor.is_zero() {
            return Err(AuditProofError::Validation("Invalid address".to_string()));
        }
        if self.anchors.contains_key(&credential_id) {
            return Err(AuditProofError::AlreadyAnchored(credential_id));
        }

        // The increment is the last fallible step; nothing has been written yet.
        registry.increment_credential_count(&self.address, auditor)?;

        self.anchors.insert(
            credential_id,
            AnchorRecord {
                credential_id,
                auditor,
                summary_hash,
                anchored_at: now,
            },
        );
        self.events.push(ChainEvent::CredentialAnchored {
            credential_id,
            auditor,
            summary_hash,
            at: now,
        });
        Ok(())
    }

    /// `recordVerification(address,address,string,bytes32,bytes32,bytes,uint256[],bytes)`.
    ///
    /// The proof is checked with `issuer = auditor` and `subject = project`.
    /// The auditor must be currently approved. Anchoring is not required;
    /// when the credential is anchored its summary hash is reported in the
    /// `ProofValidated` event.
    pub fn record_verification(
        &mut self,
        registry: &AuditorRegistry,
        call: &RecordVerificationCall,
        now: DateTime<Utc>,
    ) -> Result<(), AuditProofError> {
        if call.project.is_zero() || call.auditor.is_zero() {
            return Err(AuditProofError::Validation("Invalid address".to_string()));
        }
        if call.status.is_empty() {
            return Err(AuditProofError::Validation(
                "Status cannot be empty".to_string(),
            ));
        }
        if !registry.is_approved_auditor(&call.auditor) {
            return Err(AuditProofError::NotApproved(call.auditor));
        }

        let proof = Proof {
            proof_id: call.proof_id,
            issuer: call.auditor,
            subject: call.project,
            proof_bytes: call.proof_bytes.clone(),
            public_inputs: call.public_inputs.clone(),
            signature: call.signature.clone(),
        };
        if !self.verifier.verify_proof(&proof) {
            return Err(AuditProofError::InvalidProof(
                "Proof was not attested by the trusted signer".to_string(),
            ));
        }

        let summary_hash = self
            .anchors
            .get(&call.credential_id)
            .map(|anchor| anchor.summary_hash);
        self.verifications.insert(
            call.project,
            VerificationRecord {
                project: call.project,
                auditor: call.auditor,
                status: call.status.clone(),
                verified_at: now,
            },
        );
        self.events.push(ChainEvent::ProofValidated {
            proof_id: call.proof_id,
            credential_id: call.credential_id,
            project: call.project,
            auditor: call.auditor,
            summary_hash,
            at: now,
        });
        self.events.push(ChainEvent::VerificationRecorded {
            project: call.project,
            auditor: call.auditor,
            status: call.status.clone(),
            at: now,
        });
        Ok(())
    }

    /// `isVerified(address)`.
    pub fn is_verified(&self, project: &Address) -> bool {
        self.verifications.contains_key(project)
    }

    /// `getAuditor(address)`. The null address for unverified projects.
    pub fn get_auditor(&self, project: &Address) -> Address {
        self.verifications
            .get(project)
            .map(|record| record.auditor)
            .unwrap_or(Address::ZERO)
    }

    /// The current verification record for `project`, if any.
    pub fn verification(&self, project: &Address) -> Option<&VerificationRecord> {
        self.verifications.get(project)
    }

    /// `isCredentialAnchored(bytes32)`.
    pub fn is_credential_anchored(&self, credential_id: &Bytes32) -> bool {
        self.anchors.contains_key(credential_id)
    }

    pub fn anchor(&self, credential_id: &Bytes32) -> Option<&AnchorRecord> {
        self.anchors.get(credential_id)
    }

    /// Take the events emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<ChainEvent> {
        std::mem::take(&mut self.events)
    }
}
