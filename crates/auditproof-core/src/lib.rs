// crates/auditproof-core/src/lib.rs
//
// auditproof-core: Core types, traits, and crypto primitives for the
// auditproof trust pipeline.
//
// This is the leaf crate that all other crates in the workspace depend on.
// It defines addresses and fixed-width words, the auditor / credential /
// proof data model, contract calls and events, the protocol-wide error
// type, and the chain client trait the orchestration layer drives.

pub mod auditor;
pub mod chain;
pub mod credential;
pub mod crypto;
pub mod error;
pub mod metrics;
pub mod traits;
pub mod types;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use auditproof_core::Address;`

// Primitive types
pub use types::{Address, Bytes32, TxHash};

// Auditor admission types
pub use auditor::{Application, ApplicationStatus, Auditor};

// Credential and proof types
pub use credential::{AnchorRecord, Credential, Proof, VerificationRecord};

// Chain types
pub use chain::{
    ChainEvent, Confirmation, ContractCall, Receipt, RecordVerificationCall, SignedCall,
};

// Metrics types
pub use metrics::{MetricKind, MetricSample};

// Error type
pub use error::AuditProofError;

// Traits
pub use traits::{ChainClient, ProofVerifier};
