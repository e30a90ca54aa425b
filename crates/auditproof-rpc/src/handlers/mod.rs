// crates/auditproof-rpc/src/handlers/mod.rs
//
// Handler modules for all RPC endpoints.
// Each module defines request/response types and handler functions
// for a specific API group.

pub mod admin;
pub mod applications;
pub mod chain;
pub mod credentials;
pub mod metrics;
pub mod node;
pub mod proofs;
