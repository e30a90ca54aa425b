// crates/auditproof-cli/src/commands/mod.rs
//
// Command module declarations for the auditproof CLI.

pub mod admin;
pub mod auditor;
pub mod credential;
pub mod key;
pub mod proof;
pub mod signing;
pub mod status;
