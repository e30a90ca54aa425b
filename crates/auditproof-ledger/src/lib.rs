// crates/auditproof-ledger/src/lib.rs
//
// auditproof-ledger: the on-chain half of the trust pipeline.
//
// AuditorRegistry owns auditor admission state. CredentialLedger owns
// credential anchors and verification records and is the only writer of
// auditor credential counts. LocalChain hosts both behind the ChainClient
// trait, authenticating signed calls and modelling confirmation latency.

pub mod ledger;
pub mod local_chain;
pub mod registry;

pub use ledger::CredentialLedger;
pub use local_chain::{ChainConfig, ChainInfo, LocalChain};
pub use registry::AuditorRegistry;
