// crates/auditproof-orchestrator/src/lib.rs
//
// auditproof-orchestrator: the service layer between the RPC surface and
// the chain.
//
// One SigningContext is built at startup and shared by every service that
// sends transactions. Admission returns as soon as an approval is accepted
// and hands the rest to the Finalizer's worker pool; issuance falls back to
// locally synthesized credentials and proofs; verification checks a proof
// locally before recording it on-chain.

pub mod admission;
pub mod finalizer;
pub mod issuance;
pub mod issuer;
pub mod signing;
pub mod verification;

// Re-export key types for ergonomic access from downstream crates.
pub use admission::{AdmissionService, ApplicationList, ApproveRequest, ApproveResponse};
pub use finalizer::{
    BackgroundError, FinalizeJob, FinalizeReport, Finalizer, FinalizerConfig, FinalizerHandle,
    RetryPolicy, Stage,
};
pub use issuance::IssuanceService;
pub use issuer::{Air3Issuer, Air3Settings, CredentialIssuer, GeneratedProof, IssueRequest, IssuedCredential};
pub use signing::SigningContext;
pub use verification::{VerificationService, VerifyRequest, VerifyResponse};
