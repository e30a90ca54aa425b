// crates/auditproof-store/src/lib.rs
//
// auditproof-store: Off-chain bookkeeping for the auditproof daemon.
//
// Application review records, issued credentials, and metric sample
// windows. Each store is an in-process, mutex-guarded table that rewrites
// a whole-file JSON snapshot on every mutation. None of them is
// authoritative for on-chain state.

pub mod applications;
pub mod credentials;
pub mod metrics;
pub mod snapshot;

// Re-export key types for ergonomic access from downstream crates.
pub use applications::ApplicationStore;
pub use credentials::{CredentialFilter, CredentialStore};
pub use metrics::{MetricsAggregator, MetricsReport, DEFAULT_WINDOW};
pub use snapshot::Snapshot;

#[cfg(test)]
pub(crate) mod test_util {
    use std::path::{Path, PathBuf};

    /// A fresh path under the system temp directory.
    pub fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("auditproof-test-{}", uuid::Uuid::new_v4()))
            .join(name)
    }

    /// Replace the directory holding `path` with a plain file so that any
    /// later snapshot write fails, regardless of the caller's privileges.
    pub async fn block_writes(path: &Path) {
        let dir = path.parent().unwrap();
        if dir.exists() {
            tokio::fs::remove_dir_all(dir).await.unwrap();
        }
        tokio::fs::write(dir, b"").await.unwrap();
    }
}
