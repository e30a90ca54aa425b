// crates/auditproof-store/src/applications.rs
//
// ApplicationStore: off-chain review records for auditor applications.
//
// Keyed by the lower-cased wallet address. Every read-modify-write runs
// under one async mutex and the snapshot is rewritten before the lock is
// released, so concurrent reviews of the same address are serialized
// instead of silently losing an update. A failed snapshot write rolls the
// table back, so memory never holds a record the file does not.

use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::Mutex;

use auditproof_core::auditor::{Application, ApplicationStatus};
use auditproof_core::error::AuditProofError;
use auditproof_core::types::Address;

use crate::snapshot::Snapshot;

/// Mutex-guarded application table with an optional JSON snapshot.
#[derive(Debug)]
pub struct ApplicationStore {
    snapshot: Option<Snapshot>,
    applications: Mutex<HashMap<String, Application>>,
}

impl ApplicationStore {
    /// A store with no backing file.
    pub fn in_memory() -> Self {
        Self {
            snapshot: None,
            applications: Mutex::new(HashMap::new()),
        }
    }

    /// Open the store backed by `snapshot`, loading any existing records.
    pub async fn open(snapshot: Snapshot) -> Result<Self, AuditProofError> {
        let records: Vec<Application> = snapshot.load().await?.unwrap_or_default();
        let applications = records
            .into_iter()
            .map(|app| (app.wallet_address.to_key(), app))
            .collect::<HashMap<_, _>>();
        tracing::info!(
            "Loaded {} application(s) from {}",
            applications.len(),
            snapshot.path().display()
        );
        Ok(Self {
            snapshot: Some(snapshot),
            applications: Mutex::new(applications),
        })
    }

    /// Submit an application for `wallet`.
    ///
    /// A new address gets a pending record. A pending record is returned
    /// unchanged. A rejected record is reset to pending. An approved record
    /// is a conflict.
    pub async fn submit(&self, wallet: Address) -> Result<Application, AuditProofError> {
        let mut applications = self.applications.lock().await;
        let key = wallet.to_key();
        let now = Utc::now();

        let record = match applications.get(&key) {
            Some(existing) if existing.status == ApplicationStatus::Approved => {
                return Err(AuditProofError::AlreadyApproved(wallet));
            }
            Some(existing) if existing.status == ApplicationStatus::Pending => {
                return Ok(existing.clone());
            }
            _ => Application::pending(wallet, now),
        };

        self.commit(&mut applications, key, record.clone()).await?;
        tracing::info!("Application submitted for {}", wallet);
        Ok(record)
    }

    /// Set the review outcome for `wallet`. Returns `None` when no
    /// application exists for that address.
    pub async fn mark_reviewed(
        &self,
        wallet: &Address,
        status: ApplicationStatus,
        reviewed_by: &str,
    ) -> Result<Option<Application>, AuditProofError> {
        let mut applications = self.applications.lock().await;
        let key = wallet.to_key();
        let Some(record) = applications.get(&key) else {
            return Ok(None);
        };
        let mut updated = record.clone();
        updated.status = status;
        updated.reviewed_at = Some(Utc::now());
        updated.reviewed_by = Some(reviewed_by.to_string());

        self.commit(&mut applications, key, updated.clone()).await?;
        tracing::debug!("Application {} marked {} by {}", wallet, status, reviewed_by);
        Ok(Some(updated))
    }

    pub async fn get(&self, wallet: &Address) -> Option<Application> {
        self.applications.lock().await.get(&wallet.to_key()).cloned()
    }

    /// All applications, optionally filtered by status, oldest first.
    pub async fn list(&self, status: Option<ApplicationStatus>) -> Vec<Application> {
        let applications = self.applications.lock().await;
        let mut records: Vec<Application> = applications
            .values()
            .filter(|app| status.map_or(true, |s| app.status == s))
            .cloned()
            .collect();
        records.sort_by(|a, b| {
            a.submitted_at
                .cmp(&b.submitted_at)
                .then_with(|| a.wallet_address.cmp(&b.wallet_address))
        });
        records
    }

    /// Install `record` and rewrite the snapshot, restoring the previous
    /// entry if the write fails.
    async fn commit(
        &self,
        applications: &mut HashMap<String, Application>,
        key: String,
        record: Application,
    ) -> Result<(), AuditProofError> {
        let previous = applications.insert(key.clone(), record);
        if let Err(e) = self.persist(applications).await {
            match previous {
                Some(previous) => applications.insert(key, previous),
                None => applications.remove(&key),
            };
            return Err(e);
        }
        Ok(())
    }

    async fn persist(&self, applications: &HashMap<String, Application>) -> Result<(), AuditProofError> {
        let Some(snapshot) = &self.snapshot else {
            return Ok(());
        };
        let mut records: Vec<&Application> = applications.values().collect();
        records.sort_by_key(|app| (app.submitted_at, app.wallet_address));
        snapshot.save(&records).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::test_util::{block_writes, temp_path};

    fn addr(byte: u8) -> Address {
        Address([byte; 20])
    }

    #[tokio::test]
    async fn test_submit_and_lookup_is_case_insensitive() {
        let store = ApplicationStore::in_memory();
        let wallet = Address::parse("0xAAA1000000000000000000000000000000000001").unwrap();
        store.submit(wallet).await.unwrap();

        let lower = Address::parse("0xaaa1000000000000000000000000000000000001").unwrap();
        let found = store.get(&lower).await.unwrap();
        assert_eq!(found.status, ApplicationStatus::Pending);
    }

    #[tokio::test]
    async fn test_submit_transitions() {
        let store = ApplicationStore::in_memory();
        let wallet = addr(1);

        let first = store.submit(wallet).await.unwrap();
        let again = store.submit(wallet).await.unwrap();
        assert_eq!(first, again);

        store
            .mark_reviewed(&wallet, ApplicationStatus::Rejected, "admin")
            .await
            .unwrap();
        let resubmitted = store.submit(wallet).await.unwrap();
        assert_eq!(resubmitted.status, ApplicationStatus::Pending);
        assert!(resubmitted.reviewed_by.is_none());

        store
            .mark_reviewed(&wallet, ApplicationStatus::Approved, "admin")
            .await
            .unwrap();
        assert!(matches!(
            store.submit(wallet).await,
            Err(AuditProofError::AlreadyApproved(_))
        ));
    }

    #[tokio::test]
    async fn test_mark_reviewed_unknown_address() {
        let store = ApplicationStore::in_memory();
        let outcome = store
            .mark_reviewed(&addr(9), ApplicationStatus::Rejected, "admin")
            .await
            .unwrap();
        assert!(outcome.is_none());
        assert!(store.list(None).await.is_empty());
    }

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let store = ApplicationStore::in_memory();
        for byte in 1..=3 {
            store.submit(addr(byte)).await.unwrap();
        }
        store
            .mark_reviewed(&addr(2), ApplicationStatus::Rejected, "admin")
            .await
            .unwrap();

        assert_eq!(store.list(None).await.len(), 3);
        assert_eq!(store.list(Some(ApplicationStatus::Pending)).await.len(), 2);
        let rejected = store.list(Some(ApplicationStatus::Rejected)).await;
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].wallet_address, addr(2));
        assert_eq!(rejected[0].reviewed_by.as_deref(), Some("admin"));
    }

    #[tokio::test]
    async fn test_snapshot_survives_reopen() {
        let path = temp_path("applications.json");
        {
            let store = ApplicationStore::open(Snapshot::new(&path)).await.unwrap();
            store.submit(addr(7)).await.unwrap();
            store
                .mark_reviewed(&addr(7), ApplicationStatus::Rejected, "reviewer-1")
                .await
                .unwrap();
        }
        let reopened = ApplicationStore::open(Snapshot::new(&path)).await.unwrap();
        let record = reopened.get(&addr(7)).await.unwrap();
        assert_eq!(record.status, ApplicationStatus::Rejected);
        assert_eq!(record.reviewed_by.as_deref(), Some("reviewer-1"));
    }

    #[tokio::test]
    async fn test_concurrent_reviews_do_not_lose_records() {
        let store = Arc::new(ApplicationStore::open(Snapshot::new(temp_path("apps.json"))).await.unwrap());
        for byte in 1..=16 {
            store.submit(addr(byte)).await.unwrap();
        }

        let mut handles = Vec::new();
        for byte in 1..=16u8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let status = if byte % 2 == 0 {
                    ApplicationStatus::Approved
                } else {
                    ApplicationStatus::Rejected
                };
                store.mark_reviewed(&addr(byte), status, "admin").await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.list(Some(ApplicationStatus::Approved)).await.len(), 8);
        assert_eq!(store.list(Some(ApplicationStatus::Rejected)).await.len(), 8);
        assert!(store.list(Some(ApplicationStatus::Pending)).await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_write_leaves_table_unchanged() {
        let path = temp_path("applications.json");
        let store = ApplicationStore::open(Snapshot::new(&path)).await.unwrap();
        store.submit(addr(1)).await.unwrap();
        block_writes(&path).await;

        let outcome = store
            .mark_reviewed(&addr(1), ApplicationStatus::Approved, "admin")
            .await;
        assert!(matches!(outcome, Err(AuditProofError::Storage(_))));
        let record = store.get(&addr(1)).await.unwrap();
        assert_eq!(record.status, ApplicationStatus::Pending);
        assert!(record.reviewed_by.is_none());

        assert!(store.submit(addr(2)).await.is_err());
        assert!(store.get(&addr(2)).await.is_none());
        assert_eq!(store.list(None).await.len(), 1);
    }
}
