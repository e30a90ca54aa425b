// crates/auditproof-store/src/credentials.rs
//
// CredentialStore: issued credentials keyed by credential id, in issue order.

use chrono::Utc;
use tokio::sync::Mutex;

use auditproof_core::credential::Credential;
use auditproof_core::error::AuditProofError;
use auditproof_core::types::Address;

use crate::snapshot::Snapshot;

/// Optional filters for [`CredentialStore::list`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CredentialFilter {
    pub issuer: Option<Address>,
    pub subject: Option<Address>,
}

impl CredentialFilter {
    fn matches(&self, credential: &Credential) -> bool {
        self.issuer.map_or(true, |issuer| credential.issuer == issuer)
            && self.subject.map_or(true, |subject| credential.subject == subject)
    }
}

#[derive(Debug)]
pub struct CredentialStore {
    snapshot: Option<Snapshot>,
    credentials: Mutex<Vec<Credential>>,
}

impl CredentialStore {
    pub fn in_memory() -> Self {
        Self {
            snapshot: None,
            credentials: Mutex::new(Vec::new()),
        }
    }

    pub async fn open(snapshot: Snapshot) -> Result<Self, AuditProofError> {
        let credentials: Vec<Credential> = snapshot.load().await?.unwrap_or_default();
        tracing::info!(
            "Loaded {} credential(s) from {}",
            credentials.len(),
            snapshot.path().display()
        );
        Ok(Self {
            snapshot: Some(snapshot),
            credentials: Mutex::new(credentials),
        })
    }

    /// Insert or replace a credential by id. `created_at` is stamped on first
    /// insert and kept on replacement; `updated_at` is stamped on every write.
    /// Nothing changes in memory unless the snapshot write succeeds.
    pub async fn upsert(&self, mut credential: Credential) -> Result<Credential, AuditProofError> {
        let mut credentials = self.credentials.lock().await;
        let now = Utc::now();
        credential.updated_at = Some(now);

        let position = credentials.iter().position(|c| c.id == credential.id);
        let previous = match position {
            Some(index) => {
                credential.created_at = credentials[index].created_at.or(Some(now));
                Some(std::mem::replace(&mut credentials[index], credential.clone()))
            }
            None => {
                credential.created_at = Some(now);
                credentials.push(credential.clone());
                None
            }
        };

        if let Some(snapshot) = &self.snapshot {
            if let Err(e) = snapshot.save(&*credentials).await {
                match (position, previous) {
                    (Some(index), Some(previous)) => credentials[index] = previous,
                    _ => {
                        credentials.pop();
                    }
                }
                return Err(e);
            }
        }
        tracing::debug!("Stored credential {}", credential.id);
        Ok(credential)
    }

    pub async fn get(&self, id: &str) -> Option<Credential> {
        if id.is_empty() {
            return None;
        }
        self.credentials
            .lock()
            .await
            .iter()
            .find(|c| c.id == id)
            .cloned()
    }

    /// Credentials matching `filter`, in issue order.
    pub async fn list(&self, filter: CredentialFilter) -> Vec<Credential> {
        self.credentials
            .lock()
            .await
            .iter()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auditproof_core::types::Bytes32;

    use crate::test_util::{block_writes, temp_path};

    fn credential(id: &str, issuer: u8, subject: u8) -> Credential {
        Credential {
            id: id.to_string(),
            issuer: Address([issuer; 20]),
            subject: Address([subject; 20]),
            summary_hash: Bytes32([0xcc; 32]),
            status: "Verified".to_string(),
            issued_at: Utc::now(),
            on_chain_id: None,
            synthesized: false,
            created_at: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_upsert_stamps_timestamps() {
        let store = CredentialStore::in_memory();
        let first = store.upsert(credential("cred-1", 1, 2)).await.unwrap();
        assert!(first.created_at.is_some());
        assert_eq!(first.created_at, first.updated_at);

        let mut changed = credential("cred-1", 1, 2);
        changed.status = "Revised".to_string();
        let second = store.upsert(changed).await.unwrap();
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.status, "Revised");
        assert_eq!(store.list(CredentialFilter::default()).await.len(), 1);
    }

    #[tokio::test]
    async fn test_get_and_filters() {
        let store = CredentialStore::in_memory();
        store.upsert(credential("a", 1, 2)).await.unwrap();
        store.upsert(credential("b", 1, 3)).await.unwrap();
        store.upsert(credential("c", 4, 2)).await.unwrap();

        assert_eq!(store.get("b").await.unwrap().subject, Address([3; 20]));
        assert!(store.get("missing").await.is_none());
        assert!(store.get("").await.is_none());

        let by_issuer = store
            .list(CredentialFilter {
                issuer: Some(Address([1; 20])),
                subject: None,
            })
            .await;
        assert_eq!(
            by_issuer.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(),
            vec!["a", "b"]
        );

        let both = store
            .list(CredentialFilter {
                issuer: Some(Address([4; 20])),
                subject: Some(Address([2; 20])),
            })
            .await;
        assert_eq!(both.len(), 1);
        assert_eq!(both[0].id, "c");
    }

    #[tokio::test]
    async fn test_snapshot_survives_reopen() {
        let path = temp_path("credentials.json");
        {
            let store = CredentialStore::open(Snapshot::new(&path)).await.unwrap();
            store.upsert(credential("persisted", 1, 2)).await.unwrap();
        }
        let reopened = CredentialStore::open(Snapshot::new(&path)).await.unwrap();
        assert!(reopened.get("persisted").await.is_some());
    }

    #[tokio::test]
    async fn test_failed_write_keeps_previous_version() {
        let path = temp_path("credentials.json");
        let store = CredentialStore::open(Snapshot::new(&path)).await.unwrap();
        store.upsert(credential("kept", 1, 2)).await.unwrap();
        block_writes(&path).await;

        let mut changed = credential("kept", 1, 2);
        changed.status = "Revised".to_string();
        assert!(store.upsert(changed).await.is_err());
        assert_eq!(store.get("kept").await.unwrap().status, "Verified");

        assert!(store.upsert(credential("fresh", 1, 3)).await.is_err());
        assert!(store.get("fresh").await.is_none());
        assert_eq!(store.list(CredentialFilter::default()).await.len(), 1);
    }
}
