//! Pending verification repository implementation

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::models::PendingVerification;

#[derive(Debug, Default)]
pub struct PendingRepository {
    entries: RwLock<HashMap<i64, PendingVerification>>,
}

impl PendingRepository {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Replace the in-memory collection with freshly loaded entries.
    pub async fn load_from(&self, entries: HashMap<i64, PendingVerification>) {
        *self.entries.write().await = entries;
    }

    pub async fn get(&self, user_id: i64) -> Option<PendingVerification> {
        self.entries.read().await.get(&user_id).cloned()
    }

    /// Insert or overwrite the pending entry for an identity.
    pub async fn put(&self, user_id: i64, pending: PendingVerification) {
        self.entries.write().await.insert(user_id, pending);
    }

    pub async fn delete(&self, user_id: i64) -> Option<PendingVerification> {
        self.entries.write().await.remove(&user_id)
    }

    pub async fn snapshot(&self) -> HashMap<i64, PendingVerification> {
        self.entries.read().await.clone()
    }

    /// All open entries sorted by identity, for admin listings.
    pub async fn list(&self) -> Vec<(i64, PendingVerification)> {
        let mut entries: Vec<_> = self
            .entries
            .read()
            .await
            .iter()
            .map(|(id, pending)| (*id, pending.clone()))
            .collect();
        entries.sort_by_key(|(id, _)| *id);
        entries
    }

    pub async fn count(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Plan;
    use chrono::Utc;

    #[tokio::test]
    async fn test_put_overwrites_existing_entry() {
        let repo = PendingRepository::new();
        let now = Utc::now();

        repo.put(1, PendingVerification::new(Plan::Monthly, 99, now))
            .await;
        repo.put(1, PendingVerification::new(Plan::Lifetime, 149, now))
            .await;

        assert_eq!(repo.count().await, 1);
        let pending = repo.get(1).await.unwrap();
        assert_eq!(pending.plan, Plan::Lifetime);
        assert_eq!(pending.amount, 149);
    }

    #[tokio::test]
    async fn test_delete_returns_entry_once() {
        let repo = PendingRepository::new();
        repo.put(2, PendingVerification::new(Plan::Monthly, 99, Utc::now()))
            .await;

        assert!(repo.delete(2).await.is_some());
        assert!(repo.delete(2).await.is_none());
    }
}
