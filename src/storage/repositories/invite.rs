//! Issued invite repository implementation
//!
//! Append-only history per identity; the core never mutates or removes
//! entries that were already issued.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::models::IssuedInvite;

#[derive(Debug, Default)]
pub struct InviteRepository {
    links: RwLock<HashMap<i64, Vec<IssuedInvite>>>,
}

impl InviteRepository {
    pub fn new() -> Self {
        Self {
            links: RwLock::new(HashMap::new()),
        }
    }

    /// Replace the in-memory collection with freshly loaded entries.
    pub async fn load_from(&self, entries: HashMap<i64, Vec<IssuedInvite>>) {
        *self.links.write().await = entries;
    }

    pub async fn append(&self, user_id: i64, invite: IssuedInvite) {
        self.links
            .write()
            .await
            .entry(user_id)
            .or_default()
            .push(invite);
    }

    pub async fn history(&self, user_id: i64) -> Vec<IssuedInvite> {
        self.links
            .read()
            .await
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn snapshot(&self) -> HashMap<i64, Vec<IssuedInvite>> {
        self.links.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Plan;
    use chrono::{Duration, Utc};

    fn invite(link: &str) -> IssuedInvite {
        let now = Utc::now();
        IssuedInvite {
            link: link.to_string(),
            plan: Plan::Monthly,
            created_at: now,
            expires_at: now + Duration::days(30),
            used: false,
        }
    }

    #[tokio::test]
    async fn test_history_is_append_only_and_ordered() {
        let repo = InviteRepository::new();
        repo.append(1, invite("t.me/+first")).await;
        repo.append(1, invite("t.me/+second")).await;

        let history = repo.history(1).await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].link, "t.me/+first");
        assert_eq!(history[1].link, "t.me/+second");
    }

    #[tokio::test]
    async fn test_history_empty_for_unknown_identity() {
        let repo = InviteRepository::new();
        assert!(repo.history(404).await.is_empty());
    }
}
