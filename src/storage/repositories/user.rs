//! User repository implementation

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::models::{Plan, PremiumUntil, UserRecord};

#[derive(Debug, Default)]
pub struct UserRepository {
    users: RwLock<HashMap<i64, UserRecord>>,
}

impl UserRepository {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
        }
    }

    /// Replace the in-memory collection with freshly loaded entries.
    pub async fn load_from(&self, entries: HashMap<i64, UserRecord>) {
        *self.users.write().await = entries;
    }

    pub async fn get(&self, telegram_id: i64) -> Option<UserRecord> {
        self.users.read().await.get(&telegram_id).cloned()
    }

    pub async fn put(&self, user: UserRecord) {
        self.users.write().await.insert(user.telegram_id, user);
    }

    /// Create or refresh the profile fields, returning the record and
    /// whether this identity was seen for the first time.
    pub async fn upsert_profile(
        &self,
        telegram_id: i64,
        username: Option<String>,
        first_name: Option<String>,
        last_name: Option<String>,
        now: DateTime<Utc>,
    ) -> (UserRecord, bool) {
        let mut users = self.users.write().await;
        let is_new = !users.contains_key(&telegram_id);
        let user = users
            .entry(telegram_id)
            .or_insert_with(|| UserRecord::new(telegram_id, now));
        user.username = username;
        user.first_name = first_name;
        user.last_name = last_name;
        (user.clone(), is_new)
    }

    /// Mark the entitlement granted by an approved verification.
    pub async fn grant_premium(
        &self,
        telegram_id: i64,
        plan: Plan,
        until: PremiumUntil,
        invite_link: String,
        now: DateTime<Utc>,
    ) -> UserRecord {
        let mut users = self.users.write().await;
        let user = users
            .entry(telegram_id)
            .or_insert_with(|| UserRecord::new(telegram_id, now));
        user.is_premium = true;
        user.premium_plan = Some(plan);
        user.premium_until = Some(until);
        user.invite_link = Some(invite_link);
        user.clone()
    }

    pub async fn snapshot(&self) -> HashMap<i64, UserRecord> {
        self.users.read().await.clone()
    }

    pub async fn count(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn premium_count(&self) -> usize {
        self.users
            .read()
            .await
            .values()
            .filter(|u| u.is_premium)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upsert_profile_tracks_new_users() {
        let repo = UserRepository::new();
        let now = Utc::now();

        let (_, is_new) = repo
            .upsert_profile(1, Some("alice".into()), Some("Alice".into()), None, now)
            .await;
        assert!(is_new);

        let (user, is_new) = repo
            .upsert_profile(1, Some("alice2".into()), Some("Alice".into()), None, now)
            .await;
        assert!(!is_new);
        assert_eq!(user.username.as_deref(), Some("alice2"));
        assert_eq!(repo.count().await, 1);
    }

    #[tokio::test]
    async fn test_grant_premium_creates_missing_record() {
        let repo = UserRepository::new();
        let now = Utc::now();

        let user = repo
            .grant_premium(7, Plan::Lifetime, PremiumUntil::Unlimited, "link".into(), now)
            .await;
        assert!(user.is_premium);
        assert_eq!(user.premium_plan, Some(Plan::Lifetime));
        assert_eq!(repo.premium_count().await, 1);
    }
}
