//! User model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::plan::Plan;

/// End of a user's premium entitlement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PremiumUntil {
    /// Entitlement expires on this date
    Date(NaiveDate),
    /// Lifetime plan, never expires
    Unlimited,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub started_at: DateTime<Utc>,
    pub is_premium: bool,
    pub premium_plan: Option<Plan>,
    pub premium_until: Option<PremiumUntil>,
    /// Last invite link issued to this user
    pub invite_link: Option<String>,
}

impl UserRecord {
    /// Create a fully-populated record for a user seen for the first time.
    pub fn new(telegram_id: i64, now: DateTime<Utc>) -> Self {
        Self {
            telegram_id,
            username: None,
            first_name: None,
            last_name: None,
            started_at: now,
            is_premium: false,
            premium_plan: None,
            premium_until: None,
            invite_link: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_defaults() {
        let now = Utc::now();
        let user = UserRecord::new(42, now);
        assert_eq!(user.telegram_id, 42);
        assert!(!user.is_premium);
        assert!(user.premium_plan.is_none());
        assert!(user.invite_link.is_none());
    }

    #[test]
    fn test_premium_until_round_trip() {
        let date = PremiumUntil::Date(NaiveDate::from_ymd_opt(2026, 9, 5).unwrap());
        let json = serde_json::to_string(&date).unwrap();
        assert_eq!(serde_json::from_str::<PremiumUntil>(&json).unwrap(), date);

        let json = serde_json::to_string(&PremiumUntil::Unlimited).unwrap();
        assert_eq!(
            serde_json::from_str::<PremiumUntil>(&json).unwrap(),
            PremiumUntil::Unlimited
        );
    }
}
