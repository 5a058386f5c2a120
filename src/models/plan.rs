//! Subscription plan model

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::utils::errors::PayGateError;

/// Purchasable entitlement tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Monthly,
    Lifetime,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Monthly => "monthly",
            Plan::Lifetime => "lifetime",
        }
    }

    /// Expiry applied to the single-use invite link for this plan.
    ///
    /// The lifetime plan still gets a finite 365-day link because invite
    /// links require an expiry; the user record's entitlement stays
    /// unlimited. Known mismatch, kept as observed behavior.
    pub fn invite_ttl(&self) -> Duration {
        match self {
            Plan::Monthly => Duration::days(30),
            Plan::Lifetime => Duration::days(365),
        }
    }

    /// Entitlement duration granted on the user record, None = unlimited.
    pub fn entitlement_days(&self) -> Option<i64> {
        match self {
            Plan::Monthly => Some(30),
            Plan::Lifetime => None,
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Plan {
    type Err = PayGateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(Plan::Monthly),
            "lifetime" => Ok(Plan::Lifetime),
            other => Err(PayGateError::InvalidPlan(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_parse() {
        assert_eq!("monthly".parse::<Plan>().unwrap(), Plan::Monthly);
        assert_eq!("lifetime".parse::<Plan>().unwrap(), Plan::Lifetime);
        assert!("weekly".parse::<Plan>().is_err());
    }

    #[test]
    fn test_invite_ttl() {
        assert_eq!(Plan::Monthly.invite_ttl(), Duration::days(30));
        assert_eq!(Plan::Lifetime.invite_ttl(), Duration::days(365));
    }
}
