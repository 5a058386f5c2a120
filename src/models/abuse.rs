//! Abuse record model

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Per-identity counters and block state used for rate limiting and bans.
///
/// `block_level` 0 means never blocked, 1-2 are escalating automatic spam
/// blocks, 3 is a manual administrative ban. The level never decreases
/// automatically; only an explicit unban resets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbuseRecord {
    /// Request timestamps inside the trailing window, oldest first
    pub recent_requests: Vec<DateTime<Utc>>,
    pub warning_level: u8,
    pub block_level: u8,
    pub blocked_until: Option<DateTime<Utc>>,
    pub ban_reason: Option<String>,
    pub banned_by: Option<i64>,
}

impl AbuseRecord {
    pub fn new() -> Self {
        Self {
            recent_requests: Vec::new(),
            warning_level: 0,
            block_level: 0,
            blocked_until: None,
            ban_reason: None,
            banned_by: None,
        }
    }

    pub fn is_blocked(&self, now: DateTime<Utc>) -> bool {
        matches!(self.blocked_until, Some(until) if until > now)
    }

    /// Time left on the current block, None when not blocked.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        match self.blocked_until {
            Some(until) if until > now => Some(until - now),
            _ => None,
        }
    }

    /// Drop request timestamps that fell out of the trailing window.
    pub fn prune(&mut self, now: DateTime<Utc>, window: Duration) {
        self.recent_requests.retain(|ts| now - *ts < window);
    }
}

impl Default for AbuseRecord {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_state() {
        let now = Utc::now();
        let mut record = AbuseRecord::new();
        assert!(!record.is_blocked(now));
        assert!(record.remaining(now).is_none());

        record.blocked_until = Some(now + Duration::seconds(300));
        assert!(record.is_blocked(now));
        assert_eq!(record.remaining(now), Some(Duration::seconds(300)));
        assert!(!record.is_blocked(now + Duration::seconds(301)));
    }

    #[test]
    fn test_prune() {
        let now = Utc::now();
        let mut record = AbuseRecord::new();
        record.recent_requests = vec![
            now - Duration::seconds(15),
            now - Duration::seconds(5),
            now,
        ];
        record.prune(now, Duration::seconds(10));
        assert_eq!(record.recent_requests.len(), 2);
    }
}
