//! Abuse control engine
//!
//! Sliding-window request counting with escalating temporary blocks and
//! manual bans. Every user-initiated action passes `admit` before it runs;
//! notification side effects are best-effort and never change a decision.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use super::notification::NotificationSink;
use crate::config::SpamConfig;
use crate::models::AbuseRecord;
use crate::storage::AbuseRepository;
use crate::utils::errors::{PayGateError, Result};
use crate::utils::helpers::format_remaining;

const WARNING_MESSAGES: [&str; 3] = [
    "⚠️ Please don't spam!",
    "⚠️ This is your last warning!",
    "⛔ You are being blocked for spamming!",
];

/// Requests inside the window where warnings start
const WARNING_THRESHOLD: usize = 3;
/// Automatic escalation never exceeds this level
const AUTO_BLOCK_CEILING: u8 = 2;
/// Reserved for manual administrative bans
const MANUAL_BAN_LEVEL: u8 = 3;

/// Outcome of an admission check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Blocked { message: String },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }
}

/// One row of the banned-identities listing
#[derive(Debug, Clone)]
pub struct BannedEntry {
    pub user_id: i64,
    pub remaining: Duration,
    pub block_level: u8,
    pub reason: Option<String>,
}

enum SideEffect {
    AdminAlert(String),
    UserWarning(String),
}

/// Engine tracking per-identity request rates and block state
#[derive(Clone)]
pub struct AbuseControlService {
    repo: Arc<AbuseRepository>,
    notifier: Arc<dyn NotificationSink>,
    config: SpamConfig,
}

impl AbuseControlService {
    pub fn new(
        repo: Arc<AbuseRepository>,
        notifier: Arc<dyn NotificationSink>,
        config: SpamConfig,
    ) -> Self {
        Self {
            repo,
            notifier,
            config,
        }
    }

    /// Gate evaluated before any user-initiated action proceeds.
    pub async fn admit(&self, user_id: i64, now: DateTime<Utc>) -> Decision {
        let (decision, side_effect) = {
            let entry = self.repo.entry(user_id);
            let mut record = entry.lock().unwrap();
            self.evaluate(user_id, &mut record, now)
        };

        // Best-effort, after the record lock is released; a failed send
        // must not change the decision.
        match side_effect {
            Some(SideEffect::AdminAlert(text)) => {
                self.notifier.notify_admin(text).await;
            }
            Some(SideEffect::UserWarning(text)) => {
                self.notifier.notify_user(user_id, text).await;
            }
            None => {}
        }

        decision
    }

    fn evaluate(
        &self,
        user_id: i64,
        record: &mut AbuseRecord,
        now: DateTime<Utc>,
    ) -> (Decision, Option<SideEffect>) {
        if let Some(remaining) = record.remaining(now) {
            let mut message = "⛔ <b>YOU ARE BLOCKED!</b>\n\n".to_string();
            if let Some(reason) = record.ban_reason.as_deref().filter(|r| !r.is_empty()) {
                message.push_str(&format!("<b>Reason:</b> {}\n", reason));
            }
            message.push_str(&format!(
                "⏳ Please wait <b>{}</b>",
                format_remaining(remaining)
            ));
            debug!(user_id = user_id, "Request rejected, identity is blocked");
            return (Decision::Blocked { message }, None);
        }

        let window = Duration::seconds(self.config.window_seconds as i64);
        record.prune(now, window);
        record.recent_requests.push(now);
        let request_count = record.recent_requests.len();

        // Boundary blocks: >= comparison, the MAX_COUNT-th request is denied
        if request_count >= self.config.max_requests {
            record.block_level = (record.block_level + 1).min(AUTO_BLOCK_CEILING);
            let seconds = self.config.block_durations[(record.block_level - 1) as usize];
            let duration = Duration::seconds(seconds as i64);
            record.blocked_until = Some(now + duration);
            record.recent_requests.clear();
            record.warning_level = 0;

            warn!(
                user_id = user_id,
                block_level = record.block_level,
                duration_seconds = seconds,
                "User blocked for spam"
            );

            let alert = format!(
                "🚨 <b>USER BLOCKED FOR SPAM</b>\n\n\
                 👤 User ID: <code>{}</code>\n\
                 📛 Block Level: {}\n\
                 ⏰ Duration: {} minutes\n\
                 🔢 Request Count: {}",
                user_id,
                record.block_level,
                duration.num_minutes(),
                request_count,
            );
            let message = format!(
                "⛔ <b>BLOCKED FOR SPAM!</b>\n\n⏳ Wait {}",
                format_remaining(duration)
            );
            return (Decision::Blocked { message }, Some(SideEffect::AdminAlert(alert)));
        }

        if request_count >= WARNING_THRESHOLD {
            let tier = (request_count - WARNING_THRESHOLD).min(WARNING_MESSAGES.len() - 1);
            // Each tier warns at most once until the counters reset
            if usize::from(record.warning_level) < tier + 1 {
                record.warning_level = (tier + 1) as u8;
                let warning = format!(
                    "{}\n\n⚠️ {} attempts left!",
                    WARNING_MESSAGES[tier],
                    self.config.max_requests - request_count,
                );
                return (Decision::Allowed, Some(SideEffect::UserWarning(warning)));
            }
        }

        (Decision::Allowed, None)
    }

    /// Forgive the recorded burst once an admitted action completed.
    /// No-op while the identity is blocked.
    pub fn reset(&self, user_id: i64, now: DateTime<Utc>) {
        if !self.repo.contains(user_id) {
            return;
        }
        let entry = self.repo.entry(user_id);
        let mut record = entry.lock().unwrap();
        if !record.is_blocked(now) {
            record.recent_requests.clear();
            record.warning_level = 0;
        }
    }

    /// Manual administrative ban; overwrites any prior block state.
    pub async fn ban(
        &self,
        user_id: i64,
        duration: Duration,
        reason: &str,
        actor: i64,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if duration <= Duration::zero() {
            return Err(PayGateError::InvalidInput(
                "Ban duration must be positive".to_string(),
            ));
        }

        {
            let entry = self.repo.entry(user_id);
            let mut record = entry.lock().unwrap();
            record.blocked_until = Some(now + duration);
            record.block_level = MANUAL_BAN_LEVEL;
            record.ban_reason = Some(reason.to_string());
            record.banned_by = Some(actor);
        }

        info!(
            user_id = user_id,
            actor = actor,
            duration_seconds = duration.num_seconds(),
            reason = reason,
            "User banned"
        );

        self.notifier
            .notify_user(
                user_id,
                format!(
                    "⛔ <b>BANNED</b>\n\nDuration: {}\nReason: {}",
                    ban_duration_display(duration),
                    reason,
                ),
            )
            .await;

        Ok(())
    }

    /// Lift any block and reset the identity's counters.
    pub async fn unban(&self, user_id: i64) -> Result<()> {
        if !self.repo.contains(user_id) {
            return Err(PayGateError::AbuseRecordNotFound { user_id });
        }

        {
            let entry = self.repo.entry(user_id);
            let mut record = entry.lock().unwrap();
            record.blocked_until = None;
            record.block_level = 0;
            record.ban_reason = None;
            record.banned_by = None;
            record.recent_requests.clear();
            record.warning_level = 0;
        }

        info!(user_id = user_id, "User unbanned");

        self.notifier
            .notify_user(
                user_id,
                "✅ <b>You have been unbanned!</b>\nYou can now use the bot again.".to_string(),
            )
            .await;

        Ok(())
    }

    /// Identities currently blocked, sorted by identity key.
    pub fn list_banned(&self, now: DateTime<Utc>) -> Vec<BannedEntry> {
        let mut entries: Vec<BannedEntry> = self
            .repo
            .snapshot()
            .into_iter()
            .filter_map(|(user_id, record)| {
                record.remaining(now).map(|remaining| BannedEntry {
                    user_id,
                    remaining,
                    block_level: record.block_level,
                    reason: record.ban_reason.clone(),
                })
            })
            .collect();
        entries.sort_by_key(|entry| entry.user_id);
        entries
    }

    pub fn blocked_count(&self, now: DateTime<Utc>) -> usize {
        self.list_banned(now).len()
    }
}

fn ban_duration_display(duration: Duration) -> String {
    let seconds = duration.num_seconds();
    if seconds >= 3600 {
        format!("{} hours", seconds / 3600)
    } else if seconds >= 60 {
        format!("{} minutes", seconds / 60)
    } else {
        format!("{} seconds", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MessageRef;
    use crate::services::notification::{Delivery, EvidenceForward};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Sink recording every call; optionally failing all sends.
    #[derive(Default)]
    struct RecordingSink {
        user_messages: Mutex<Vec<(i64, String)>>,
        admin_messages: Mutex<Vec<String>>,
        failing: bool,
    }

    impl RecordingSink {
        fn failing() -> Self {
            Self {
                failing: true,
                ..Default::default()
            }
        }

        fn outcome(&self) -> Delivery {
            if self.failing {
                Delivery::Suppressed
            } else {
                Delivery::Delivered
            }
        }
    }

    #[async_trait]
    impl NotificationSink for RecordingSink {
        async fn notify_user(&self, user_id: i64, text: String) -> Delivery {
            self.user_messages.lock().unwrap().push((user_id, text));
            self.outcome()
        }

        async fn notify_admin(&self, text: String) -> Delivery {
            self.admin_messages.lock().unwrap().push(text);
            self.outcome()
        }

        async fn log_event(&self, _text: String) -> Delivery {
            self.outcome()
        }

        async fn forward_evidence(&self, _forward: EvidenceForward) -> crate::utils::errors::Result<MessageRef> {
            unreachable!("abuse engine never forwards evidence")
        }

        async fn update_review_message(&self, _message: MessageRef, _text: String) -> Delivery {
            self.outcome()
        }
    }

    fn service() -> (AbuseControlService, Arc<RecordingSink>) {
        service_with(RecordingSink::default())
    }

    fn service_with(sink: RecordingSink) -> (AbuseControlService, Arc<RecordingSink>) {
        let sink = Arc::new(sink);
        let service = AbuseControlService::new(
            Arc::new(AbuseRepository::new()),
            sink.clone(),
            SpamConfig {
                max_requests: 5,
                window_seconds: 10,
                block_durations: vec![300, 900],
            },
        );
        (service, sink)
    }

    #[tokio::test]
    async fn test_requests_under_threshold_are_allowed() {
        let (service, _) = service();
        let now = Utc::now();

        for i in 0..4 {
            let decision = service.admit(1, now + Duration::seconds(i)).await;
            assert!(decision.is_allowed());
        }
    }

    #[tokio::test]
    async fn test_fifth_request_inside_window_blocks() {
        let (service, sink) = service();
        let now = Utc::now();

        for i in 0..4 {
            assert!(service.admit(1, now + Duration::seconds(i)).await.is_allowed());
        }
        let decision = service.admit(1, now + Duration::seconds(4)).await;
        assert!(!decision.is_allowed());

        let record = service.repo.get(1).unwrap();
        assert_eq!(record.block_level, 1);
        assert_eq!(
            record.blocked_until,
            Some(now + Duration::seconds(4) + Duration::seconds(300))
        );
        assert!(record.recent_requests.is_empty());
        assert_eq!(sink.admin_messages.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_requests_spread_across_windows_never_block() {
        let (service, _) = service();
        let now = Utc::now();

        // One request every 11 seconds never accumulates inside the window
        for i in 0..20 {
            let decision = service.admit(1, now + Duration::seconds(i * 11)).await;
            assert!(decision.is_allowed());
        }
    }

    #[tokio::test]
    async fn test_block_expires_then_escalates_to_level_two() {
        let (service, _) = service();
        let now = Utc::now();

        for i in 0..5 {
            service.admit(1, now + Duration::seconds(i)).await;
        }
        assert_eq!(service.repo.get(1).unwrap().block_level, 1);

        // Still blocked one second after the trigger
        assert!(!service.admit(1, now + Duration::seconds(5)).await.is_allowed());

        // Allowed again after the level-1 duration
        let after = now + Duration::seconds(4 + 301);
        assert!(service.admit(1, after).await.is_allowed());

        // A second burst escalates to level 2 with the longer duration
        for i in 1..5 {
            service.admit(1, after + Duration::seconds(i)).await;
        }
        let record = service.repo.get(1).unwrap();
        assert_eq!(record.block_level, 2);
        assert_eq!(
            record.blocked_until,
            Some(after + Duration::seconds(4) + Duration::seconds(900))
        );
    }

    #[tokio::test]
    async fn test_automatic_escalation_caps_at_level_two() {
        let (service, _) = service();
        let mut now = Utc::now();

        for _ in 0..3 {
            for i in 0..5 {
                service.admit(1, now + Duration::seconds(i)).await;
            }
            // Past the longest block, burst again
            now = now + Duration::seconds(1000);
        }

        assert_eq!(service.repo.get(1).unwrap().block_level, 2);
    }

    #[tokio::test]
    async fn test_warning_fires_once_per_tier() {
        let (service, sink) = service();
        let now = Utc::now();

        // Third and fourth request each open a new tier
        for i in 0..4 {
            service.admit(1, now + Duration::seconds(i)).await;
        }
        assert_eq!(sink.user_messages.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_warning_still_allows() {
        let (service, sink) = service_with(RecordingSink::failing());
        let now = Utc::now();

        for i in 0..3 {
            assert!(service.admit(1, now + Duration::seconds(i)).await.is_allowed());
        }
        // The warning was attempted and suppressed
        assert_eq!(sink.user_messages.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reset_clears_counters_only_while_unblocked() {
        let (service, _) = service();
        let now = Utc::now();

        for i in 0..3 {
            service.admit(1, now + Duration::seconds(i)).await;
        }
        service.reset(1, now + Duration::seconds(3));
        let record = service.repo.get(1).unwrap();
        assert!(record.recent_requests.is_empty());
        assert_eq!(record.warning_level, 0);

        for i in 0..5 {
            service.admit(1, now + Duration::seconds(10 + i)).await;
        }
        assert!(service.repo.get(1).unwrap().is_blocked(now + Duration::seconds(15)));

        // Reset is a no-op while blocked
        service.reset(1, now + Duration::seconds(15));
        assert!(service.repo.get(1).unwrap().is_blocked(now + Duration::seconds(15)));
    }

    #[tokio::test]
    async fn test_manual_ban_then_expiry() {
        let (service, sink) = service();
        let now = Utc::now();

        service.ban(1, Duration::seconds(60), "test", 999, now).await.unwrap();

        let record = service.repo.get(1).unwrap();
        assert_eq!(record.block_level, 3);
        assert_eq!(record.ban_reason.as_deref(), Some("test"));
        assert_eq!(record.banned_by, Some(999));
        assert_eq!(sink.user_messages.lock().unwrap().len(), 1);

        assert!(!service.admit(1, now + Duration::seconds(30)).await.is_allowed());
        assert!(service.admit(1, now + Duration::seconds(61)).await.is_allowed());
    }

    #[tokio::test]
    async fn test_ban_rejects_non_positive_duration() {
        let (service, _) = service();
        let result = service.ban(1, Duration::seconds(0), "x", 999, Utc::now()).await;
        assert!(matches!(result, Err(PayGateError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_unban_clears_residual_block() {
        let (service, _) = service();
        let now = Utc::now();

        service.ban(1, Duration::seconds(600), "spam", 999, now).await.unwrap();
        assert!(!service.admit(1, now).await.is_allowed());

        service.unban(1).await.unwrap();
        let record = service.repo.get(1).unwrap();
        assert_eq!(record.block_level, 0);
        assert!(record.ban_reason.is_none());

        // No residual block at the very same instant
        assert!(service.admit(1, now).await.is_allowed());
    }

    #[tokio::test]
    async fn test_unban_unknown_identity_reports_not_found() {
        let (service, _) = service();
        let result = service.unban(404).await;
        assert!(matches!(
            result,
            Err(PayGateError::AbuseRecordNotFound { user_id: 404 })
        ));
    }

    #[tokio::test]
    async fn test_list_banned_reports_remaining_and_reason() {
        let (service, _) = service();
        let now = Utc::now();

        service.ban(7, Duration::seconds(120), "fraud", 999, now).await.unwrap();
        for i in 0..5 {
            service.admit(3, now + Duration::seconds(i)).await;
        }

        let banned = service.list_banned(now + Duration::seconds(10));
        assert_eq!(banned.len(), 2);
        assert_eq!(banned[0].user_id, 3);
        assert_eq!(banned[0].block_level, 1);
        assert_eq!(banned[1].user_id, 7);
        assert_eq!(banned[1].reason.as_deref(), Some("fraud"));
        assert_eq!(banned[1].remaining, Duration::seconds(110));

        // Everything expires eventually
        assert!(service.list_banned(now + Duration::seconds(2000)).is_empty());
    }
}
