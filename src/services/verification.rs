//! Verification workflow engine
//!
//! Per-identity state machine from plan selection through evidence
//! submission to the admin decision, ending in invite issuance or
//! rejection. Terminal transitions delete the pending entry; a fresh plan
//! selection may abandon an open intent at any time (latest intent wins).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use super::invite::InviteIssuer;
use super::notification::{EvidenceForward, NotificationSink};
use crate::config::Settings;
use crate::models::{
    IssuedInvite, MessageRef, PendingVerification, Plan, PremiumUntil, ScreenshotRef,
};
use crate::storage::{InviteRepository, PendingRepository, UserRepository};
use crate::utils::errors::{PayGateError, Result};
use crate::utils::helpers::format_timestamp;

/// Result of an admin decision
#[derive(Debug, Clone)]
pub enum DecisionOutcome {
    Approved { invite: IssuedInvite },
    Rejected,
}

/// Engine coordinating purchase intents, evidence and admin decisions
#[derive(Clone)]
pub struct VerificationService {
    users: Arc<UserRepository>,
    pending: Arc<PendingRepository>,
    invites: Arc<InviteRepository>,
    issuer: Arc<dyn InviteIssuer>,
    notifier: Arc<dyn NotificationSink>,
    settings: Settings,
    /// Per-identity in-flight guards; at most one evidence/decision
    /// operation runs per identity at a time
    locks: Arc<Mutex<HashMap<i64, Arc<tokio::sync::Mutex<()>>>>>,
}

impl VerificationService {
    pub fn new(
        users: Arc<UserRepository>,
        pending: Arc<PendingRepository>,
        invites: Arc<InviteRepository>,
        issuer: Arc<dyn InviteIssuer>,
        notifier: Arc<dyn NotificationSink>,
        settings: Settings,
    ) -> Self {
        Self {
            users,
            pending,
            invites,
            issuer,
            notifier,
            settings,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn slot(&self, user_id: i64) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap();
        Arc::clone(
            locks
                .entry(user_id)
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
        )
    }

    /// Book a purchase intent, overwriting any open one for this identity.
    pub async fn select_plan(
        &self,
        user_id: i64,
        plan: Plan,
        now: DateTime<Utc>,
    ) -> Result<PendingVerification> {
        let amount = self.settings.plans.get(plan).amount;
        let pending = PendingVerification::new(plan, amount, now);
        self.pending.put(user_id, pending.clone()).await;

        info!(user_id = user_id, plan = %plan, amount = amount, "Plan selected");

        self.notifier
            .log_event(format!(
                "💰 <b>PAYMENT INITIATED</b>\n\n\
                 🆔 User ID: <code>{}</code>\n\
                 📅 Plan: {}\n\
                 💰 Amount: ₹{}\n\
                 ⏰ Time: {}",
                user_id,
                self.settings.plans.get(plan).name,
                amount,
                format_timestamp(now),
            ))
            .await;

        Ok(pending)
    }

    /// Attach payment evidence and hand it to the review surface.
    ///
    /// The pending entry keeps the evidence even when the forward fails,
    /// so the user can be asked to resend without restarting the purchase.
    pub async fn submit_evidence(
        &self,
        user_id: i64,
        origin: MessageRef,
        file_id: String,
        now: DateTime<Utc>,
    ) -> Result<MessageRef> {
        let slot = self.slot(user_id);
        let _guard = slot
            .try_lock_owned()
            .map_err(|_| PayGateError::Conflict { user_id })?;

        let mut pending = self
            .pending
            .get(user_id)
            .await
            .ok_or(PayGateError::NoPendingIntent { user_id })?;

        pending.screenshot = Some(ScreenshotRef {
            file_id,
            submitted_at: now,
        });
        self.pending.put(user_id, pending.clone()).await;

        let username = self.users.get(user_id).await.and_then(|u| u.username);
        let forward = EvidenceForward {
            user_id,
            username,
            plan_name: self.settings.plans.get(pending.plan).name.clone(),
            amount: pending.amount,
            origin,
            submitted_at: now,
        };

        // The one notification whose failure the caller must see
        let admin_message = self.notifier.forward_evidence(forward).await?;

        pending.admin_message = Some(admin_message);
        self.pending.put(user_id, pending).await;

        info!(
            user_id = user_id,
            review_chat = admin_message.chat_id,
            review_message = admin_message.message_id,
            "Evidence forwarded for review"
        );

        Ok(admin_message)
    }

    /// Apply the admin decision to an open intent.
    ///
    /// Calling again after the entry is gone returns `NoPendingIntent`, so
    /// duplicate clicks on review buttons are harmless.
    pub async fn decide(
        &self,
        user_id: i64,
        approve: bool,
        actor: i64,
        now: DateTime<Utc>,
    ) -> Result<DecisionOutcome> {
        let slot = self.slot(user_id);
        let _guard = slot
            .try_lock_owned()
            .map_err(|_| PayGateError::Conflict { user_id })?;

        let pending = self
            .pending
            .get(user_id)
            .await
            .ok_or(PayGateError::NoPendingIntent { user_id })?;

        if approve {
            self.approve(user_id, pending, actor, now).await
        } else {
            self.reject(user_id, pending, actor, now).await
        }
    }

    async fn approve(
        &self,
        user_id: i64,
        pending: PendingVerification,
        actor: i64,
        now: DateTime<Utc>,
    ) -> Result<DecisionOutcome> {
        let plan = pending.plan;
        let plan_name = self.settings.plans.get(plan).name.clone();

        // Issuer failure propagates with the pending entry untouched so
        // the admin can retry the approval
        let invite = self.issuer.issue(plan, user_id, now).await?;

        self.invites.append(user_id, invite.clone()).await;

        let until = match plan.entitlement_days() {
            Some(days) => PremiumUntil::Date((now + Duration::days(days)).date_naive()),
            None => PremiumUntil::Unlimited,
        };
        self.users
            .grant_premium(user_id, plan, until, invite.link.clone(), now)
            .await;

        let delivery = self
            .notifier
            .notify_user(
                user_id,
                format!(
                    "🎉 <b>PAYMENT VERIFIED SUCCESSFULLY!</b>\n\n\
                     <b>Plan:</b> {}\n\
                     <b>Amount Paid:</b> ₹{}\n\n\
                     <b>👇 Your Unique Invite Link (Single Use):</b>\n{}\n\n\
                     ⚠️ <b>Note:</b> This link can only be used ONCE and is personal to you.\n\n\
                     <b>Welcome to Premium Family! 🎊</b>",
                    plan_name, pending.amount, invite.link,
                ),
            )
            .await;
        if !delivery.is_delivered() {
            warn!(user_id = user_id, "Credential message suppressed, link kept on record");
        }

        self.notifier
            .log_event(format!(
                "✅ <b>PAYMENT VERIFIED</b>\n\n\
                 🆔 User ID: <code>{}</code>\n\
                 📅 Plan: {}\n\
                 💰 Amount: ₹{}\n\
                 👮 Verified By: <code>{}</code>\n\
                 🔗 Invite Link: {}\n\
                 ⏰ Time: {}",
                user_id,
                plan_name,
                pending.amount,
                actor,
                invite.link,
                format_timestamp(now),
            ))
            .await;

        if let Some(message) = pending.admin_message {
            self.notifier
                .update_review_message(
                    message,
                    self.review_summary(user_id, &pending, "✅ <b>VERIFIED - UNIQUE LINK SENT</b>"),
                )
                .await;
        }

        self.pending.delete(user_id).await;

        info!(user_id = user_id, actor = actor, plan = %plan, "Payment verified");

        Ok(DecisionOutcome::Approved { invite })
    }

    async fn reject(
        &self,
        user_id: i64,
        pending: PendingVerification,
        actor: i64,
        now: DateTime<Utc>,
    ) -> Result<DecisionOutcome> {
        self.notifier
            .notify_user(
                user_id,
                format!(
                    "❌ <b>PAYMENT VERIFICATION FAILED</b>\n\n\
                     Your payment screenshot could not be verified.\n\n\
                     <b>Possible reasons:</b>\n\
                     • Screenshot not clear\n\
                     • Wrong amount paid\n\
                     • Payment not received\n\n\
                     <b>Please try again or contact support:</b>\n📞 @{}",
                    self.settings.bot.support_username,
                ),
            )
            .await;

        self.notifier
            .log_event(format!(
                "❌ <b>PAYMENT REJECTED</b>\n\n\
                 🆔 User ID: <code>{}</code>\n\
                 👮 Rejected By: <code>{}</code>\n\
                 ⏰ Time: {}",
                user_id,
                actor,
                format_timestamp(now),
            ))
            .await;

        if let Some(message) = pending.admin_message {
            self.notifier
                .update_review_message(
                    message,
                    self.review_summary(user_id, &pending, "❌ <b>REJECTED</b>"),
                )
                .await;
        }

        self.pending.delete(user_id).await;

        warn!(user_id = user_id, actor = actor, "Payment rejected");

        Ok(DecisionOutcome::Rejected)
    }

    fn review_summary(
        &self,
        user_id: i64,
        pending: &PendingVerification,
        outcome: &str,
    ) -> String {
        format!(
            "📸 <b>PAYMENT SCREENSHOT RECEIVED</b>\n\n\
             🆔 User ID: <code>{}</code>\n\
             📅 Plan: {}\n\
             💰 Amount: ₹{}\n\n{}",
            user_id,
            self.settings.plans.get(pending.plan).name,
            pending.amount,
            outcome,
        )
    }
}
