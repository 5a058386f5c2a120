//! End-to-end scenarios over the real file-backed store with in-process
//! collaborator mocks.

#![allow(non_snake_case)]

use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use PayGate::config::Settings;
use PayGate::models::{IssuedInvite, MessageRef, Plan, PremiumUntil};
use PayGate::services::{
    abuse::AbuseControlService, notification::Delivery, notification::EvidenceForward,
    notification::NotificationSink, verification::VerificationService, DecisionOutcome,
    InviteIssuer,
};
use PayGate::storage::{JsonStore, StoreService};
use PayGate::utils::errors::{PayGateError, Result};

/// Sink that accepts everything; the workflow tests assert on state, not
/// on message traffic.
#[derive(Default)]
struct TestSink;

#[async_trait]
impl NotificationSink for TestSink {
    async fn notify_user(&self, _user_id: i64, _text: String) -> Delivery {
        Delivery::Delivered
    }

    async fn notify_admin(&self, _text: String) -> Delivery {
        Delivery::Delivered
    }

    async fn log_event(&self, _text: String) -> Delivery {
        Delivery::Delivered
    }

    async fn forward_evidence(&self, forward: EvidenceForward) -> Result<MessageRef> {
        Ok(MessageRef {
            chat_id: -1001,
            message_id: forward.user_id as i32,
        })
    }

    async fn update_review_message(&self, _message: MessageRef, _text: String) -> Delivery {
        Delivery::Delivered
    }
}

struct TestIssuer;

#[async_trait]
impl InviteIssuer for TestIssuer {
    async fn issue(&self, plan: Plan, user_id: i64, now: DateTime<Utc>) -> Result<IssuedInvite> {
        Ok(IssuedInvite {
            link: format!("https://t.me/+u{}", user_id),
            plan,
            created_at: now,
            expires_at: now + plan.invite_ttl(),
            used: false,
        })
    }
}

fn verification_service(store: &StoreService) -> VerificationService {
    VerificationService::new(
        store.users.clone(),
        store.pending.clone(),
        store.invites.clone(),
        Arc::new(TestIssuer),
        Arc::new(TestSink::default()),
        Settings::default(),
    )
}

fn abuse_service(store: &StoreService) -> AbuseControlService {
    AbuseControlService::new(
        store.abuse.clone(),
        Arc::new(TestSink::default()),
        Settings::default().spam,
    )
}

#[tokio::test]
async fn test_monthly_purchase_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let store = StoreService::load(JsonStore::new(dir.path())).await.unwrap();
    let service = verification_service(&store);
    let now = Utc::now();
    let user = 1001;

    store
        .users
        .upsert_profile(user, Some("buyer".into()), Some("Buyer".into()), None, now)
        .await;

    let pending = service.select_plan(user, Plan::Monthly, now).await.unwrap();
    assert_eq!(pending.amount, 99);

    service
        .submit_evidence(
            user,
            MessageRef {
                chat_id: user,
                message_id: 7,
            },
            "shot1".into(),
            now,
        )
        .await
        .unwrap();

    let outcome = service.decide(user, true, 999, now).await.unwrap();
    assert!(matches!(outcome, DecisionOutcome::Approved { .. }));

    let record = store.users.get(user).await.unwrap();
    assert!(record.is_premium);
    assert_eq!(record.premium_plan, Some(Plan::Monthly));

    let history = store.invites.history(user).await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].plan, Plan::Monthly);
    assert!(!history[0].used);

    assert!(store.pending.get(user).await.is_none());

    // The full entity set survives a flush/reload cycle unchanged
    store.flush_all().await.unwrap();
    let reloaded = StoreService::load(JsonStore::new(dir.path())).await.unwrap();
    assert_eq!(reloaded.users.snapshot().await, store.users.snapshot().await);
    assert_eq!(
        reloaded.invites.snapshot().await,
        store.invites.snapshot().await
    );
    assert_eq!(
        reloaded.pending.snapshot().await,
        store.pending.snapshot().await
    );
    assert_eq!(reloaded.abuse.snapshot(), store.abuse.snapshot());
}

#[tokio::test]
async fn test_lifetime_entitlement_is_unlimited_with_finite_link() {
    let dir = tempfile::tempdir().unwrap();
    let store = StoreService::load(JsonStore::new(dir.path())).await.unwrap();
    let service = verification_service(&store);
    let now = Utc::now();
    let user = 2002;

    service.select_plan(user, Plan::Lifetime, now).await.unwrap();
    service.decide(user, true, 999, now).await.unwrap();

    let record = store.users.get(user).await.unwrap();
    assert_eq!(record.premium_until, Some(PremiumUntil::Unlimited));

    let history = store.invites.history(user).await;
    assert_eq!(history[0].expires_at, now + Duration::days(365));
}

#[tokio::test]
async fn test_rejection_requires_fresh_selection() {
    let dir = tempfile::tempdir().unwrap();
    let store = StoreService::load(JsonStore::new(dir.path())).await.unwrap();
    let service = verification_service(&store);
    let now = Utc::now();
    let user = 3003;

    service.select_plan(user, Plan::Monthly, now).await.unwrap();
    service
        .submit_evidence(
            user,
            MessageRef {
                chat_id: user,
                message_id: 1,
            },
            "blurry".into(),
            now,
        )
        .await
        .unwrap();

    let outcome = service.decide(user, false, 999, now).await.unwrap();
    assert!(matches!(outcome, DecisionOutcome::Rejected));
    assert!(store.pending.get(user).await.is_none());
    assert!(store.invites.history(user).await.is_empty());

    // No retry without a fresh plan selection
    let result = service
        .submit_evidence(
            user,
            MessageRef {
                chat_id: user,
                message_id: 2,
            },
            "retry".into(),
            now,
        )
        .await;
    assert_matches!(result, Err(PayGateError::NoPendingIntent { .. }));
}

#[tokio::test]
async fn test_spam_burst_blocks_and_recovers() {
    let dir = tempfile::tempdir().unwrap();
    let store = StoreService::load(JsonStore::new(dir.path())).await.unwrap();
    let service = abuse_service(&store);
    let now = Utc::now();
    let user = 4004;

    // Five requests inside the 10-second window, the fifth is denied
    for i in 0..4 {
        assert!(service.admit(user, now + Duration::seconds(i)).await.is_allowed());
    }
    assert!(!service.admit(user, now + Duration::seconds(4)).await.is_allowed());

    // Still blocked one second later
    assert!(!service.admit(user, now + Duration::seconds(5)).await.is_allowed());

    // Allowed again after the level-1 duration of 300 seconds
    assert!(service
        .admit(user, now + Duration::seconds(4 + 301))
        .await
        .is_allowed());
}

#[tokio::test]
async fn test_manual_ban_blocks_until_expiry() {
    let dir = tempfile::tempdir().unwrap();
    let store = StoreService::load(JsonStore::new(dir.path())).await.unwrap();
    let service = abuse_service(&store);
    let now = Utc::now();
    let user = 5005;

    service
        .ban(user, Duration::seconds(60), "test", 999, now)
        .await
        .unwrap();

    assert!(!service.admit(user, now + Duration::seconds(30)).await.is_allowed());
    assert!(service.admit(user, now + Duration::seconds(61)).await.is_allowed());
}

#[tokio::test]
async fn test_unban_has_no_residual_block() {
    let dir = tempfile::tempdir().unwrap();
    let store = StoreService::load(JsonStore::new(dir.path())).await.unwrap();
    let service = abuse_service(&store);
    let now = Utc::now();
    let user = 6006;

    service
        .ban(user, Duration::seconds(600), "spam", 999, now)
        .await
        .unwrap();
    service.unban(user).await.unwrap();

    assert!(service.admit(user, now).await.is_allowed());
}
