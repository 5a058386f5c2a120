//! Services module
//!
//! This module contains the two core engines and their collaborator
//! boundaries (invite issuer, notification sink).

pub mod abuse;
pub mod invite;
pub mod notification;
pub mod verification;

// Re-export commonly used services
pub use abuse::{AbuseControlService, BannedEntry, Decision};
pub use invite::{InviteIssuer, TelegramInviteIssuer};
pub use notification::{Delivery, EvidenceForward, NotificationSink, TelegramNotifier};
pub use verification::{DecisionOutcome, VerificationService};

use std::sync::Arc;

use teloxide::Bot;

use crate::config::Settings;
use crate::storage::StoreService;

/// Service factory for creating and managing all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub abuse: AbuseControlService,
    pub verification: VerificationService,
    pub notifier: Arc<dyn NotificationSink>,
    pub store: StoreService,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services wired to Telegram.
    pub fn new(bot: Bot, settings: Settings, store: StoreService) -> Self {
        let notifier: Arc<dyn NotificationSink> =
            Arc::new(TelegramNotifier::new(bot.clone(), settings.clone()));
        let issuer: Arc<dyn InviteIssuer> =
            Arc::new(TelegramInviteIssuer::new(bot, settings.plans.clone()));

        let abuse = AbuseControlService::new(
            store.abuse.clone(),
            notifier.clone(),
            settings.spam.clone(),
        );
        let verification = VerificationService::new(
            store.users.clone(),
            store.pending.clone(),
            store.invites.clone(),
            issuer,
            notifier.clone(),
            settings,
        );

        Self {
            abuse,
            verification,
            notifier,
            store,
        }
    }
}
