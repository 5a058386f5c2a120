//! Invite issuer implementation
//!
//! Issues single-use, time-bounded join credentials for the gated channel
//! matching a plan. The engines only see the `InviteIssuer` trait; issuer
//! failures are surfaced verbatim to the admin decision path, never retried
//! automatically.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use teloxide::{
    payloads::CreateChatInviteLinkSetters, prelude::Request, requests::Requester, types::ChatId,
    Bot,
};
use tracing::info;

use crate::config::PlansConfig;
use crate::models::{IssuedInvite, Plan};
use crate::utils::errors::{PayGateError, Result};

/// Capability to mint a single-use invite credential
#[async_trait]
pub trait InviteIssuer: Send + Sync {
    async fn issue(&self, plan: Plan, user_id: i64, now: DateTime<Utc>) -> Result<IssuedInvite>;
}

/// Telegram-backed invite issuer
#[derive(Clone)]
pub struct TelegramInviteIssuer {
    bot: Bot,
    plans: PlansConfig,
}

impl TelegramInviteIssuer {
    pub fn new(bot: Bot, plans: PlansConfig) -> Self {
        Self { bot, plans }
    }
}

#[async_trait]
impl InviteIssuer for TelegramInviteIssuer {
    async fn issue(&self, plan: Plan, user_id: i64, now: DateTime<Utc>) -> Result<IssuedInvite> {
        let channel_id = self.plans.get(plan).channel_id;
        if channel_id == 0 {
            return Err(PayGateError::ChannelNotConfigured { plan });
        }

        let expires_at = now + plan.invite_ttl();

        let link = self
            .bot
            .create_chat_invite_link(ChatId(channel_id))
            .member_limit(1)
            .expire_date(expires_at)
            .send()
            .await?;

        info!(
            user_id = user_id,
            plan = %plan,
            channel_id = channel_id,
            expires_at = %expires_at,
            "Invite link created"
        );

        Ok(IssuedInvite {
            link: link.invite_link,
            plan,
            created_at: now,
            expires_at,
            used: false,
        })
    }
}
