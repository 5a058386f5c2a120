//! Pending verification model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::plan::Plan;

/// Opaque reference to submitted payment evidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenshotRef {
    /// Telegram file id of the screenshot photo
    pub file_id: String,
    pub submitted_at: DateTime<Utc>,
}

/// Reference to a message on the review surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
    pub chat_id: i64,
    pub message_id: i32,
}

/// Observable state of an open purchase intent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationState {
    /// Plan booked, waiting for payment evidence
    PlanSelected,
    /// Evidence submitted, waiting for the admin decision
    AwaitingAdmin,
}

/// An open purchase intent awaiting evidence and/or an admin decision.
///
/// At most one exists per identity; a new plan selection overwrites it and
/// verify/reject delete it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingVerification {
    pub plan: Plan,
    pub amount: u32,
    pub initiated_at: DateTime<Utc>,
    pub screenshot: Option<ScreenshotRef>,
    /// Review-surface message to update once the decision lands
    pub admin_message: Option<MessageRef>,
}

impl PendingVerification {
    pub fn new(plan: Plan, amount: u32, now: DateTime<Utc>) -> Self {
        Self {
            plan,
            amount,
            initiated_at: now,
            screenshot: None,
            admin_message: None,
        }
    }

    pub fn state(&self) -> VerificationState {
        if self.screenshot.is_some() {
            VerificationState::AwaitingAdmin
        } else {
            VerificationState::PlanSelected
        }
    }
}
