//! Issued invite model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::plan::Plan;

/// A single-use, time-bounded join credential issued on approval.
///
/// Appended to the per-identity history; entries are never mutated or
/// removed by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuedInvite {
    pub link: String,
    pub plan: Plan,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
}
