//! Data models module
//!
//! Persisted entity types, one file per entity kind.

pub mod abuse;
pub mod invite;
pub mod plan;
pub mod user;
pub mod verification;

pub use abuse::AbuseRecord;
pub use invite::IssuedInvite;
pub use plan::Plan;
pub use user::{PremiumUntil, UserRecord};
pub use verification::{MessageRef, PendingVerification, ScreenshotRef, VerificationState};
