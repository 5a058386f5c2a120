//! Helper functions and utilities
//!
//! This module contains common helper functions used throughout the application.

use chrono::{DateTime, Duration, Utc};

/// Format a timestamp for display
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Format a remaining block duration the way users see it:
/// "2 hours 05 minutes" above an hour, "4:30" below.
pub fn format_remaining(remaining: Duration) -> String {
    let total_seconds = remaining.num_seconds().max(0);
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{} hours {:02} minutes", hours, minutes)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

/// Compact remaining-time display for admin listings ("2h 5m" / "12m").
pub fn format_remaining_short(remaining: Duration) -> String {
    let total_minutes = (remaining.num_seconds().max(0) + 59) / 60;
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}
