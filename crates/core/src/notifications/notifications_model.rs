//! Outbound notification models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    Status,
    ResinThreshold,
    RosterUpdate,
    TimerReset,
    TrendSummary,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NotificationKind::Status => "STATUS",
            NotificationKind::ResinThreshold => "RESIN_THRESHOLD",
            NotificationKind::RosterUpdate => "ROSTER_UPDATE",
            NotificationKind::TimerReset => "TIMER_RESET",
            NotificationKind::TrendSummary => "TREND_SUMMARY",
        };
        f.write_str(s)
    }
}

/// A rendered, channel-agnostic message for one account.
///
/// Carries the display name only; the game UID never reaches this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub account_name: String,
    pub mention: Option<String>,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub captured_at: DateTime<Utc>,
    pub dedupe_key: String,
}

impl Notification {
    /// Plain text with the mention prefix, title and body, as posted to chat.
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        if let Some(mention) = self.mention.as_deref().filter(|m| !m.is_empty()) {
            text.push_str(mention);
            text.push(' ');
        }
        text.push('*');
        text.push_str(&self.title);
        text.push('*');
        if !self.body.is_empty() {
            text.push('\n');
            text.push_str(&self.body);
        }
        text
    }
}
