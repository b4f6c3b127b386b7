use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use log::warn;
use serde_json::Value;
use std::fmt;

use crate::constants::{DISPLAY_TIME_FORMAT, STORAGE_TIMESTAMP_FORMAT};
use crate::errors::{Error, Result};

/// An instant rendered in an account's local timezone.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalDisplayTime {
    pub local: DateTime<Tz>,
    /// True when the configured timezone was unusable and UTC was used instead.
    pub degraded: bool,
}

impl fmt::Display for LocalDisplayTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.local.format(DISPLAY_TIME_FORMAT))
    }
}

/// Parses an IANA timezone identifier.
pub fn parse_timezone(tz_identifier: &str) -> Result<Tz> {
    tz_identifier
        .trim()
        .parse::<Tz>()
        .map_err(|_| Error::InvalidTimezone(tz_identifier.to_string()))
}

/// Converts a UTC instant to local display time in the given timezone.
///
/// DST is resolved by `chrono-tz` for the instant itself, so the same
/// identifier can render different offsets across the year.
pub fn to_local(instant: DateTime<Utc>, tz_identifier: &str) -> Result<LocalDisplayTime> {
    let tz = parse_timezone(tz_identifier)?;
    Ok(LocalDisplayTime {
        local: instant.with_timezone(&tz),
        degraded: false,
    })
}

/// Like [`to_local`], but falls back to UTC (flagged) on an unknown identifier.
pub fn to_local_or_utc(instant: DateTime<Utc>, tz_identifier: &str) -> LocalDisplayTime {
    match to_local(instant, tz_identifier) {
        Ok(local) => local,
        Err(e) => {
            warn!("{}; displaying UTC instead", e);
            LocalDisplayTime {
                local: instant.with_timezone(&Tz::UTC),
                degraded: true,
            }
        }
    }
}

/// Interprets an upstream "time until full" field as seconds.
///
/// Accepts integer seconds, numeric strings, and absolute RFC 3339 timestamps
/// (which are made relative to `reference`). Returns `None` for anything else.
pub fn parse_recovery_seconds(value: &Value, reference: DateTime<Utc>) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            if let Ok(secs) = s.parse::<i64>() {
                return Some(secs);
            }
            DateTime::parse_from_rfc3339(&s.replace('Z', "+00:00"))
                .ok()
                .map(|target| (target.with_timezone(&Utc) - reference).num_seconds())
        }
        _ => None,
    }
}

/// Adds a recovery duration to a capture instant, saturating on overflow.
pub fn instant_after(captured_at: DateTime<Utc>, seconds: i64) -> DateTime<Utc> {
    Duration::try_seconds(seconds.max(0))
        .and_then(|d| captured_at.checked_add_signed(d))
        .unwrap_or(captured_at)
}

/// Returns things like "3h 12m", "45m", "2h", "ready" or "less than 1m".
pub fn format_duration_short(seconds: Option<i64>) -> String {
    let Some(seconds) = seconds else {
        return "?".to_string();
    };
    if seconds <= 0 {
        return "ready".to_string();
    }

    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 {
        parts.push(format!("{}m", minutes));
    }

    if parts.is_empty() {
        "less than 1m".to_string()
    } else {
        parts.join(" ")
    }
}

/// Timer text for a capped resource: "Full", "in 2h5m" or "Unknown".
pub fn format_timer(seconds: Option<i64>, current: Option<u32>, maximum: Option<u32>) -> String {
    if let (Some(current), Some(maximum)) = (current, maximum) {
        if current >= maximum {
            return "Full".to_string();
        }
    }
    let Some(seconds) = seconds else {
        return "Unknown".to_string();
    };
    if seconds <= 0 {
        return "Full".to_string();
    }

    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let mut text = String::from("in ");
    if hours > 0 {
        text.push_str(&format!("{}h", hours));
    }
    // Zero minutes are dropped once hours are shown.
    if minutes > 0 || hours == 0 {
        text.push_str(&format!("{}m", minutes));
    }
    text
}

/// Formats an instant in the canonical storage format.
pub fn to_storage_timestamp(instant: DateTime<Utc>) -> String {
    instant.format(STORAGE_TIMESTAMP_FORMAT).to_string()
}

/// Parses an instant written by [`to_storage_timestamp`] (or any RFC 3339 string).
pub fn from_storage_timestamp(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)?.with_timezone(&Utc))
}
