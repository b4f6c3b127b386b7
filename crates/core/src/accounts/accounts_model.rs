//! Account domain models.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{DEFAULT_RESIN_THRESHOLDS, DEFAULT_TIMEZONE, RESIN_THRESHOLD_PREFIX};

/// Opaque account key.
///
/// This is the only account identifier that may appear in logs, storage keys
/// and notifications. It is never derived from the game UID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(key: impl Into<String>) -> Self {
        AccountId(key.into())
    }

    /// Derives a stable key from a display name: lowercase ASCII alphanumerics,
    /// every other run of characters collapsed to a single `-`.
    pub fn from_display_name(name: &str) -> Self {
        let mut key = String::with_capacity(name.len());
        let mut pending_dash = false;
        for ch in name.trim().chars() {
            if ch.is_ascii_alphanumeric() {
                if pending_dash && !key.is_empty() {
                    key.push('-');
                }
                pending_dash = false;
                key.push(ch.to_ascii_lowercase());
            } else {
                pending_dash = true;
            }
        }
        if key.is_empty() {
            key.push_str("account");
        }
        AccountId(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Upstream credentials. `Debug` never prints the values.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct AccountCredentials {
    pub uid: String,
    pub ltuid_v2: String,
    pub ltoken_v2: String,
}

impl fmt::Debug for AccountCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountCredentials")
            .field("uid", &"<hidden>")
            .field("ltuid_v2", &"<hidden>")
            .field("ltoken_v2", &"<hidden>")
            .finish()
    }
}

/// One monitored game account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    /// Friendly name used in notifications (no UID leak).
    pub display_name: String,
    /// IANA timezone identifier, e.g. "Asia/Tokyo".
    pub timezone: String,
    pub resin_thresholds: Vec<u32>,
    /// Optional chat mention such as "<@U0123ABCD>".
    pub mention: Option<String>,
    /// SQLite file name for this account's store.
    pub db_name: String,
    pub credentials: AccountCredentials,
}

impl Account {
    /// Builds an account with default timezone and thresholds.
    pub fn new(display_name: &str, db_name: &str, credentials: AccountCredentials) -> Self {
        Account {
            id: AccountId::from_display_name(display_name),
            display_name: display_name.to_string(),
            timezone: DEFAULT_TIMEZONE.to_string(),
            resin_thresholds: DEFAULT_RESIN_THRESHOLDS.to_vec(),
            mention: None,
            db_name: db_name.to_string(),
            credentials,
        }
    }

    /// Thresholds sorted ascending with duplicates and zeros removed.
    pub fn normalized_thresholds(&self) -> Vec<u32> {
        let mut thresholds: Vec<u32> = self
            .resin_thresholds
            .iter()
            .copied()
            .filter(|t| *t > 0)
            .collect();
        thresholds.sort_unstable();
        thresholds.dedup();
        thresholds
    }
}

/// Persisted name of a resin threshold.
pub fn resin_threshold_name(value: u32) -> String {
    format!("{}{}", RESIN_THRESHOLD_PREFIX, value)
}

/// Inverse of [`resin_threshold_name`].
pub fn parse_resin_threshold_name(name: &str) -> Option<u32> {
    name.strip_prefix(RESIN_THRESHOLD_PREFIX)?.parse().ok()
}
