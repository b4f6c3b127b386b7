//! Alert state and decision models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::accounts::{parse_resin_threshold_name, resin_threshold_name, AccountId};
use crate::diff::{ChangeRecord, RosterTotals, TimerKind};
use crate::errors::{Error, ValidationError};

/// Per-threshold alert flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThresholdState {
    /// Not yet fired in the current accumulation cycle.
    #[default]
    Armed,
    /// Notification sent; suppressed until the resource drops back.
    Fired,
}

impl ThresholdState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThresholdState::Armed => "ARMED",
            ThresholdState::Fired => "FIRED",
        }
    }
}

impl fmt::Display for ThresholdState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThresholdState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ARMED" => Ok(ThresholdState::Armed),
            "FIRED" => Ok(ThresholdState::Fired),
            other => Err(ValidationError::InvalidInput(format!(
                "unknown threshold state '{}'",
                other
            ))
            .into()),
        }
    }
}

/// Persisted alert flags of one account, keyed by threshold name (`resin_<value>`).
///
/// Thresholds without an entry are Armed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertState {
    pub account_id: AccountId,
    pub thresholds: BTreeMap<String, ThresholdState>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl AlertState {
    pub fn new(account_id: AccountId) -> Self {
        AlertState {
            account_id,
            thresholds: BTreeMap::new(),
            updated_at: None,
        }
    }

    pub fn state_of(&self, threshold: u32) -> ThresholdState {
        self.thresholds
            .get(&resin_threshold_name(threshold))
            .copied()
            .unwrap_or_default()
    }

    pub fn set(&mut self, threshold: u32, state: ThresholdState) {
        self.thresholds.insert(resin_threshold_name(threshold), state);
    }

    /// Threshold values with a stored flag, ascending. Unparseable names are skipped.
    pub fn threshold_values(&self) -> Vec<u32> {
        let mut values: Vec<u32> = self
            .thresholds
            .keys()
            .filter_map(|name| parse_resin_threshold_name(name))
            .collect();
        values.sort_unstable();
        values
    }
}

/// What a notification is about, before it is rendered for an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertEvent {
    #[serde(rename_all = "camelCase")]
    ResinThreshold { threshold: u32, resin: u32, resin_max: u32 },
    #[serde(rename_all = "camelCase")]
    RosterUpdate {
        changes: Vec<ChangeRecord>,
        totals: Option<RosterTotals>,
    },
    #[serde(rename_all = "camelCase")]
    TimerReset { timers: Vec<TimerKind> },
}

/// An alert the policy decided to send, with its idempotency key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingAlert {
    pub event: AlertEvent,
    pub captured_at: DateTime<Utc>,
    /// `<account>:<kind>:<detail>:<captured_at>`; equal inputs give equal keys.
    pub dedupe_key: String,
}

/// Output of [`super::AlertPolicy::decide`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertDecision {
    pub alerts: Vec<PendingAlert>,
    pub next_state: AlertState,
}
