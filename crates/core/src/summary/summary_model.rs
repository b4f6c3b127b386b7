//! Trend summary models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::accounts::AccountId;
use crate::diff::{ChangeKind, ChangeRecord};

/// Reporting windows for trend summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SummaryWindow {
    Week,
    Month,
    Quarter,
    Year,
}

impl SummaryWindow {
    pub const ALL: [SummaryWindow; 4] = [
        SummaryWindow::Week,
        SummaryWindow::Month,
        SummaryWindow::Quarter,
        SummaryWindow::Year,
    ];

    pub fn days(&self) -> u32 {
        match self {
            SummaryWindow::Week => 7,
            SummaryWindow::Month => 30,
            SummaryWindow::Quarter => 90,
            SummaryWindow::Year => 365,
        }
    }

    pub fn from_days(days: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|w| w.days() == days)
    }

    pub fn label(&self) -> &'static str {
        match self {
            SummaryWindow::Week => "Last 7 days",
            SummaryWindow::Month => "Last 30 days",
            SummaryWindow::Quarter => "Last 90 days",
            SummaryWindow::Year => "Last 365 days",
        }
    }
}

impl fmt::Display for SummaryWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Resin statistics over the resource snapshots of a window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResinStats {
    pub min: u32,
    pub max: u32,
    pub average: f64,
}

/// Aggregated change history of one account over one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendReport {
    pub account_id: AccountId,
    pub window: SummaryWindow,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub resource_snapshots: usize,
    pub roster_snapshots: usize,
    /// First and last roster capture inside the window.
    pub roster_span: Option<(DateTime<Utc>, DateTime<Utc>)>,
    pub kind_counts: BTreeMap<ChangeKind, usize>,
    /// Character changes in the order they happened.
    pub character_changes: Vec<ChangeRecord>,
    pub anomalies: usize,
    pub resin: Option<ResinStats>,
}

impl TrendReport {
    pub fn count(&self, kind: ChangeKind) -> usize {
        self.kind_counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn total_changes(&self) -> usize {
        self.kind_counts.values().sum()
    }

    /// Worth posting: at least two roster captures and at least one change.
    pub fn is_reportable(&self) -> bool {
        self.roster_snapshots >= 2 && !self.character_changes.is_empty()
    }
}
