//! Renders alerts and trend reports into [`Notification`]s.
//!
//! Instants are converted to the account's timezone here and nowhere else. An
//! unknown timezone degrades to UTC instead of failing the cycle.

use chrono::{DateTime, Utc};

use super::{Notification, NotificationKind};
use crate::accounts::Account;
use crate::alerts::{AlertEvent, PendingAlert};
use crate::diff::{ChangeKind, ChangeRecord, RosterTotals};
use crate::snapshots::ResourceSnapshot;
use crate::summary::TrendReport;
use crate::utils::time_utils::{format_timer, to_local_or_utc, to_storage_timestamp};

const BULLET: &str = "• ";

/// Daily note lines for the current resource snapshot.
pub fn status_lines(account: &Account, snapshot: &ResourceSnapshot) -> Vec<String> {
    let mut lines = Vec::new();

    let resin_timer = format_timer(
        snapshot.resin_recovery_seconds,
        Some(snapshot.resin_current),
        Some(snapshot.resin_max),
    );
    lines.push(format!(
        "Resin: {}/{} ({})",
        snapshot.resin_current, snapshot.resin_max, resin_timer
    ));
    if !snapshot.resin_is_full() {
        let full_at = to_local_or_utc(snapshot.resin_full_at, &account.timezone);
        lines.push(format!("Resin full at: {}", full_at));
    }

    lines.push(format!(
        "Expeditions finished: {}/{}",
        snapshot.expeditions_finished, snapshot.expeditions_total
    ));

    let teapot_timer = format_timer(
        snapshot.teapot_recovery_seconds,
        snapshot.teapot_current,
        snapshot.teapot_max,
    );
    match (snapshot.teapot_current, snapshot.teapot_max) {
        (Some(current), Some(max)) => lines.push(format!(
            "Teapot currency: {}/{} ({})",
            current, max, teapot_timer
        )),
        _ => lines.push(format!("Teapot currency: unknown ({})", teapot_timer)),
    }

    lines.push(format!(
        "Commissions: {}/{} ({})",
        snapshot.commissions_completed,
        snapshot.commissions_total,
        if snapshot.commission_reward_claimed {
            "reward claimed"
        } else {
            "reward NOT claimed"
        }
    ));

    lines
}

/// Renders the per-cycle daily note post for `account`.
pub fn compose_status(account: &Account, snapshot: &ResourceSnapshot) -> Notification {
    Notification {
        account_name: account.display_name.clone(),
        mention: account.mention.clone(),
        kind: NotificationKind::Status,
        title: format!("Genshin Daily Notes - {}", account.display_name),
        body: status_lines(account, snapshot).join("\n"),
        captured_at: snapshot.captured_at,
        dedupe_key: format!(
            "{}:status:{}",
            account.id,
            to_storage_timestamp(snapshot.captured_at)
        ),
    }
}

/// Renders a pending alert for `account`. `snapshot` is the snapshot of the
/// cycle that produced the alert.
pub fn compose_alert(
    account: &Account,
    snapshot: &ResourceSnapshot,
    alert: &PendingAlert,
) -> Notification {
    let (kind, title, body) = match &alert.event {
        AlertEvent::ResinThreshold {
            threshold,
            resin,
            resin_max,
        } => {
            let mut lines = vec![format!(
                "Resin reached {} ({}/{})",
                threshold, resin, resin_max
            )];
            lines.extend(status_lines(account, snapshot));
            (
                NotificationKind::ResinThreshold,
                format!("Genshin Daily Notes - {}", account.display_name),
                lines.join("\n"),
            )
        }
        AlertEvent::RosterUpdate { changes, totals } => {
            let mut lines = Vec::new();
            if let Some(totals) = totals {
                lines.push(format!(
                    "_Snapshot: {} → {}_",
                    local_stamp(account, totals.previous_captured_at),
                    local_stamp(account, alert.captured_at)
                ));
                lines.push(String::new());
            }
            lines.extend(change_sections(changes));
            if let Some(line) = totals.as_ref().and_then(totals_line) {
                lines.push("*Totals*".to_string());
                lines.push(line);
            }
            (
                NotificationKind::RosterUpdate,
                format!("Genshin Character Updates - {}", account.display_name),
                lines.join("\n").trim().to_string(),
            )
        }
        AlertEvent::TimerReset { timers } => {
            let lines: Vec<String> = timers
                .iter()
                .map(|t| format!("{}{} reset", BULLET, t.label()))
                .collect();
            (
                NotificationKind::TimerReset,
                format!("Genshin Timers - {}", account.display_name),
                lines.join("\n"),
            )
        }
    };

    Notification {
        account_name: account.display_name.clone(),
        mention: account.mention.clone(),
        kind,
        title,
        body,
        captured_at: alert.captured_at,
        dedupe_key: alert.dedupe_key.clone(),
    }
}

/// Renders a trend report for `account`.
pub fn compose_trend_summary(account: &Account, report: &TrendReport) -> Notification {
    let mut lines = Vec::new();

    let (start, end) = report.roster_span.unwrap_or((report.from, report.to));
    lines.push(format!(
        "_Period: {} ({} → {})_",
        report.window,
        local_stamp(account, start),
        local_stamp(account, end)
    ));
    lines.push(String::new());
    lines.extend(change_sections(&report.character_changes));

    let crossings = report.count(ChangeKind::ResourceThresholdCrossed);
    let resets = report.count(ChangeKind::TimerReset);
    lines.push("*Activity*".to_string());
    lines.push(format!(
        "{}Snapshots: {} status, {} roster",
        BULLET, report.resource_snapshots, report.roster_snapshots
    ));
    if let Some(resin) = &report.resin {
        lines.push(format!(
            "{}Resin: min {}, max {}, avg {:.1}",
            BULLET, resin.min, resin.max, resin.average
        ));
    }
    if crossings > 0 || resets > 0 {
        lines.push(format!(
            "{}Threshold crossings: {}, timer resets: {}",
            BULLET, crossings, resets
        ));
    }

    Notification {
        account_name: account.display_name.clone(),
        mention: account.mention.clone(),
        kind: NotificationKind::TrendSummary,
        title: format!("Genshin Character Summary - {}", account.display_name),
        body: lines.join("\n").trim().to_string(),
        captured_at: report.to,
        dedupe_key: format!(
            "{}:summary:{}:{}",
            report.account_id,
            report.window.days(),
            to_storage_timestamp(report.to)
        ),
    }
}

/// Character changes grouped by kind, each group headed with its count.
fn change_sections(changes: &[ChangeRecord]) -> Vec<String> {
    let mut lines = Vec::new();
    for kind in ChangeKind::ALL.iter().filter(|k| k.is_character_kind()) {
        let entries: Vec<&ChangeRecord> = changes.iter().filter(|c| c.kind() == *kind).collect();
        if entries.is_empty() {
            continue;
        }
        lines.push(format!("*{} ({})*", kind.heading(), entries.len()));
        lines.extend(entries.iter().map(|c| format!("{}{}", BULLET, c)));
        lines.push(String::new());
    }
    lines
}

fn totals_line(totals: &RosterTotals) -> Option<String> {
    if totals.before == totals.after {
        return None;
    }
    let delta = totals.after as i64 - totals.before as i64;
    let sign = if delta > 0 { "+" } else { "" };
    Some(format!(
        "{}Characters: {} → {} ({}{})",
        BULLET, totals.before, totals.after, sign, delta
    ))
}

fn local_stamp(account: &Account, instant: DateTime<Utc>) -> String {
    to_local_or_utc(instant, &account.timezone).to_string()
}
