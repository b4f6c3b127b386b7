//! Background polling loop.
//!
//! Every tick runs each account's cycle concurrently, then posts whatever
//! trend summaries have come due for that account.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use resinwatch_core::errors::{Error, ErrorPolicy};
use resinwatch_core::notifications::compose_trend_summary;

use crate::main_lib::{AccountContext, AppState};

/// Runs cycles forever, one tick per `period`. The first tick is immediate.
pub async fn run_polling_loop(state: Arc<AppState>, period: Duration) {
    info!(
        "Polling scheduler started ({}s interval, {} account(s))",
        period.as_secs(),
        state.accounts.len()
    );

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        run_tick(&state).await;
    }
}

/// One pass over every account. Accounts never abort each other.
pub async fn run_tick(state: &AppState) {
    join_all(state.accounts.iter().map(|ctx| run_account(state, ctx))).await;
}

async fn run_account(state: &AppState, ctx: &AccountContext) {
    let account = &ctx.account;
    match ctx
        .cycle_service
        .poll(account, state.provider.as_ref(), state.sink.as_ref())
        .await
    {
        Ok((outcome, report)) => debug!(
            "Cycle for {}: {} change(s), {} delivered, {} failed",
            account.display_name,
            outcome.change_set.changes.len(),
            report.delivered,
            report.failed
        ),
        Err(e) => log_cycle_error(&account.display_name, &e),
    }

    // Summaries read only committed history, so they run even after a failed cycle.
    post_due_summaries(state, ctx).await;
}

fn log_cycle_error(account_name: &str, err: &Error) {
    match err.policy() {
        ErrorPolicy::Skip => info!("Cycle for {} skipped: {}", account_name, err),
        ErrorPolicy::Degrade => warn!("Cycle for {} degraded: {}", account_name, err),
        ErrorPolicy::AbortAccount => error!("Cycle for {} failed: {}", account_name, err),
    }
}

async fn post_due_summaries(state: &AppState, ctx: &AccountContext) {
    let account = &ctx.account;
    let now = Utc::now();
    let reports = match ctx.summary_service.due_reports(account, now) {
        Ok(reports) => reports,
        Err(e) => {
            warn!("Could not build summaries for {}: {}", account.display_name, e);
            return;
        }
    };

    for report in reports {
        if report.is_reportable() {
            let notification = compose_trend_summary(account, &report);
            if let Err(e) = state.sink.deliver(&notification).await {
                // Not marked: the window stays due and is retried next tick.
                warn!(
                    "Failed to post {} summary for {}: {}",
                    report.window.label(),
                    account.display_name,
                    e
                );
                continue;
            }
            info!(
                "Posted {} summary for {}",
                report.window.label(),
                account.display_name
            );
        }

        if let Err(e) = ctx
            .summary_service
            .mark_reported(account, report.window, now)
            .await
        {
            warn!(
                "Could not record {} summary run for {}: {}",
                report.window.label(),
                account.display_name,
                e
            );
        }
    }
}
