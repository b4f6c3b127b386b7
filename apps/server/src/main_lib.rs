use std::sync::Arc;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use resinwatch_core::accounts::Account;
use resinwatch_core::cycle::CycleService;
use resinwatch_core::notifications::NotificationSinkTrait;
use resinwatch_core::status::StatusProviderTrait;
use resinwatch_core::summary::SummaryService;
use resinwatch_hoyolab::HoyolabClient;
use resinwatch_storage_sqlite::open_snapshot_repository;

use crate::config::Config;
use crate::notifier::SlackNotifier;

/// Everything one account needs for a cycle. Each account has its own store.
pub struct AccountContext {
    pub account: Account,
    pub cycle_service: CycleService,
    pub summary_service: SummaryService,
}

pub struct AppState {
    pub accounts: Vec<AccountContext>,
    pub provider: Arc<dyn StatusProviderTrait>,
    pub sink: Arc<dyn NotificationSinkTrait>,
}

pub fn init_tracing() {
    let log_format = std::env::var("RW_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let data_dir = config.data_dir.to_string_lossy().to_string();
    tracing::info!("Data directory in use: {}", data_dir);

    let mut accounts = Vec::with_capacity(config.accounts.len());
    for account in &config.accounts {
        let repository = open_snapshot_repository(&data_dir, &account.db_name)?;
        tracing::info!(
            "Opened store {} for account {}",
            account.db_name,
            account.display_name
        );
        accounts.push(AccountContext {
            account: account.clone(),
            cycle_service: CycleService::new(repository.clone()).with_policy(config.policy),
            summary_service: SummaryService::new(repository),
        });
    }

    Ok(Arc::new(AppState {
        accounts,
        provider: Arc::new(HoyolabClient::new()),
        sink: Arc::new(SlackNotifier::new(&config.slack_webhook_url)),
    }))
}
