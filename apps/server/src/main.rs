mod config;
mod main_lib;
mod notifier;
mod scheduler;

use config::Config;
use main_lib::{build_state, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_files = config::load_env_files();
    init_tracing();
    for path in env_files {
        tracing::info!("Loaded env file: {}", path.display());
    }
    let config = Config::from_env()?;
    tracing::info!(
        "Loaded {} account(s) from {}",
        config.accounts.len(),
        config.accounts_path.display()
    );
    let state = build_state(&config).await?;

    tokio::select! {
        _ = scheduler::run_polling_loop(state, config.loop_interval) => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received, stopping");
        }
    }
    Ok(())
}
