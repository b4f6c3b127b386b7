use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use resinwatch_core::accounts::{Account, AccountCredentials, AccountId};
use resinwatch_core::alerts::AlertPolicy;
use resinwatch_core::errors::Error;

/// Loads `.env` then `stack.env` if present. Variables already set in the
/// process environment are never overridden.
pub fn load_env_files() -> Vec<PathBuf> {
    [".env", "stack.env"]
        .into_iter()
        .filter_map(|file| dotenvy::from_filename(file).ok())
        .collect()
}

const DEFAULT_DATA_DIR: &str = "/data";
const DEFAULT_ACCOUNTS_FILE: &str = "accounts.json";
const DEFAULT_LOOP_INTERVAL_SECS: u64 = 3600;

/// Every problem found while loading configuration, reported together.
#[derive(Error, Debug)]
#[error("Config error:\n - {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("\n - "))]
pub struct ConfigErrors(pub Vec<Error>);

pub struct Config {
    pub slack_webhook_url: String,
    pub data_dir: PathBuf,
    pub accounts_path: PathBuf,
    pub loop_interval: Duration,
    pub policy: AlertPolicy,
    pub accounts: Vec<Account>,
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigErrors> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigErrors> {
        let mut errors = Vec::new();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let slack_webhook_url = var("SLACK_WEBHOOK_URL").unwrap_or_else(|| {
            errors.push(Error::MissingConfigKey("SLACK_WEBHOOK_URL".to_string()));
            String::new()
        });

        let data_dir = PathBuf::from(var("DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.into()));
        let accounts_file = PathBuf::from(
            var("ACCOUNTS_FILE").unwrap_or_else(|| DEFAULT_ACCOUNTS_FILE.into()),
        );
        let accounts_path = if accounts_file.is_absolute() {
            accounts_file
        } else {
            data_dir.join(accounts_file)
        };

        let interval_raw = var("LOOP_INTERVAL_SECONDS")
            .unwrap_or_else(|| DEFAULT_LOOP_INTERVAL_SECS.to_string());
        let loop_secs = match interval_raw.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => secs,
            _ => {
                errors.push(Error::InvalidConfigValue(format!(
                    "LOOP_INTERVAL_SECONDS must be a positive integer, got: {}",
                    interval_raw
                )));
                DEFAULT_LOOP_INTERVAL_SECS
            }
        };

        let defaults = AlertPolicy::default();
        let mut flag = |key: &str, default: bool| match var(key) {
            None => default,
            Some(raw) => parse_flag(&raw).unwrap_or_else(|| {
                errors.push(Error::InvalidConfigValue(format!(
                    "{} must be true or false, got: {}",
                    key, raw
                )));
                default
            }),
        };
        let policy = AlertPolicy::new(
            flag("NOTIFY_ROSTER_CHANGES", defaults.notify_roster_changes),
            flag("NOTIFY_TIMER_RESETS", defaults.notify_timer_resets),
        )
        .with_status_every_cycle(flag(
            "NOTIFY_STATUS_EVERY_CYCLE",
            defaults.notify_status_every_cycle,
        ));

        let accounts = load_accounts(&accounts_path).unwrap_or_else(|e| {
            errors.push(e);
            Vec::new()
        });

        if !errors.is_empty() {
            return Err(ConfigErrors(errors));
        }

        Ok(Self {
            slack_webhook_url,
            data_dir,
            accounts_path,
            loop_interval: Duration::from_secs(loop_secs),
            policy,
            accounts,
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Reads `accounts.json`: a single object or an array of objects. Entries
/// missing a required field are skipped with a warning.
pub fn load_accounts(path: &Path) -> Result<Vec<Account>, Error> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        Error::ConfigIO(format!("accounts file not readable at {}: {}", path.display(), e))
    })?;
    let raw: Value = serde_json::from_str(&text).map_err(|e| {
        Error::InvalidConfigValue(format!("{} is not valid JSON: {}", path.display(), e))
    })?;

    let entries = match raw {
        Value::Array(items) => items,
        item @ Value::Object(_) => vec![item],
        _ => {
            return Err(Error::InvalidConfigValue(
                "accounts file must be a JSON object or an array".to_string(),
            ))
        }
    };

    let mut accounts: Vec<Account> = Vec::new();
    for (index, entry) in entries.iter().enumerate() {
        match parse_account(entry) {
            Ok(account) => {
                if accounts.iter().any(|a| a.id == account.id) {
                    warn!(
                        "Skipping account entry {}: key '{}' is already used",
                        index, account.id
                    );
                    continue;
                }
                accounts.push(account);
            }
            Err(missing) => warn!(
                "Skipping account entry {} due to missing field(s): {}",
                index,
                missing.join(", ")
            ),
        }
    }

    if accounts.is_empty() {
        return Err(Error::InvalidConfigValue(
            "No valid accounts loaded from accounts file".to_string(),
        ));
    }
    Ok(accounts)
}

fn text_field(entry: &Value, key: &str) -> Option<String> {
    match entry.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Builds one account, or returns the names of the missing required fields.
/// Credentials never appear in the error.
fn parse_account(entry: &Value) -> Result<Account, Vec<&'static str>> {
    if !entry.is_object() {
        return Err(vec!["<not an object>"]);
    }

    let required = ["name", "uid", "ltuid_v2", "ltoken_v2", "db_name"];
    let missing: Vec<&'static str> = required
        .into_iter()
        .filter(|key| text_field(entry, key).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(missing);
    }
    let field = |key: &str| text_field(entry, key).unwrap_or_default();

    let mut account = Account::new(
        &field("name"),
        &field("db_name"),
        AccountCredentials {
            uid: field("uid"),
            ltuid_v2: field("ltuid_v2"),
            ltoken_v2: field("ltoken_v2"),
        },
    );
    if let Some(key) = text_field(entry, "key") {
        account.id = AccountId::new(key);
    }
    if let Some(tz) = text_field(entry, "tz") {
        account.timezone = tz;
    }
    account.mention = text_field(entry, "slack_mention");
    if let Some(values) = entry.get("resin_thresholds").and_then(Value::as_array) {
        account.resin_thresholds = values
            .iter()
            .filter_map(Value::as_u64)
            .filter_map(|v| u32::try_from(v).ok())
            .collect();
    }
    Ok(account)
}
