//! Slack incoming-webhook delivery.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, warn};

use resinwatch_core::errors::{Error, Result};
use resinwatch_core::notifications::{Notification, NotificationSinkTrait};

const WEBHOOK_TIMEOUT_SECS: u64 = 10;
const RECENT_KEYS_CAPACITY: usize = 256;

pub struct SlackNotifier {
    client: Client,
    webhook_url: String,
    /// Dedupe keys of recently delivered notifications, oldest first.
    recent_keys: Mutex<VecDeque<String>>,
}

impl SlackNotifier {
    pub fn new(webhook_url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(WEBHOOK_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            webhook_url: webhook_url.to_string(),
            recent_keys: Mutex::new(VecDeque::new()),
        }
    }

    fn already_delivered(&self, key: &str) -> bool {
        self.recent_keys
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .any(|k| k == key)
    }

    fn remember(&self, key: &str) {
        let mut keys = self.recent_keys.lock().unwrap_or_else(|e| e.into_inner());
        if keys.len() == RECENT_KEYS_CAPACITY {
            keys.pop_front();
        }
        keys.push_back(key.to_string());
    }
}

#[async_trait]
impl NotificationSinkTrait for SlackNotifier {
    async fn deliver(&self, notification: &Notification) -> Result<()> {
        if self.already_delivered(&notification.dedupe_key) {
            debug!(
                "Skipping already delivered notification {}",
                notification.dedupe_key
            );
            return Ok(());
        }

        let payload = json!({ "text": notification.to_text() });
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::Notification(format!("webhook request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                "Slack webhook rejected {} notification for {}: {}",
                notification.kind, notification.account_name, status
            );
            return Err(Error::Notification(format!(
                "webhook returned {}: {}",
                status, body
            )));
        }

        self.remember(&notification.dedupe_key);
        Ok(())
    }
}
