//! Delivery channel traits.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use super::Notification;
use crate::errors::Result;

/// Trait for delivering rendered notifications.
///
/// Delivery happens after the cycle has been persisted, so a failed delivery
/// never rolls back alert state.
#[async_trait]
pub trait NotificationSinkTrait: Send + Sync {
    async fn deliver(&self, notification: &Notification) -> Result<()>;
}

/// Sink that drops everything, for runs without a delivery channel.
#[derive(Clone, Default)]
pub struct NoOpNotificationSink;

#[async_trait]
impl NotificationSinkTrait for NoOpNotificationSink {
    async fn deliver(&self, _notification: &Notification) -> Result<()> {
        Ok(())
    }
}

/// Sink that collects notifications in memory.
#[derive(Clone, Default)]
pub struct MemoryNotificationSink {
    delivered: Arc<Mutex<Vec<Notification>>>,
}

impl MemoryNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A poisoned lock is recovered; a panicking test thread never hides
    /// earlier deliveries.
    pub fn delivered(&self) -> Vec<Notification> {
        self.delivered
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl NotificationSinkTrait for MemoryNotificationSink {
    async fn deliver(&self, notification: &Notification) -> Result<()> {
        self.delivered
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(notification.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::NotificationKind;
    use chrono::{TimeZone, Utc};

    fn notification(key: &str) -> Notification {
        Notification {
            account_name: "Main".to_string(),
            mention: None,
            kind: NotificationKind::Status,
            title: "Genshin Daily Notes - Main".to_string(),
            body: "Resin: 40/160 (in 16h)".to_string(),
            captured_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
            dedupe_key: key.to_string(),
        }
    }

    #[tokio::test]
    async fn test_memory_sink_keeps_delivering_after_poisoned_lock() {
        let sink = MemoryNotificationSink::new();
        sink.deliver(&notification("main:status:a")).await.unwrap();

        let shared = sink.clone();
        let _ = std::thread::spawn(move || {
            let _guard = shared.delivered.lock().unwrap();
            panic!("poison the delivery log");
        })
        .join();
        assert!(sink.delivered.is_poisoned());

        sink.deliver(&notification("main:status:b")).await.unwrap();
        let keys: Vec<String> = sink.delivered().into_iter().map(|n| n.dedupe_key).collect();
        assert_eq!(keys, vec!["main:status:a", "main:status:b"]);
    }
}
