//! Notifications module - rendered messages and delivery channel traits.

mod message_composer;
mod notifications_model;
mod notifications_traits;

pub use message_composer::{compose_alert, compose_status, compose_trend_summary, status_lines};
pub use notifications_model::{Notification, NotificationKind};
pub use notifications_traits::{
    MemoryNotificationSink, NoOpNotificationSink, NotificationSinkTrait,
};
