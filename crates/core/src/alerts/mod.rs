//! Alerts module - persisted alert flags and the policy that drives them.

mod alert_policy;
mod alerts_model;

pub use alert_policy::AlertPolicy;
pub use alerts_model::{AlertDecision, AlertEvent, AlertState, PendingAlert, ThresholdState};
