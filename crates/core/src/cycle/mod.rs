//! Cycle module - one poll cycle per account, from raw payload to notifications.

mod cycle_model;
mod cycle_service;

pub use cycle_model::{CycleOutcome, DeliveryReport};
pub use cycle_service::{deliver_all, CycleService};

#[cfg(test)]
mod cycle_service_tests;
