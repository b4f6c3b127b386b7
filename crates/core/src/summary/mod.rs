//! Summary module - trend reports over stored snapshot history.

mod summary_model;
mod summary_service;

pub use summary_model::{ResinStats, SummaryWindow, TrendReport};
pub use summary_service::SummaryService;
