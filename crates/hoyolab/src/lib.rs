//! Resinwatch HoYoLAB Crate
//!
//! Implements [`resinwatch_core::status::StatusProviderTrait`] on top of the
//! HoYoLAB overseas game-record API.
//!
//! ```text
//! HoyolabClient ──GET dailyNote──────────▶ RawStatusPayload ─┐
//!               ──POST character/list────▶ Vec<RawCharacter> ─┴▶ FetchedStatus
//! ```
//!
//! Transport failures and non-zero `retcode`s surface as
//! `resinwatch_core::Error::Fetch`. Logs name accounts by display name only.

pub mod client;
pub mod errors;
pub mod models;

pub use client::HoyolabClient;
pub use errors::HoyolabError;
