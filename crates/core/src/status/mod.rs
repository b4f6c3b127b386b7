//! Status module - upstream status provider seam.

mod status_traits;

pub use status_traits::StatusProviderTrait;
