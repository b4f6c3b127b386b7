pub mod time_utils;

pub use time_utils::{
    format_duration_short, format_timer, to_local, to_local_or_utc, LocalDisplayTime,
};
