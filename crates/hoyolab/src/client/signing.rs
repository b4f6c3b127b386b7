//! Request signing and server routing for the overseas game-record API.

use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::errors::HoyolabError;

/// Salt of the overseas `DS` header.
const DS_SALT: &str = "6s25p5ox5y14umn1p61aqyyvbvvl3lrt";

/// `DS` header value: `t,r,md5("salt=<salt>&t=<t>&r=<r>")`.
pub fn dynamic_secret(timestamp: i64, nonce: &str) -> String {
    let digest = md5::compute(format!("salt={}&t={}&r={}", DS_SALT, timestamp, nonce));
    format!("{},{},{:x}", timestamp, nonce, digest)
}

/// Signs a request made at `now` with a fresh random nonce.
pub fn generate_ds(now: DateTime<Utc>) -> String {
    let nonce: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect();
    dynamic_secret(now.timestamp(), &nonce)
}

/// Server region for a game UID, from the digits before the last eight.
pub fn server_region(uid: &str) -> Result<&'static str, HoyolabError> {
    let uid = uid.trim();
    if uid.len() < 9 || !uid.chars().all(|c| c.is_ascii_digit()) {
        return Err(HoyolabError::UnknownRegion);
    }
    match &uid[..uid.len() - 8] {
        "6" => Ok("os_usa"),
        "7" => Ok("os_euro"),
        "8" | "18" => Ok("os_asia"),
        "9" => Ok("os_cht"),
        _ => Err(HoyolabError::UnknownRegion),
    }
}

/// Capture time from an HTTP `Date` header.
pub fn parse_date_header(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|t| t.with_timezone(&Utc))
}
