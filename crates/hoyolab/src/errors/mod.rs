//! Error types for the HoYoLAB client.

use resinwatch_core::errors::Error;
use thiserror::Error;

/// Errors that can occur while talking to the game-record API.
#[derive(Error, Debug)]
pub enum HoyolabError {
    /// The request did not complete (DNS, TLS, connection reset).
    #[error("Request failed: {0}")]
    Transport(String),

    /// The request timed out.
    #[error("Request timed out")]
    Timeout,

    /// Non-2xx HTTP status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The API answered with a non-zero `retcode`.
    #[error("API error {retcode}: {message}")]
    Api { retcode: i64, message: String },

    /// The cookies were rejected; the account must log in again.
    #[error("Invalid cookies (refresh ltuid_v2 and ltoken_v2): {message}")]
    InvalidCookies { message: String },

    /// The body was not the JSON we expected.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// The UID does not map to a known server region.
    #[error("Cannot determine server region for UID")]
    UnknownRegion,
}

// retcodes the API uses for rejected or expired cookies
const INVALID_COOKIE_RETCODES: [i64; 3] = [-100, 10001, 10103];

impl HoyolabError {
    /// Classifies a non-zero `retcode` envelope.
    pub fn from_retcode(retcode: i64, message: String) -> Self {
        if INVALID_COOKIE_RETCODES.contains(&retcode) {
            HoyolabError::InvalidCookies { message }
        } else {
            HoyolabError::Api { retcode, message }
        }
    }

    pub fn is_invalid_cookies(&self) -> bool {
        matches!(self, HoyolabError::InvalidCookies { .. })
    }
}

impl From<reqwest::Error> for HoyolabError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            HoyolabError::Timeout
        } else {
            HoyolabError::Transport(e.to_string())
        }
    }
}

impl From<HoyolabError> for Error {
    fn from(e: HoyolabError) -> Self {
        Error::Fetch(e.to_string())
    }
}
