//! Game-record API response types and their mapping to core raw payloads.

mod character;
mod daily_note;

pub use character::{CharacterListData, CharacterListItem, WeaponData};
pub use daily_note::{DailyNoteData, ExpeditionData};

use serde::Deserialize;

use crate::errors::HoyolabError;

/// Common envelope of every game-record response.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    pub retcode: i64,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    /// Unwraps `data`, mapping a non-zero `retcode` to an error.
    pub fn into_data(self) -> Result<T, HoyolabError> {
        if self.retcode != 0 {
            return Err(HoyolabError::from_retcode(self.retcode, self.message));
        }
        self.data
            .ok_or_else(|| HoyolabError::Parse("response has no data".to_string()))
    }
}
