use serde::Deserialize;

use resinwatch_core::snapshots::{RawCharacter, RawWeapon};

/// `character/list` response body.
#[derive(Debug, Default, Deserialize)]
pub struct CharacterListData {
    #[serde(default)]
    pub list: Vec<CharacterListItem>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CharacterListItem {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub level: Option<u32>,
    /// Friendship level
    pub fetter: Option<u32>,
    pub actived_constellation_num: Option<u32>,
    pub weapon: Option<WeaponData>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WeaponData {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub level: Option<u32>,
    /// Refinement rank
    pub affix_level: Option<u32>,
}

impl CharacterListData {
    /// Upstream order is kept; validation happens in core.
    pub fn into_raw(self) -> Vec<RawCharacter> {
        self.list
            .into_iter()
            .map(|c| RawCharacter {
                id: c.id,
                name: c.name,
                level: c.level,
                friendship: c.fetter,
                constellation: c.actived_constellation_num,
                weapon: c.weapon.map(|w| RawWeapon {
                    id: w.id,
                    name: w.name,
                    level: w.level,
                    refinement: w.affix_level,
                }),
            })
            .collect()
    }
}
