use serde::Deserialize;
use serde_json::Value;

use resinwatch_core::snapshots::RawStatusPayload;

/// `dailyNote` response body.
#[derive(Debug, Default, Deserialize)]
pub struct DailyNoteData {
    pub current_resin: Option<u32>,
    pub max_resin: Option<u32>,
    /// Seconds until full, sent as a numeric string
    pub resin_recovery_time: Option<Value>,
    pub finished_task_num: Option<u32>,
    pub total_task_num: Option<u32>,
    pub is_extra_task_reward_received: Option<bool>,
    pub remain_resin_discount_num: Option<u32>,
    #[serde(default)]
    pub expeditions: Vec<ExpeditionData>,
    pub current_home_coin: Option<u32>,
    pub max_home_coin: Option<u32>,
    pub home_coin_recovery_time: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExpeditionData {
    /// "Ongoing" or "Finished"
    #[serde(default)]
    pub status: String,
}

impl DailyNoteData {
    pub fn into_raw(self) -> RawStatusPayload {
        let finished = self
            .expeditions
            .iter()
            .filter(|e| e.status.eq_ignore_ascii_case("finished"))
            .count() as u32;

        RawStatusPayload {
            server_time: None,
            current_resin: self.current_resin,
            max_resin: self.max_resin,
            resin_recovery_time: self.resin_recovery_time,
            finished_expeditions: Some(finished),
            total_expeditions: Some(self.expeditions.len() as u32),
            current_home_coin: self.current_home_coin,
            max_home_coin: self.max_home_coin,
            home_coin_recovery_time: self.home_coin_recovery_time,
            finished_commissions: self.finished_task_num,
            total_commissions: self.total_task_num,
            commission_reward_claimed: self.is_extra_task_reward_received,
            remaining_boss_discounts: self.remain_resin_discount_num,
            abyss_reset_at: None,
        }
    }
}
