//! Session configuration.
//!
//! Every field has a default, so a partial JSON document (or none at all)
//! produces a playable session.

use serde::{Deserialize, Serialize};
use storefront_logic::constants::{
    CALENDAR_STEP_MAX, CALENDAR_STEP_MIN, DEFAULT_CALENDAR_HORIZON,
    DEFAULT_QUESTS_PER_TIER_UNLOCK, DEFAULT_RENT_DAY_INTERVAL, DEFAULT_SLOT_COUNT,
};
use storefront_logic::selection::{CalendarRules, TierWeights};
use storefront_logic::upgrades::{UpgradeSpec, UpgradeTrack};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub slot_count: usize,
    pub rent_day_interval: u32,
    pub calendar_horizon: u32,
    pub calendar_step_min: u32,
    pub calendar_step_max: u32,
    pub tier_weights: TierWeights,
    /// Collected quests per tier unlock. 0 disables unlocking.
    pub quests_per_tier_unlock: u32,
    pub starting_balance: i64,
    pub starting_day: u32,
    pub seed: u64,
    pub upgrades: Vec<UpgradeSpec>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            slot_count: DEFAULT_SLOT_COUNT,
            rent_day_interval: DEFAULT_RENT_DAY_INTERVAL,
            calendar_horizon: DEFAULT_CALENDAR_HORIZON,
            calendar_step_min: CALENDAR_STEP_MIN,
            calendar_step_max: CALENDAR_STEP_MAX,
            tier_weights: TierWeights::default(),
            quests_per_tier_unlock: DEFAULT_QUESTS_PER_TIER_UNLOCK,
            starting_balance: 500,
            starting_day: 1,
            seed: 42,
            upgrades: UpgradeTrack::ALL
                .iter()
                .map(|t| UpgradeSpec::default_for(*t))
                .collect(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Tuning for a track; tracks missing from `upgrades` use the defaults.
    pub fn upgrade_spec(&self, track: UpgradeTrack) -> UpgradeSpec {
        self.upgrades
            .iter()
            .find(|s| s.track == track)
            .cloned()
            .unwrap_or_else(|| UpgradeSpec::default_for(track))
    }

    pub fn calendar_rules(&self) -> CalendarRules {
        CalendarRules {
            rent_interval: self.rent_day_interval,
            horizon: self.starting_day.saturating_add(self.calendar_horizon),
            step_min: self.calendar_step_min,
            step_max: self.calendar_step_max,
            start_day: self.starting_day,
        }
    }
}
