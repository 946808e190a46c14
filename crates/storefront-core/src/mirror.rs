//! Read-only observer mirror of the replicated progression records.

use std::collections::{BTreeMap, HashMap};

use storefront_logic::buffs::BuffRecord;
use storefront_logic::effects::StatKind;
use storefront_logic::quests::{QuestProgress, QuestTier};
use storefront_logic::upgrades::{PendingUpgrade, UpgradeLevelPair, UpgradeTrack};

use crate::error::CodecError;
use crate::replication::{ActiveEvent, Delta, Envelope, RecordKey};
use crate::wire;

#[derive(Debug, Clone)]
pub struct Mirror {
    slots: BTreeMap<u8, Option<QuestProgress>>,
    buffs: Vec<BuffRecord>,
    upgrades: BTreeMap<UpgradeTrack, UpgradeLevelPair>,
    pending: Vec<PendingUpgrade>,
    active_event: Option<ActiveEvent>,
    day: u32,
    unlocked_tier: QuestTier,
    applied: HashMap<RecordKey, u64>,
}

impl Default for Mirror {
    fn default() -> Self {
        Self::new()
    }
}

impl Mirror {
    pub fn new() -> Self {
        Self {
            slots: BTreeMap::new(),
            buffs: Vec::new(),
            upgrades: BTreeMap::new(),
            pending: Vec::new(),
            active_event: None,
            day: 0,
            unlocked_tier: QuestTier::Easy,
            applied: HashMap::new(),
        }
    }

    /// Apply an envelope unless this record already holds the same or a
    /// newer sequence. Returns true when the mirror changed.
    pub fn apply(&mut self, envelope: &Envelope) -> bool {
        let key = envelope.delta.key();
        if let Some(&seen) = self.applied.get(&key) {
            if envelope.seq <= seen {
                return false;
            }
        }
        self.applied.insert(key, envelope.seq);

        match &envelope.delta {
            Delta::Slot { slot, progress } => {
                self.slots.insert(*slot, progress.clone());
            }
            Delta::Buffs(records) => self.buffs = records.clone(),
            Delta::Upgrade { track, levels } => {
                self.upgrades.insert(*track, *levels);
            }
            Delta::PendingUpgrades(pending) => self.pending = pending.clone(),
            Delta::ActiveEvent(event) => self.active_event = event.clone(),
            Delta::Day(day) => self.day = *day,
            Delta::UnlockedTier(tier) => self.unlocked_tier = *tier,
        }
        true
    }

    /// Decode and apply one frame.
    pub fn apply_frame(&mut self, frame: &[u8]) -> Result<bool, CodecError> {
        let envelope = wire::decode(frame)?;
        Ok(self.apply(&envelope))
    }

    pub fn slot(&self, slot: u8) -> Option<&QuestProgress> {
        self.slots.get(&slot).and_then(Option::as_ref)
    }

    pub fn slots(&self) -> impl Iterator<Item = (u8, Option<&QuestProgress>)> + '_ {
        self.slots.iter().map(|(s, p)| (*s, p.as_ref()))
    }

    pub fn buffs(&self) -> &[BuffRecord] {
        &self.buffs
    }

    pub fn buff_total(&self, stat: StatKind) -> f32 {
        self.buffs
            .iter()
            .filter(|b| b.is_active && b.stat == stat)
            .map(|b| b.amount)
            .sum()
    }

    pub fn upgrade(&self, track: UpgradeTrack) -> UpgradeLevelPair {
        self.upgrades.get(&track).copied().unwrap_or_default()
    }

    pub fn pending_upgrades(&self) -> &[PendingUpgrade] {
        &self.pending
    }

    pub fn active_event(&self) -> Option<&ActiveEvent> {
        self.active_event.as_ref()
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn unlocked_tier(&self) -> QuestTier {
        self.unlocked_tier
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_logic::buffs::BuffId;

    fn buffs(amount: f32) -> Delta {
        Delta::Buffs(vec![BuffRecord {
            id: BuffId(0),
            stat: StatKind::MovementSpeed,
            amount,
            remaining_days: 0,
            is_active: true,
        }])
    }

    #[test]
    fn duplicate_delta_is_idempotent() {
        let mut m = Mirror::new();
        let env = Envelope::new(3, buffs(5.0));
        assert!(m.apply(&env));
        assert!(!m.apply(&env));
        assert_eq!(m.buffs().len(), 1);
        assert!((m.buff_total(StatKind::MovementSpeed) - 5.0).abs() < f32::EPSILON);
    }

    #[test]
    fn stale_delta_dropped() {
        let mut m = Mirror::new();
        m.apply(&Envelope::new(7, Delta::Day(4)));
        assert!(!m.apply(&Envelope::new(5, Delta::Day(3))));
        assert_eq!(m.day(), 4);
    }

    #[test]
    fn records_order_independently() {
        let mut m = Mirror::new();
        m.apply(&Envelope::new(9, Delta::Day(2)));
        // Older seq on a different record still applies.
        assert!(m.apply(&Envelope::new(4, buffs(2.0))));
        assert_eq!(m.buffs().len(), 1);
    }

    #[test]
    fn unknown_upgrade_defaults_to_zero() {
        let m = Mirror::new();
        assert_eq!(m.upgrade(UpgradeTrack::Courier), UpgradeLevelPair::default());
        assert!(m.slot(0).is_none());
        assert!(m.active_event().is_none());
    }
}
