//! Effects composition - folding buffs, upgrade tiers and event modifiers
//! into the applied value of a base gameplay stat.
//!
//! Three source kinds combine with different rules:
//!
//! * **Buffs** are additive. They are written once into the consumer's
//!   persistent baseline rather than recomputed on every read.
//! * **Upgrade tiers** are a step function, `base + level × per_tier`.
//! * **Event modifiers** are multiplicative and applied through a
//!   [`SnapshotMap`]: the pre-event value is saved on activation and written
//!   back verbatim on deactivation.
//!
//! Buffs and tiers are folded first; the result is the pre-event baseline, so
//! reverting an event never discards buff contributions.

use std::collections::HashMap;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

/// Gameplay stats that progression can modify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StatKind {
    MovementSpeed,
    CustomerWaitTime,
    CustomerSpawnInterval,
    DeliveryReward,
    UpgradePrice,
}

impl StatKind {
    /// All stat kinds in order.
    pub const ALL: [StatKind; 5] = [
        StatKind::MovementSpeed,
        StatKind::CustomerWaitTime,
        StatKind::CustomerSpawnInterval,
        StatKind::DeliveryReward,
        StatKind::UpgradePrice,
    ];
}

/// One modifier source contributing to a stat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Modifier {
    /// Summed buff amount for the stat.
    Buff(f32),
    /// An upgrade tier contribution.
    Tier { level: u8, per_tier: f32 },
    /// An event multiplier.
    Event(f32),
}

/// Step function for upgrade tiers.
pub fn tier_value(base: f32, level: u8, per_tier: f32) -> f32 {
    base + level as f32 * per_tier
}

/// Compose the applied value of a stat from its base and all sources.
///
/// Additive sources (tiers, buffs) are folded first; event multipliers are
/// applied to the result. Source order within a kind does not matter.
pub fn compose(base: f32, sources: &[Modifier]) -> f32 {
    let mut additive = base;
    let mut multiplier = 1.0;
    for source in sources {
        match *source {
            Modifier::Buff(amount) => additive += amount,
            Modifier::Tier { level, per_tier } => additive = tier_value(additive, level, per_tier),
            Modifier::Event(factor) => multiplier *= factor,
        }
    }
    additive * multiplier
}

/// Pre-event stat values keyed by entity identity.
///
/// Each `(key, stat)` pair is captured at most once per activation, so an
/// event can never compound on itself. [`SnapshotMap::drain`] hands back the
/// saved values for an exact restore.
#[derive(Debug, Clone)]
pub struct SnapshotMap<K> {
    saved: HashMap<(K, StatKind), f32>,
}

impl<K> Default for SnapshotMap<K> {
    fn default() -> Self {
        Self {
            saved: HashMap::new(),
        }
    }
}

impl<K: Copy + Eq + Hash> SnapshotMap<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Save `current` as the pre-event value and return the modified value.
    /// A pair that is already captured keeps its original saved value.
    pub fn capture(&mut self, key: K, stat: StatKind, current: f32, factor: f32) -> f32 {
        let pre = *self.saved.entry((key, stat)).or_insert(current);
        pre * factor
    }

    /// Shift the saved baseline of a captured pair by `delta`.
    /// Returns the new pre-event value, or `None` if the pair is not captured.
    pub fn rebase(&mut self, key: K, stat: StatKind, delta: f32) -> Option<f32> {
        self.saved.get_mut(&(key, stat)).map(|pre| {
            *pre += delta;
            *pre
        })
    }

    /// Saved pre-event value of a pair, if captured.
    pub fn saved(&self, key: K, stat: StatKind) -> Option<f32> {
        self.saved.get(&(key, stat)).copied()
    }

    pub fn contains(&self, key: K, stat: StatKind) -> bool {
        self.saved.contains_key(&(key, stat))
    }

    pub fn len(&self) -> usize {
        self.saved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.saved.is_empty()
    }

    /// Remove and return every saved value.
    pub fn drain(&mut self) -> Vec<(K, StatKind, f32)> {
        self.saved
            .drain()
            .map(|((key, stat), pre)| (key, stat, pre))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_no_sources_is_base() {
        assert!((compose(4.0, &[]) - 4.0).abs() < f32::EPSILON);
    }

    #[test]
    fn buffs_are_additive() {
        let v = compose(10.0, &[Modifier::Buff(2.0), Modifier::Buff(3.0)]);
        assert!((v - 15.0).abs() < f32::EPSILON);
    }

    #[test]
    fn tiers_step() {
        assert!((tier_value(5.0, 3, 0.5) - 6.5).abs() < f32::EPSILON);
        let v = compose(
            5.0,
            &[Modifier::Tier {
                level: 2,
                per_tier: 1.0,
            }],
        );
        assert!((v - 7.0).abs() < f32::EPSILON);
    }

    #[test]
    fn event_multiplies_after_additive() {
        // Order in the slice does not change the result.
        let a = compose(10.0, &[Modifier::Event(2.0), Modifier::Buff(5.0)]);
        let b = compose(10.0, &[Modifier::Buff(5.0), Modifier::Event(2.0)]);
        assert!((a - 30.0).abs() < f32::EPSILON);
        assert!((a - b).abs() < f32::EPSILON);
    }

    #[test]
    fn capture_once_per_pair() {
        let mut snaps: SnapshotMap<u32> = SnapshotMap::new();
        let v = snaps.capture(1, StatKind::MovementSpeed, 4.0, 1.5);
        assert!((v - 6.0).abs() < f32::EPSILON);
        // Capturing again from the modified value must not compound.
        let v2 = snaps.capture(1, StatKind::MovementSpeed, v, 1.5);
        assert!((v2 - 6.0).abs() < f32::EPSILON);
        assert_eq!(snaps.saved(1, StatKind::MovementSpeed), Some(4.0));
    }

    #[test]
    fn rebase_moves_saved_value() {
        let mut snaps: SnapshotMap<u32> = SnapshotMap::new();
        snaps.capture(7, StatKind::DeliveryReward, 10.0, 2.0);
        assert_eq!(snaps.rebase(7, StatKind::DeliveryReward, 3.0), Some(13.0));
        assert_eq!(snaps.rebase(8, StatKind::DeliveryReward, 3.0), None);
    }

    #[test]
    fn drain_empties() {
        let mut snaps: SnapshotMap<u32> = SnapshotMap::new();
        snaps.capture(1, StatKind::MovementSpeed, 1.0, 2.0);
        snaps.capture(2, StatKind::MovementSpeed, 3.0, 2.0);
        let mut drained = snaps.drain();
        drained.sort_by_key(|(k, _, _)| *k);
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[1], (2, StatKind::MovementSpeed, 3.0));
        assert!(snaps.is_empty());
    }
}
