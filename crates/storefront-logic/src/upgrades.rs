//! Paid upgrades with deferred (next-day) commit.
//!
//! Purchasing raises the *visual* level immediately so the buyer gets
//! feedback, and queues a [`PendingUpgrade`]. The *authoritative* level, the
//! one effects are computed from, only moves when the daily reconciliation
//! commits entries bought strictly before the new day. This one-day lag is
//! part of the game design.

use serde::{Deserialize, Serialize};

use crate::effects::StatKind;

/// Closed set of upgrade tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UpgradeTrack {
    Sneakers,
    Seating,
    Signage,
    Courier,
}

impl UpgradeTrack {
    pub const ALL: [UpgradeTrack; 4] = [
        UpgradeTrack::Sneakers,
        UpgradeTrack::Seating,
        UpgradeTrack::Signage,
        UpgradeTrack::Courier,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Static tuning for one track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeSpec {
    pub track: UpgradeTrack,
    pub stat: StatKind,
    pub per_tier: f32,
    pub max_level: u8,
    pub base_price: i64,
    /// Price multiplier per level already bought.
    pub price_growth: f32,
}

impl UpgradeSpec {
    /// Undiscounted price of the next level when `level` is already owned.
    pub fn price_at(&self, level: u8) -> i64 {
        (self.base_price as f64 * (self.price_growth as f64).powi(level as i32)).round() as i64
    }

    /// Default tuning per track.
    pub fn default_for(track: UpgradeTrack) -> Self {
        match track {
            UpgradeTrack::Sneakers => Self {
                track,
                stat: StatKind::MovementSpeed,
                per_tier: 0.5,
                max_level: 3,
                base_price: 150,
                price_growth: 1.6,
            },
            UpgradeTrack::Seating => Self {
                track,
                stat: StatKind::CustomerWaitTime,
                per_tier: 5.0,
                max_level: 3,
                base_price: 200,
                price_growth: 1.5,
            },
            UpgradeTrack::Signage => Self {
                track,
                stat: StatKind::CustomerSpawnInterval,
                per_tier: -2.0,
                max_level: 4,
                base_price: 250,
                price_growth: 1.5,
            },
            UpgradeTrack::Courier => Self {
                track,
                stat: StatKind::DeliveryReward,
                per_tier: 3.0,
                max_level: 5,
                base_price: 300,
                price_growth: 1.4,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UpgradeLevelPair {
    /// Raised on purchase.
    pub visual: u8,
    /// Raised by the daily commit. Never above `visual`.
    pub authoritative: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingUpgrade {
    pub track: UpgradeTrack,
    pub target_level: u8,
    pub day_purchased: u32,
}

/// A level moved from pending to authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommittedUpgrade {
    pub track: UpgradeTrack,
    pub from: u8,
    pub to: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxLevelReached {
    pub track: UpgradeTrack,
    pub max_level: u8,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpgradeLedger {
    levels: [UpgradeLevelPair; 4],
    pending: Vec<PendingUpgrade>,
}

impl UpgradeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn levels(&self, track: UpgradeTrack) -> UpgradeLevelPair {
        self.levels[track.index()]
    }

    pub fn pending(&self) -> &[PendingUpgrade] {
        &self.pending
    }

    /// Check a purchase is still possible on this track.
    pub fn can_purchase(&self, spec: &UpgradeSpec) -> Result<(), MaxLevelReached> {
        if self.levels(spec.track).visual >= spec.max_level {
            Err(MaxLevelReached {
                track: spec.track,
                max_level: spec.max_level,
            })
        } else {
            Ok(())
        }
    }

    /// Raise the visual level and queue the authoritative change.
    pub fn purchase(&mut self, spec: &UpgradeSpec, day: u32) -> Result<PendingUpgrade, MaxLevelReached> {
        self.can_purchase(spec)?;
        let pair = &mut self.levels[spec.track.index()];
        pair.visual += 1;
        let entry = PendingUpgrade {
            track: spec.track,
            target_level: pair.visual,
            day_purchased: day,
        };
        self.pending.push(entry);
        Ok(entry)
    }

    /// Commit every entry bought strictly before `current_day`, one level at
    /// a time in purchase order. Same-day purchases stay pending.
    pub fn commit_due(&mut self, current_day: u32) -> Vec<CommittedUpgrade> {
        let (due, keep): (Vec<_>, Vec<_>) = self
            .pending
            .drain(..)
            .partition(|p| p.day_purchased < current_day);
        self.pending = keep;

        let mut committed = Vec::with_capacity(due.len());
        for entry in due {
            let pair = &mut self.levels[entry.track.index()];
            // Levels only move forward one step at a time.
            if entry.target_level != pair.authoritative + 1 || entry.target_level > pair.visual {
                continue;
            }
            committed.push(CommittedUpgrade {
                track: entry.track,
                from: pair.authoritative,
                to: entry.target_level,
            });
            pair.authoritative = entry.target_level;
        }
        committed
    }
}
