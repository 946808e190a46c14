//! Buff ledger - signed stat modifiers granted by quests and events.
//!
//! Temporary buffs of the same stat merge into a single record (amounts sum,
//! the longer remaining duration wins). Permanent buffs never merge, so each
//! grant can later be removed on its own and only its amount is reverted.

use serde::{Deserialize, Serialize};

use crate::effects::StatKind;

/// Stable identifier for a buff record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BuffId(pub u32);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuffRecord {
    pub id: BuffId,
    pub stat: StatKind,
    /// Signed amount added to the stat baseline.
    pub amount: f32,
    /// 0 = permanent, >0 = days left.
    pub remaining_days: u32,
    pub is_active: bool,
}

impl BuffRecord {
    pub fn is_permanent(&self) -> bool {
        self.remaining_days == 0
    }
}

/// Result of granting a buff.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuffGrant {
    /// Record that now carries the amount.
    pub id: BuffId,
    /// True when the grant was folded into an existing temporary record.
    pub merged: bool,
    /// Amount to add to the stat baseline.
    pub delta: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuffLedger {
    records: Vec<BuffRecord>,
    next_id: u32,
}

impl BuffLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant a buff. `days == 0` makes it permanent.
    pub fn grant(&mut self, stat: StatKind, amount: f32, days: u32) -> BuffGrant {
        if days > 0 {
            if let Some(existing) = self
                .records
                .iter_mut()
                .find(|r| r.is_active && r.stat == stat && !r.is_permanent())
            {
                existing.amount += amount;
                existing.remaining_days = existing.remaining_days.max(days);
                return BuffGrant {
                    id: existing.id,
                    merged: true,
                    delta: amount,
                };
            }
        }

        let id = BuffId(self.next_id);
        self.next_id += 1;
        self.records.push(BuffRecord {
            id,
            stat,
            amount,
            remaining_days: days,
            is_active: true,
        });
        BuffGrant {
            id,
            merged: false,
            delta: amount,
        }
    }

    /// Remove a record explicitly. The caller reverts its amount.
    pub fn remove(&mut self, id: BuffId) -> Option<BuffRecord> {
        let idx = self.records.iter().position(|r| r.id == id)?;
        let mut record = self.records.remove(idx);
        record.is_active = false;
        Some(record)
    }

    /// Advance one day: temporary records lose a day, and those reaching
    /// zero are removed and returned for reversal. Permanent records are
    /// untouched.
    pub fn decay(&mut self) -> Vec<BuffRecord> {
        self.decay_except(&[])
    }

    /// Like [`BuffLedger::decay`], but records in `fresh` were granted at
    /// this boundary and keep their full duration for the coming day.
    pub fn decay_except(&mut self, fresh: &[BuffId]) -> Vec<BuffRecord> {
        let mut expired = Vec::new();
        self.records.retain_mut(|record| {
            if record.is_permanent() || fresh.contains(&record.id) {
                return true;
            }
            record.remaining_days -= 1;
            if record.remaining_days == 0 {
                record.is_active = false;
                expired.push(record.clone());
                false
            } else {
                true
            }
        });
        expired
    }

    /// Sum of active amounts for a stat.
    pub fn total(&self, stat: StatKind) -> f32 {
        self.records
            .iter()
            .filter(|r| r.is_active && r.stat == stat)
            .map(|r| r.amount)
            .sum()
    }

    pub fn get(&self, id: BuffId) -> Option<&BuffRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn records(&self) -> &[BuffRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
