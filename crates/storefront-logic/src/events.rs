//! Day-scoped event modifiers and the calendar that schedules them.
//!
//! An event lasts exactly one day. At most one is active; the calendar maps
//! day indices to catalog event ids and is generated once per session by
//! [`crate::selection::generate_calendar`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::effects::StatKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u16);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatMultiplier {
    pub stat: StatKind,
    pub factor: f32,
}

/// Content for one event day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventModifier {
    pub id: EventId,
    pub name: String,
    #[serde(default)]
    pub multipliers: Vec<StatMultiplier>,
    /// Chance (0.0–1.0) that a completed delivery pays a bonus.
    #[serde(default)]
    pub delivery_bonus_chance: f32,
    #[serde(default)]
    pub delivery_bonus_amount: i64,
}

impl EventModifier {
    /// Multiplier this event applies to a stat, 1.0 when untouched.
    pub fn factor(&self, stat: StatKind) -> f32 {
        self.multipliers
            .iter()
            .filter(|m| m.stat == stat)
            .map(|m| m.factor)
            .product()
    }

    pub fn affects(&self, stat: StatKind) -> bool {
        self.multipliers.iter().any(|m| m.stat == stat)
    }

    pub fn has_delivery_bonus(&self) -> bool {
        self.delivery_bonus_chance > 0.0 && self.delivery_bonus_amount > 0
    }
}

/// Day → event schedule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventCalendar {
    days: BTreeMap<u32, EventId>,
}

impl EventCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule an event. Returns false if the day is already taken.
    pub fn schedule(&mut self, day: u32, event: EventId) -> bool {
        if self.days.contains_key(&day) {
            return false;
        }
        self.days.insert(day, event);
        true
    }

    pub fn event_on(&self, day: u32) -> Option<EventId> {
        self.days.get(&day).copied()
    }

    pub fn is_scheduled(&self, day: u32) -> bool {
        self.days.contains_key(&day)
    }

    /// First scheduled day strictly after `day`.
    pub fn next_after(&self, day: u32) -> Option<(u32, EventId)> {
        self.days
            .range(day.saturating_add(1)..)
            .next()
            .map(|(d, e)| (*d, *e))
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, EventId)> + '_ {
        self.days.iter().map(|(d, e)| (*d, *e))
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}
