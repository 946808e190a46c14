//! Content selection - weighted quest picking and event calendar placement.
//!
//! Everything here is side-effect free and deterministic for a given random
//! source, so the same seed always yields the same slots and calendar.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{
    is_rent_day, CALENDAR_STEP_MAX, CALENDAR_STEP_MIN, DEFAULT_CALENDAR_HORIZON,
    DEFAULT_RENT_DAY_INTERVAL, DEFAULT_TIER_WEIGHTS,
};
use crate::events::{EventCalendar, EventId};
use crate::quests::{Outcome, QuestDefinition, QuestTier};

/// Relative odds per tier, indexed by [`QuestTier::index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierWeights(pub [u32; 3]);

impl Default for TierWeights {
    fn default() -> Self {
        Self(DEFAULT_TIER_WEIGHTS)
    }
}

impl TierWeights {
    pub fn weight(&self, tier: QuestTier) -> u32 {
        self.0[tier.index()]
    }
}

/// Pick up to `count` distinct quests with tier ≤ `unlocked`.
///
/// Each pick rolls a tier by weight among tiers that still have candidates,
/// so the odds shift toward the remaining tiers as pools run dry. When no
/// weighted tier has candidates left, the pick falls back to any remaining
/// eligible quest. If nothing remains the result is shorter than `count`.
pub fn select_quests<'a>(
    defs: &'a [QuestDefinition],
    unlocked: QuestTier,
    count: usize,
    weights: &TierWeights,
    rng: &mut impl Rng,
) -> Vec<&'a QuestDefinition> {
    let mut pools: [Vec<&QuestDefinition>; 3] = Default::default();
    for def in defs.iter().filter(|d| d.tier <= unlocked) {
        pools[def.tier.index()].push(def);
    }

    let mut picked = Vec::with_capacity(count);
    while picked.len() < count {
        let total: u32 = QuestTier::ALL
            .iter()
            .filter(|t| !pools[t.index()].is_empty())
            .map(|t| weights.weight(*t))
            .sum();

        let tier_idx = if total > 0 {
            let mut roll = rng.gen_range(0..total);
            let mut chosen = 0;
            for tier in QuestTier::ALL {
                if pools[tier.index()].is_empty() {
                    continue;
                }
                let w = weights.weight(tier);
                if roll < w {
                    chosen = tier.index();
                    break;
                }
                roll -= w;
            }
            chosen
        } else {
            let remaining: Vec<usize> = (0..pools.len()).filter(|i| !pools[*i].is_empty()).collect();
            match remaining.choose(rng) {
                Some(&idx) => idx,
                None => break,
            }
        };

        let pool = &mut pools[tier_idx];
        let i = rng.gen_range(0..pool.len());
        picked.push(pool.swap_remove(i));
    }
    picked
}

/// Draw up to `max` outcomes from a pool without replacement.
pub fn draw_outcomes(pool: &[Outcome], max: usize, rng: &mut impl Rng) -> Vec<Outcome> {
    pool.choose_multiple(rng, max).cloned().collect()
}

/// Parameters for calendar generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarRules {
    pub rent_interval: u32,
    /// Last day (inclusive) that may receive an event.
    pub horizon: u32,
    pub step_min: u32,
    pub step_max: u32,
    /// Day the walk starts from; the first candidate is one step later.
    pub start_day: u32,
}

impl Default for CalendarRules {
    fn default() -> Self {
        Self {
            rent_interval: DEFAULT_RENT_DAY_INTERVAL,
            horizon: DEFAULT_CALENDAR_HORIZON,
            step_min: CALENDAR_STEP_MIN,
            step_max: CALENDAR_STEP_MAX,
            start_day: 0,
        }
    }
}

/// Resolve a candidate day to a free, non-rent day.
///
/// A rent-day candidate moves one day earlier or later (picking randomly
/// among the neighbours that are free), or two days later when both
/// neighbours collide. Returns `None` when the candidate cannot be placed.
pub fn place_event_day(
    candidate: u32,
    rent_interval: u32,
    calendar: &EventCalendar,
    rng: &mut impl Rng,
) -> Option<u32> {
    let collides =
        |d: u32| d == 0 || is_rent_day(d, rent_interval) || calendar.is_scheduled(d);

    if !is_rent_day(candidate, rent_interval) {
        return (!calendar.is_scheduled(candidate)).then_some(candidate);
    }

    let neighbours: Vec<u32> = [candidate.checked_sub(1), candidate.checked_add(1)]
        .into_iter()
        .flatten()
        .filter(|d| !collides(*d))
        .collect();
    if let Some(&day) = neighbours.choose(rng) {
        return Some(day);
    }

    let fallback = candidate.checked_add(2)?;
    (!collides(fallback)).then_some(fallback)
}

/// Lay out random events over the horizon, walking forward 3–4 days at a
/// time and never landing on a rent day.
pub fn generate_calendar(events: &[EventId], rules: &CalendarRules, rng: &mut impl Rng) -> EventCalendar {
    let mut calendar = EventCalendar::new();
    if events.is_empty() {
        return calendar;
    }

    let step_min = rules.step_min.max(1);
    let step_max = rules.step_max.max(step_min);
    let mut day = rules.start_day;
    loop {
        day = day.saturating_add(rng.gen_range(step_min..=step_max));
        if day > rules.horizon {
            break;
        }
        let Some(placed) = place_event_day(day, rules.rent_interval, &calendar, rng) else {
            continue;
        };
        if placed > rules.horizon {
            continue;
        }
        if let Some(&event) = events.choose(rng) {
            calendar.schedule(placed, event);
        }
    }
    calendar
}
