//! Progression constants shared by the store, the harness and the tests.

/// Number of daily quest slots offered to the shop.
pub const DEFAULT_SLOT_COUNT: usize = 3;

/// Rent is collected on every day index that is a multiple of this value.
/// Random events are never scheduled on those days.
pub const DEFAULT_RENT_DAY_INTERVAL: u32 = 6;

/// Maximum rewards and penalties fixed onto a quest when it is assigned.
pub const MAX_DRAWN_OUTCOMES: usize = 2;

/// Calendar walk step range (days between consecutive event candidates).
pub const CALENDAR_STEP_MIN: u32 = 3;
pub const CALENDAR_STEP_MAX: u32 = 4;

/// Days covered by a generated event calendar.
pub const DEFAULT_CALENDAR_HORIZON: u32 = 100;

/// Collected quests needed to unlock the next quest tier.
pub const DEFAULT_QUESTS_PER_TIER_UNLOCK: u32 = 5;

/// Base tier weights in percent (Easy, Medium, Hard).
pub const DEFAULT_TIER_WEIGHTS: [u32; 3] = [60, 30, 10];

/// Returns true when `day` is a rent day for the given interval.
pub fn is_rent_day(day: u32, interval: u32) -> bool {
    interval > 0 && day % interval == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rent_days_are_multiples() {
        assert!(is_rent_day(6, 6));
        assert!(is_rent_day(12, 6));
        assert!(!is_rent_day(7, 6));
        assert!(is_rent_day(0, 6));
    }

    #[test]
    fn zero_interval_never_rent() {
        assert!(!is_rent_day(6, 0));
    }
}
