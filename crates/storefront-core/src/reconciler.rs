//! Daily reconciler - the fixed sequence run once per day boundary.
//!
//! Order matters and is always:
//! 1. penalty sweep (unfinished active quests fail, penalties apply once)
//! 2. slot reassignment
//! 3. buff decay (penalty buffs granted in step 1 are not aged yet)
//! 4. deferred upgrade commit
//! 5. event rotation
//!
//! Buffs and tiers land before the new event is applied, so the event
//! snapshot always captures values that already include them.

use rand::Rng;
use storefront_logic::events::EventId;
use storefront_logic::upgrades::CommittedUpgrade;

use crate::store::{ApplyContext, AuthoritativeStore, EventRotation};

/// Summary of one reconciliation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayReport {
    pub day: u32,
    pub failed: usize,
    pub penalty_currency: i64,
    pub assigned: usize,
    pub buffs_expired: usize,
    pub committed: Vec<CommittedUpgrade>,
    pub rotation: EventRotation,
}

impl DayReport {
    pub fn active_event(&self) -> Option<EventId> {
        self.rotation.activated
    }
}

#[derive(Debug, Clone, Default)]
pub struct DailyReconciler {
    last_day: Option<u32>,
}

impl DailyReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set up the starting day: fill the slots and apply the scheduled
    /// event, without sweeping or decaying anything.
    pub fn open_day(
        &mut self,
        store: &mut AuthoritativeStore,
        ctx: &mut ApplyContext,
        rng: &mut impl Rng,
    ) -> DayReport {
        let day = store.day();
        store.set_day(day, ctx);
        let assigned = store.reassign_slots(ctx, rng);
        let rotation = store.rotate_event(ctx);
        self.last_day = Some(day);
        log::info!("Opened day {} with {} quests", day, assigned);
        DayReport {
            day,
            assigned,
            rotation,
            ..Default::default()
        }
    }

    /// Run the boundary sequence for `new_day`. A notification for a day
    /// that was already reconciled does nothing and returns `None`.
    pub fn reconcile(
        &mut self,
        store: &mut AuthoritativeStore,
        new_day: u32,
        ctx: &mut ApplyContext,
        rng: &mut impl Rng,
    ) -> Option<DayReport> {
        if self.last_day.is_some_and(|d| new_day <= d) {
            log::debug!("Day {} already reconciled, ignoring boundary", new_day);
            return None;
        }

        let sweep = store.sweep_penalties(ctx);
        store.set_day(new_day, ctx);
        let assigned = store.reassign_slots(ctx, rng);
        let buffs_expired = store.decay_buffs(ctx, &sweep.granted);
        let committed = store.commit_upgrades(ctx);
        let rotation = store.rotate_event(ctx);
        self.last_day = Some(new_day);

        log::info!(
            "Day {}: {} failed, {} assigned, {} buffs expired, {} upgrades committed, event {:?}",
            new_day,
            sweep.failed,
            assigned,
            buffs_expired,
            committed.len(),
            rotation.activated
        );
        Some(DayReport {
            day: new_day,
            failed: sweep.failed,
            penalty_currency: sweep.currency,
            assigned,
            buffs_expired,
            committed,
            rotation,
        })
    }

    pub fn last_reconciled(&self) -> Option<u32> {
        self.last_day
    }
}
