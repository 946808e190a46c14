//! Authoritative store - the single writer of progression state.
//!
//! Every mutation goes through here and is validated against the state at
//! the moment it is applied, not when it was requested. One intent is
//! validated and applied completely before the next one starts, which is
//! what rules out double claims and check-then-spend races between
//! participants. A successful mutation publishes the new value of every
//! record it touched; a rejected one publishes nothing.

use hecs::{Entity, World};
use rand::Rng;
use storefront_logic::buffs::{BuffId, BuffLedger};
use storefront_logic::constants::MAX_DRAWN_OUTCOMES;
use storefront_logic::effects::{compose, Modifier, SnapshotMap, StatKind};
use storefront_logic::events::{EventCalendar, EventId, EventModifier};
use storefront_logic::quests::{Outcome, QuestId, QuestProgress, QuestSignal, QuestTier, ProgressStep};
use storefront_logic::selection::{draw_outcomes, select_quests};
use storefront_logic::upgrades::{CommittedUpgrade, UpgradeLedger, UpgradeTrack};

use crate::catalog::Catalog;
use crate::config::EngineConfig;
use crate::error::Rejection;
use crate::gateway::{Intent, Request};
use crate::ledger::{apply_currency, CurrencyLedger};
use crate::replication::{ActiveEvent, Delta, ReplicationChannel};
use crate::stats::{self, RevertSummary};

/// Collaborators a mutation may touch, passed in per call.
pub struct ApplyContext<'a> {
    pub channel: &'a mut ReplicationChannel,
    pub ledger: &'a mut dyn CurrencyLedger,
    pub world: &'a mut World,
}

/// What a successful intent did.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    QuestAccepted { slot: usize, quest: QuestId },
    RewardClaimed { slot: usize, currency: i64, buffs: usize },
    UpgradePurchased { track: UpgradeTrack, target_level: u8, price: i64 },
    EventSet(Option<EventId>),
    BuffRevoked(BuffId),
}

/// Event change performed at a day boundary or by an override.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventRotation {
    pub reverted: Option<EventId>,
    pub activated: Option<EventId>,
    pub restore: RevertSummary,
}

/// Totals from applying a list of outcomes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutcomeTotals {
    pub currency: i64,
    pub buffs: usize,
    /// Records touched by buff outcomes, merged or new.
    pub granted: Vec<BuffId>,
}

/// Result of failing the unfinished slots at a boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PenaltySweep {
    pub failed: usize,
    pub currency: i64,
    /// Buff records granted as penalties; they skip this boundary's decay.
    pub granted: Vec<BuffId>,
}

pub struct AuthoritativeStore {
    config: EngineConfig,
    catalog: Catalog,
    day: u32,
    slots: Vec<Option<QuestProgress>>,
    buffs: BuffLedger,
    upgrades: UpgradeLedger,
    active_event: Option<EventId>,
    snapshots: SnapshotMap<Entity>,
    calendar: EventCalendar,
    unlocked_tier: QuestTier,
    collected_total: u32,
}

impl AuthoritativeStore {
    pub fn new(config: EngineConfig, catalog: Catalog, calendar: EventCalendar) -> Self {
        Self {
            day: config.starting_day,
            slots: vec![None; config.slot_count],
            buffs: BuffLedger::new(),
            upgrades: UpgradeLedger::new(),
            active_event: None,
            snapshots: SnapshotMap::new(),
            calendar,
            unlocked_tier: QuestTier::Easy,
            collected_total: 0,
            config,
            catalog,
        }
    }

    // ── Intents ────────────────────────────────────────────────────────

    /// Validate and apply one request as a single step.
    pub fn apply(&mut self, request: &Request, ctx: &mut ApplyContext) -> Result<Applied, Rejection> {
        let result = match &request.intent {
            Intent::AcceptQuest(slot) => self.accept_quest(*slot, ctx),
            Intent::ClaimReward(slot) => self.claim_reward(*slot, ctx),
            Intent::PurchaseUpgrade(track) => self.purchase_upgrade(*track, ctx),
            Intent::SetEventIndex(index) => self.set_event_index(*index, ctx),
        };
        match &result {
            Ok(applied) => log::info!("Participant {} applied {:?}", request.from.0, applied),
            Err(reason) => log::debug!(
                "Participant {} {:?} rejected: {}",
                request.from.0,
                request.intent,
                reason
            ),
        }
        result
    }

    fn accept_quest(&mut self, slot: usize, ctx: &mut ApplyContext) -> Result<Applied, Rejection> {
        let progress = self.slot_mut(slot)?;
        progress.accept()?;
        let quest = progress.quest_id;
        self.publish_slot(slot, ctx);
        Ok(Applied::QuestAccepted { slot, quest })
    }

    fn claim_reward(&mut self, slot: usize, ctx: &mut ApplyContext) -> Result<Applied, Rejection> {
        let rewards = self.slot_mut(slot)?.collect()?;
        let totals = self.apply_outcomes(&rewards, ctx);
        self.publish_slot(slot, ctx);

        self.collected_total += 1;
        let tier = self.tier_for_collected();
        if tier != self.unlocked_tier {
            self.unlocked_tier = tier;
            log::info!("Unlocked quest tier {:?}", tier);
            ctx.channel.publish(Delta::UnlockedTier(tier));
        }

        Ok(Applied::RewardClaimed {
            slot,
            currency: totals.currency,
            buffs: totals.buffs,
        })
    }

    fn purchase_upgrade(&mut self, track: UpgradeTrack, ctx: &mut ApplyContext) -> Result<Applied, Rejection> {
        let spec = self.config.upgrade_spec(track);
        self.upgrades.can_purchase(&spec)?;

        let price = self.upgrade_price(track);
        let balance = ctx.ledger.balance();
        if !ctx.ledger.debit(price) {
            return Err(Rejection::InsufficientFunds { price, balance });
        }

        let pending = self.upgrades.purchase(&spec, self.day)?;
        ctx.channel.publish(Delta::Upgrade {
            track,
            levels: self.upgrades.levels(track),
        });
        self.publish_pending(ctx);
        Ok(Applied::UpgradePurchased {
            track,
            target_level: pending.target_level,
            price,
        })
    }

    fn set_event_index(&mut self, index: Option<usize>, ctx: &mut ApplyContext) -> Result<Applied, Rejection> {
        let target = match index {
            Some(i) => match self.catalog.events.get(i) {
                Some(event) => Some(event.id),
                None => {
                    return Err(Rejection::EventOutOfRange {
                        index: i,
                        events: self.catalog.events.len(),
                    })
                }
            },
            None => None,
        };
        if target == self.active_event {
            return Ok(Applied::EventSet(target));
        }
        self.switch_event(target, ctx);
        Ok(Applied::EventSet(target))
    }

    /// Remove a buff explicitly and revert its amount.
    pub fn revoke_buff(&mut self, id: BuffId, ctx: &mut ApplyContext) -> Result<Applied, Rejection> {
        let record = self.buffs.remove(id).ok_or(Rejection::UnknownBuff(id.0))?;
        self.shift(record.stat, -record.amount, ctx);
        self.publish_buffs(ctx);
        Ok(Applied::BuffRevoked(id))
    }

    /// Route a progress signal to every matching active slot.
    /// Returns the number of slots that moved.
    pub fn record_signal(&mut self, signal: &QuestSignal, ctx: &mut ApplyContext) -> usize {
        let mut moved = 0;
        for slot in 0..self.slots.len() {
            let step = match self.slots[slot].as_mut() {
                Some(progress) => progress.advance(signal),
                None => ProgressStep::Ignored,
            };
            if step == ProgressStep::Ignored {
                continue;
            }
            if step == ProgressStep::Completed {
                log::info!("Quest slot {} completed", slot);
            }
            moved += 1;
            self.publish_slot(slot, ctx);
        }
        moved
    }

    /// Roll the active event's delivery bonus. Credits and returns the
    /// payout when it hits.
    pub fn roll_delivery_bonus(&self, ctx: &mut ApplyContext, rng: &mut impl Rng) -> Option<i64> {
        let event = self.active_event.and_then(|id| self.catalog.event(id))?;
        if !event.has_delivery_bonus() {
            return None;
        }
        let amount = event.delivery_bonus_amount;
        if rng.gen_bool(event.delivery_bonus_chance.clamp(0.0, 1.0) as f64) {
            ctx.ledger.credit(amount);
            Some(amount)
        } else {
            None
        }
    }

    // ── Daily reconciliation steps ─────────────────────────────────────

    pub(crate) fn set_day(&mut self, day: u32, ctx: &mut ApplyContext) {
        self.day = day;
        ctx.channel.publish(Delta::Day(day));
    }

    /// Fail unfinished active slots and apply their penalties once.
    pub(crate) fn sweep_penalties(&mut self, ctx: &mut ApplyContext) -> PenaltySweep {
        let mut sweep = PenaltySweep::default();
        for slot in 0..self.slots.len() {
            let penalties = self.slots[slot]
                .as_mut()
                .and_then(QuestProgress::fail_if_unfinished);
            let Some(penalties) = penalties else {
                continue;
            };
            let totals = self.apply_outcomes(&penalties, ctx);
            sweep.currency += totals.currency;
            sweep.granted.extend(totals.granted);
            sweep.failed += 1;
            self.publish_slot(slot, ctx);
        }
        sweep
    }

    /// Clear every slot and refill from the catalog. Returns slots filled.
    pub(crate) fn reassign_slots(&mut self, ctx: &mut ApplyContext, rng: &mut impl Rng) -> usize {
        let count = self.config.slot_count;
        let picked = select_quests(
            &self.catalog.quests,
            self.unlocked_tier,
            count,
            &self.config.tier_weights,
            rng,
        );
        let assigned: Vec<QuestProgress> = picked
            .into_iter()
            .map(|def| {
                let rewards = draw_outcomes(&def.rewards, MAX_DRAWN_OUTCOMES, rng);
                let penalties = draw_outcomes(&def.penalties, MAX_DRAWN_OUTCOMES, rng);
                QuestProgress::assign(def, rewards, penalties)
            })
            .collect();
        let filled = assigned.len();
        if filled < count {
            log::warn!("Quest pool exhausted: {} of {} slots filled", filled, count);
        }

        let mut assigned = assigned.into_iter();
        for slot in 0..count {
            self.slots[slot] = assigned.next();
            self.publish_slot(slot, ctx);
        }
        filled
    }

    /// Age temporary buffs and revert the ones that expire. Records in
    /// `fresh` were granted at this boundary and are not aged yet.
    pub(crate) fn decay_buffs(&mut self, ctx: &mut ApplyContext, fresh: &[BuffId]) -> usize {
        let had_temporary = self.buffs.records().iter().any(|b| !b.is_permanent());
        let expired = self.buffs.decay_except(fresh);
        for record in &expired {
            self.shift(record.stat, -record.amount, ctx);
        }
        if had_temporary {
            self.publish_buffs(ctx);
        }
        expired.len()
    }

    /// Commit pending upgrades bought before the current day.
    pub(crate) fn commit_upgrades(&mut self, ctx: &mut ApplyContext) -> Vec<CommittedUpgrade> {
        let pending_before = self.upgrades.pending().len();
        let committed = self.upgrades.commit_due(self.day);
        for c in &committed {
            let spec = self.config.upgrade_spec(c.track);
            let delta = (c.to - c.from) as f32 * spec.per_tier;
            self.shift(spec.stat, delta, ctx);
            ctx.channel.publish(Delta::Upgrade {
                track: c.track,
                levels: self.upgrades.levels(c.track),
            });
        }
        if self.upgrades.pending().len() != pending_before {
            self.publish_pending(ctx);
        }
        committed
    }

    /// Replace the active event with whatever the calendar has for today.
    pub(crate) fn rotate_event(&mut self, ctx: &mut ApplyContext) -> EventRotation {
        let scheduled = self.calendar.event_on(self.day);
        self.switch_event(scheduled, ctx)
    }

    // ── Effects ────────────────────────────────────────────────────────

    fn switch_event(&mut self, next: Option<EventId>, ctx: &mut ApplyContext) -> EventRotation {
        let previous = self.active_event.take();
        let mut rotation = EventRotation {
            reverted: previous,
            ..Default::default()
        };
        if previous.is_some() {
            rotation.restore = stats::revert_event(ctx.world, &mut self.snapshots);
        }

        if let Some(id) = next {
            match self.catalog.event(id) {
                Some(event) => {
                    stats::apply_event(ctx.world, &mut self.snapshots, event);
                    self.active_event = Some(id);
                    rotation.activated = Some(id);
                    log::info!("Event {} active on day {}", event.name, self.day);
                }
                None => log::warn!("Scheduled event {:?} missing from catalog", id),
            }
        }

        if previous != self.active_event {
            let summary = self.active_event_summary();
            ctx.channel.publish(Delta::ActiveEvent(summary));
        }
        rotation
    }

    fn apply_outcomes(&mut self, outcomes: &[Outcome], ctx: &mut ApplyContext) -> OutcomeTotals {
        let mut totals = OutcomeTotals::default();
        for outcome in outcomes {
            match *outcome {
                Outcome::Currency(amount) => {
                    totals.currency += apply_currency(ctx.ledger, amount);
                }
                Outcome::Buff { stat, amount, days } => {
                    let grant = self.buffs.grant(stat, amount, days);
                    self.shift(stat, grant.delta, ctx);
                    totals.buffs += 1;
                    totals.granted.push(grant.id);
                }
            }
        }
        if totals.buffs > 0 {
            self.publish_buffs(ctx);
        }
        totals
    }

    /// Move a stat's persistent baseline on every consumer.
    fn shift(&mut self, stat: StatKind, delta: f32, ctx: &mut ApplyContext) {
        let factor = self.active_modifier().map_or(1.0, |e| e.factor(stat));
        stats::shift_baseline(ctx.world, &mut self.snapshots, stat, delta, factor);
    }

    // ── Queries ────────────────────────────────────────────────────────

    /// Price of the next level on a track, after buffs and the active event.
    pub fn upgrade_price(&self, track: UpgradeTrack) -> i64 {
        let spec = self.config.upgrade_spec(track);
        let raw = spec.price_at(self.upgrades.levels(track).visual) as f32;
        let price = compose(
            raw,
            &[
                Modifier::Buff(self.buffs.total(StatKind::UpgradePrice)),
                Modifier::Event(self.event_factor(StatKind::UpgradePrice)),
            ],
        );
        price.max(0.0).round() as i64
    }

    /// Base value with committed tiers and buffs folded in.
    pub fn persistent_baseline(&self, stat: StatKind) -> f32 {
        compose(self.catalog.base(stat), &self.persistent_sources(stat))
    }

    /// Value an external consumer should use right now.
    pub fn applied_stat(&self, stat: StatKind) -> f32 {
        let mut sources = self.persistent_sources(stat);
        sources.push(Modifier::Event(self.event_factor(stat)));
        compose(self.catalog.base(stat), &sources)
    }

    fn persistent_sources(&self, stat: StatKind) -> Vec<Modifier> {
        let mut sources: Vec<Modifier> = UpgradeTrack::ALL
            .iter()
            .map(|t| self.config.upgrade_spec(*t))
            .filter(|spec| spec.stat == stat)
            .map(|spec| Modifier::Tier {
                level: self.upgrades.levels(spec.track).authoritative,
                per_tier: spec.per_tier,
            })
            .collect();
        sources.push(Modifier::Buff(self.buffs.total(stat)));
        sources
    }

    fn event_factor(&self, stat: StatKind) -> f32 {
        self.active_modifier().map_or(1.0, |e| e.factor(stat))
    }

    /// Spawn a stat consumer reflecting current buffs, tiers and event.
    pub fn spawn_consumer(&mut self, world: &mut World, kinds: &[StatKind]) -> Entity {
        let baselines: Vec<(StatKind, f32)> = kinds
            .iter()
            .map(|k| (*k, self.persistent_baseline(*k)))
            .collect();
        let active = self.active_event.and_then(|id| self.catalog.event(id));
        stats::spawn_consumer(world, &mut self.snapshots, active, baselines)
    }

    /// One delta per record, for bringing a new observer up to date.
    pub fn full_state(&self) -> Vec<Delta> {
        let mut deltas = vec![Delta::Day(self.day), Delta::UnlockedTier(self.unlocked_tier)];
        for (slot, progress) in self.slots.iter().enumerate() {
            deltas.push(Delta::Slot {
                slot: slot as u8,
                progress: progress.clone(),
            });
        }
        deltas.push(Delta::Buffs(self.buffs.records().to_vec()));
        for track in UpgradeTrack::ALL {
            deltas.push(Delta::Upgrade {
                track,
                levels: self.upgrades.levels(track),
            });
        }
        deltas.push(Delta::PendingUpgrades(self.upgrades.pending().to_vec()));
        deltas.push(Delta::ActiveEvent(self.active_event_summary()));
        deltas
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn slot(&self, slot: usize) -> Option<&QuestProgress> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn buffs(&self) -> &BuffLedger {
        &self.buffs
    }

    pub fn upgrades(&self) -> &UpgradeLedger {
        &self.upgrades
    }

    pub fn active_event(&self) -> Option<EventId> {
        self.active_event
    }

    pub fn active_modifier(&self) -> Option<&EventModifier> {
        self.active_event.and_then(|id| self.catalog.event(id))
    }

    pub fn calendar(&self) -> &EventCalendar {
        &self.calendar
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn unlocked_tier(&self) -> QuestTier {
        self.unlocked_tier
    }

    pub fn collected_total(&self) -> u32 {
        self.collected_total
    }

    pub fn snapshot_len(&self) -> usize {
        self.snapshots.len()
    }

    // ── Internals ──────────────────────────────────────────────────────

    fn slot_mut(&mut self, slot: usize) -> Result<&mut QuestProgress, Rejection> {
        let slots = self.slots.len();
        self.slots
            .get_mut(slot)
            .ok_or(Rejection::SlotOutOfRange { slot, slots })?
            .as_mut()
            .ok_or(Rejection::SlotUnassigned(slot))
    }

    fn tier_for_collected(&self) -> QuestTier {
        let per_unlock = self.config.quests_per_tier_unlock;
        if per_unlock == 0 {
            return self.unlocked_tier;
        }
        let steps = self.collected_total / per_unlock;
        let mut tier = QuestTier::Easy;
        for _ in 0..steps.min(2) {
            tier = tier.next();
        }
        tier.max(self.unlocked_tier)
    }

    fn active_event_summary(&self) -> Option<ActiveEvent> {
        self.active_modifier().map(|e| ActiveEvent {
            id: e.id,
            name: e.name.clone(),
        })
    }

    fn publish_slot(&self, slot: usize, ctx: &mut ApplyContext) {
        ctx.channel.publish(Delta::Slot {
            slot: slot as u8,
            progress: self.slots[slot].clone(),
        });
    }

    fn publish_buffs(&self, ctx: &mut ApplyContext) {
        ctx.channel.publish(Delta::Buffs(self.buffs.records().to_vec()));
    }

    fn publish_pending(&self, ctx: &mut ApplyContext) {
        ctx.channel
            .publish(Delta::PendingUpgrades(self.upgrades.pending().to_vec()));
    }

    #[cfg(test)]
    pub(crate) fn force_slot(&mut self, slot: usize, progress: Option<QuestProgress>) {
        self.slots[slot] = progress;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::ParticipantId;
    use crate::ledger::Wallet;
    use crate::stats::Stats;
    use storefront_logic::quests::{QuestDefinition, QuestRequirement, QuestStatus, QuestType};

    struct Fixture {
        store: AuthoritativeStore,
        channel: ReplicationChannel,
        wallet: Wallet,
        world: World,
    }

    impl Fixture {
        fn new() -> Self {
            let catalog = Catalog::builtin().unwrap();
            Self {
                store: AuthoritativeStore::new(EngineConfig::default(), catalog, EventCalendar::new()),
                channel: ReplicationChannel::new(),
                wallet: Wallet::new(1_000),
                world: World::new(),
            }
        }

        fn apply(&mut self, intent: Intent) -> Result<Applied, Rejection> {
            let request = Request {
                from: ParticipantId(1),
                intent,
            };
            let mut ctx = ApplyContext {
                channel: &mut self.channel,
                ledger: &mut self.wallet,
                world: &mut self.world,
            };
            self.store.apply(&request, &mut ctx)
        }

        fn signal(&mut self, signal: QuestSignal) -> usize {
            let mut ctx = ApplyContext {
                channel: &mut self.channel,
                ledger: &mut self.wallet,
                world: &mut self.world,
            };
            self.store.record_signal(&signal, &mut ctx)
        }
    }

    fn serve_quest(target: u32, rewards: Vec<Outcome>) -> QuestProgress {
        let def = QuestDefinition {
            id: QuestId(77),
            name: "Serve".into(),
            tier: QuestTier::Easy,
            quest_type: QuestType::ServeCustomer,
            requirement: QuestRequirement {
                target,
                subtype: None,
            },
            rewards: rewards.clone(),
            penalties: vec![Outcome::Currency(-25)],
        };
        QuestProgress::assign(&def, rewards, def.penalties.clone())
    }

    #[test]
    fn accept_requires_available() {
        let mut f = Fixture::new();
        f.store.force_slot(0, Some(serve_quest(2, vec![])));
        assert!(matches!(
            f.apply(Intent::AcceptQuest(0)),
            Ok(Applied::QuestAccepted { slot: 0, .. })
        ));
        let seq = f.channel.last_seq();
        assert!(matches!(
            f.apply(Intent::AcceptQuest(0)),
            Err(Rejection::WrongStatus { .. })
        ));
        // Rejections publish nothing.
        assert_eq!(f.channel.last_seq(), seq);
    }

    #[test]
    fn out_of_range_and_empty_slots_rejected() {
        let mut f = Fixture::new();
        assert_eq!(
            f.apply(Intent::AcceptQuest(9)),
            Err(Rejection::SlotOutOfRange { slot: 9, slots: 3 })
        );
        assert_eq!(f.apply(Intent::ClaimReward(1)), Err(Rejection::SlotUnassigned(1)));
    }

    #[test]
    fn claim_pays_once() {
        let mut f = Fixture::new();
        f.store
            .force_slot(0, Some(serve_quest(1, vec![Outcome::Currency(80)])));
        f.apply(Intent::AcceptQuest(0)).unwrap();
        assert_eq!(f.signal(QuestSignal::CustomerServed), 1);
        assert_eq!(f.store.slot(0).unwrap().status, QuestStatus::Completed);

        assert!(f.apply(Intent::ClaimReward(0)).is_ok());
        assert!(f.apply(Intent::ClaimReward(0)).is_err());
        assert_eq!(f.wallet.balance(), 1_080);
        assert_eq!(f.store.collected_total(), 1);
    }

    #[test]
    fn purchase_checks_funds_at_apply_time() {
        let mut f = Fixture::new();
        f.wallet = Wallet::new(100);
        let price = f.store.upgrade_price(UpgradeTrack::Sneakers);
        assert_eq!(
            f.apply(Intent::PurchaseUpgrade(UpgradeTrack::Sneakers)),
            Err(Rejection::InsufficientFunds { price, balance: 100 })
        );
        assert_eq!(f.wallet.balance(), 100);
        assert_eq!(f.store.upgrades().levels(UpgradeTrack::Sneakers).visual, 0);
    }

    #[test]
    fn purchase_debits_and_defers() {
        let mut f = Fixture::new();
        let price = f.store.upgrade_price(UpgradeTrack::Courier);
        let applied = f.apply(Intent::PurchaseUpgrade(UpgradeTrack::Courier)).unwrap();
        assert_eq!(
            applied,
            Applied::UpgradePurchased {
                track: UpgradeTrack::Courier,
                target_level: 1,
                price
            }
        );
        assert_eq!(f.wallet.balance(), 1_000 - price);
        let levels = f.store.upgrades().levels(UpgradeTrack::Courier);
        assert_eq!((levels.visual, levels.authoritative), (1, 0));
        assert_eq!(f.channel.local_mirror().upgrade(UpgradeTrack::Courier), levels);
        assert_eq!(f.channel.local_mirror().pending_upgrades().len(), 1);
        // Next level costs more.
        assert!(f.store.upgrade_price(UpgradeTrack::Courier) > price);
    }

    #[test]
    fn set_event_index_validates() {
        let mut f = Fixture::new();
        let events = f.store.catalog().events.len();
        assert_eq!(
            f.apply(Intent::SetEventIndex(Some(events))),
            Err(Rejection::EventOutOfRange {
                index: events,
                events
            })
        );
        assert!(f.apply(Intent::SetEventIndex(Some(0))).is_ok());
        assert_eq!(f.store.active_event(), Some(f.store.catalog().events[0].id));
        assert!(f.channel.local_mirror().active_event().is_some());
        assert_eq!(f.apply(Intent::SetEventIndex(None)), Ok(Applied::EventSet(None)));
        assert!(f.channel.local_mirror().active_event().is_none());
    }

    #[test]
    fn reselecting_active_event_publishes_nothing() {
        let mut f = Fixture::new();
        let clerk = f.store.spawn_consumer(&mut f.world, &[StatKind::MovementSpeed]);
        f.apply(Intent::SetEventIndex(Some(0))).unwrap();
        let seq = f.channel.last_seq();
        let during = f.world.get::<&Stats>(clerk).unwrap().get(StatKind::MovementSpeed);

        let id = f.store.catalog().events[0].id;
        assert_eq!(f.apply(Intent::SetEventIndex(Some(0))), Ok(Applied::EventSet(Some(id))));
        assert_eq!(f.channel.last_seq(), seq);
        assert_eq!(f.store.active_event(), Some(id));
        assert_eq!(f.world.get::<&Stats>(clerk).unwrap().get(StatKind::MovementSpeed), during);

        assert!(f.apply(Intent::SetEventIndex(None)).is_ok());
        let seq = f.channel.last_seq();
        assert!(f.apply(Intent::SetEventIndex(None)).is_ok());
        assert_eq!(f.channel.last_seq(), seq);
    }

    #[test]
    fn quiet_rotation_publishes_nothing() {
        let mut f = Fixture::new();
        let seq = f.channel.last_seq();
        let mut ctx = ApplyContext {
            channel: &mut f.channel,
            ledger: &mut f.wallet,
            world: &mut f.world,
        };
        let rotation = f.store.rotate_event(&mut ctx);
        assert_eq!(rotation.activated, None);
        assert_eq!(f.channel.last_seq(), seq);
    }

    #[test]
    fn event_price_discount() {
        let mut f = Fixture::new();
        let full = f.store.upgrade_price(UpgradeTrack::Seating);
        let sale = f
            .store
            .catalog()
            .events
            .iter()
            .position(|e| e.affects(StatKind::UpgradePrice))
            .unwrap();
        f.apply(Intent::SetEventIndex(Some(sale))).unwrap();
        assert!(f.store.upgrade_price(UpgradeTrack::Seating) < full);
    }

    #[test]
    fn tier_unlocks_after_collections() {
        let mut f = Fixture::new();
        for _ in 0..5 {
            f.store.force_slot(0, Some(serve_quest(1, vec![])));
            f.apply(Intent::AcceptQuest(0)).unwrap();
            f.signal(QuestSignal::CustomerServed);
            f.apply(Intent::ClaimReward(0)).unwrap();
        }
        assert_eq!(f.store.unlocked_tier(), QuestTier::Medium);
        assert_eq!(f.channel.local_mirror().unlocked_tier(), QuestTier::Medium);
    }

    #[test]
    fn full_state_covers_every_record() {
        let f = Fixture::new();
        let deltas = f.store.full_state();
        // day, tier, 3 slots, buffs, 4 tracks, pending, event
        assert_eq!(deltas.len(), 2 + 3 + 1 + 4 + 1 + 1);
    }
}
