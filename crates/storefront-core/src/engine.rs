//! Progression engine - one running shop session.
//!
//! Owns the authoritative store and the collaborators it writes through:
//! the replication channel, the request gateway, the shared wallet, the
//! stat-consumer world and the seeded RNG. The day clock stays outside and
//! is only subscribed to.

use hecs::{Entity, World};
use rand::rngs::StdRng;
use rand::SeedableRng;
use storefront_logic::buffs::BuffId;
use storefront_logic::constants::is_rent_day;
use storefront_logic::effects::StatKind;
use storefront_logic::events::EventId;
use storefront_logic::quests::QuestSignal;
use storefront_logic::selection::generate_calendar;
use storefront_logic::upgrades::UpgradeTrack;

use crate::catalog::Catalog;
use crate::clock::{DayClock, DaySubscription};
use crate::config::EngineConfig;
use crate::error::Rejection;
use crate::gateway::{Inbound, Intent, ParticipantId, RequestGateway};
use crate::ledger::{CurrencyLedger, Wallet};
use crate::mirror::Mirror;
use crate::reconciler::{DailyReconciler, DayReport};
use crate::replication::{Envelope, ReplicationChannel, Transport};
use crate::stats::Stats;
use crate::store::{Applied, ApplyContext, AuthoritativeStore};

/// Everything one [`ProgressionEngine::pump`] processed.
#[derive(Debug, Default)]
pub struct PumpReport {
    pub applied: Vec<(ParticipantId, Applied)>,
    pub rejected: Vec<(ParticipantId, Rejection)>,
    /// Quest slots moved by progress signals.
    pub progressed: usize,
    /// Currency paid out by event delivery bonuses.
    pub bonus_paid: i64,
    pub days: Vec<DayReport>,
}

pub struct ProgressionEngine {
    store: AuthoritativeStore,
    channel: ReplicationChannel,
    gateway: RequestGateway,
    reconciler: DailyReconciler,
    wallet: Wallet,
    world: World,
    rng: StdRng,
    days: DaySubscription,
}

impl ProgressionEngine {
    /// Start a session on the clock's current day: build the event
    /// calendar, fill the quest slots and apply any event scheduled today.
    pub fn new(mut config: EngineConfig, catalog: Catalog, clock: &mut impl DayClock) -> Self {
        config.starting_day = clock.current_day();
        let mut rng = StdRng::seed_from_u64(config.seed);
        let calendar = generate_calendar(&catalog.event_ids(), &config.calendar_rules(), &mut rng);
        log::info!(
            "Session starting on day {} with {} scheduled events",
            config.starting_day,
            calendar.len()
        );

        let wallet = Wallet::new(config.starting_balance);
        let mut engine = Self {
            store: AuthoritativeStore::new(config, catalog, calendar),
            channel: ReplicationChannel::new(),
            gateway: RequestGateway::new(),
            reconciler: DailyReconciler::new(),
            wallet,
            world: World::new(),
            rng,
            days: clock.subscribe(),
        };
        let mut ctx = ApplyContext {
            channel: &mut engine.channel,
            ledger: &mut engine.wallet,
            world: &mut engine.world,
        };
        engine
            .reconciler
            .open_day(&mut engine.store, &mut ctx, &mut engine.rng);
        engine
    }

    /// Stop listening to the clock.
    pub fn shutdown(self, clock: &mut impl DayClock) {
        clock.unsubscribe(self.days);
    }

    // ── Participants ───────────────────────────────────────────────────

    /// Register a participant and queue a full-state snapshot for it.
    pub fn connect(&mut self, participant: ParticipantId) {
        if !self.gateway.register(participant) {
            log::debug!("Participant {} reconnected", participant.0);
        }
        self.channel.connect(participant);
        self.channel.send_snapshot(participant, self.store.full_state());
        log::info!("Participant {} joined on day {}", participant.0, self.store.day());
    }

    pub fn disconnect(&mut self, participant: ParticipantId) {
        self.gateway.unregister(participant);
        self.channel.disconnect(participant);
        log::info!("Participant {} left", participant.0);
    }

    // ── Inbound ────────────────────────────────────────────────────────

    pub fn submit(&mut self, from: ParticipantId, intent: Intent) -> u64 {
        self.gateway.submit(from, intent)
    }

    pub fn signal(&mut self, signal: QuestSignal) -> u64 {
        self.gateway.signal(signal)
    }

    /// Apply everything queued in receipt order, then reconcile once for
    /// every day boundary the clock reported since the last pump.
    pub fn pump(&mut self, clock: &impl DayClock) -> PumpReport {
        let mut report = PumpReport::default();

        for inbound in self.gateway.drain() {
            let mut ctx = ApplyContext {
                channel: &mut self.channel,
                ledger: &mut self.wallet,
                world: &mut self.world,
            };
            match inbound {
                Inbound::Request(request) => {
                    if !self.gateway.is_registered(request.from) {
                        log::warn!("Dropping request from unknown participant {}", request.from.0);
                        report
                            .rejected
                            .push((request.from, Rejection::UnknownParticipant(request.from)));
                        continue;
                    }
                    match self.store.apply(&request, &mut ctx) {
                        Ok(applied) => report.applied.push((request.from, applied)),
                        Err(reason) => report.rejected.push((request.from, reason)),
                    }
                }
                Inbound::Signal(signal) => {
                    report.progressed += self.store.record_signal(&signal, &mut ctx);
                    if signal == QuestSignal::DeliveryCompleted {
                        if let Some(bonus) = self.store.roll_delivery_bonus(&mut ctx, &mut self.rng) {
                            log::info!("Delivery bonus paid: {}", bonus);
                            report.bonus_paid += bonus;
                        }
                    }
                }
            }
        }

        let boundaries = self.days.drain() as u32;
        if boundaries > 0 {
            let today = clock.current_day();
            let first = today.saturating_sub(boundaries - 1);
            for day in first..=today {
                if let Some(day_report) = self.advance_to(day) {
                    report.days.push(day_report);
                }
            }
        }
        report
    }

    /// Run the boundary sequence for `day` directly.
    pub fn advance_to(&mut self, day: u32) -> Option<DayReport> {
        let mut ctx = ApplyContext {
            channel: &mut self.channel,
            ledger: &mut self.wallet,
            world: &mut self.world,
        };
        self.reconciler
            .reconcile(&mut self.store, day, &mut ctx, &mut self.rng)
    }

    /// Remove a buff immediately, reverting its amount.
    pub fn revoke_buff(&mut self, id: BuffId) -> Result<Applied, Rejection> {
        let mut ctx = ApplyContext {
            channel: &mut self.channel,
            ledger: &mut self.wallet,
            world: &mut self.world,
        };
        self.store.revoke_buff(id, &mut ctx)
    }

    // ── Stat consumers ─────────────────────────────────────────────────

    /// Spawn a consumer owning the given stats at their current values.
    pub fn spawn_consumer(&mut self, kinds: &[StatKind]) -> Entity {
        self.store.spawn_consumer(&mut self.world, kinds)
    }

    pub fn despawn_consumer(&mut self, entity: Entity) -> bool {
        self.world.despawn(entity).is_ok()
    }

    /// A consumer's current field value.
    pub fn consumer_stat(&self, entity: Entity, stat: StatKind) -> Option<f32> {
        self.world.get::<&Stats>(entity).ok()?.get(stat)
    }

    pub fn applied_stat(&self, stat: StatKind) -> f32 {
        self.store.applied_stat(stat)
    }

    // ── Replication ────────────────────────────────────────────────────

    pub fn on_delta(&mut self, hook: impl FnMut(&Envelope) + Send + 'static) {
        self.channel.on_delta(hook);
    }

    pub fn drain_frames(&mut self, participant: ParticipantId) -> Vec<Vec<u8>> {
        self.channel.drain(participant)
    }

    pub fn flush(&mut self, transport: &mut dyn Transport) -> usize {
        self.channel.flush(transport)
    }

    pub fn local_mirror(&self) -> &Mirror {
        self.channel.local_mirror()
    }

    // ── Queries ────────────────────────────────────────────────────────

    pub fn balance(&self) -> i64 {
        self.wallet.balance()
    }

    /// The shared wallet, for payouts outside progression (sales, rent).
    pub fn wallet_mut(&mut self) -> &mut Wallet {
        &mut self.wallet
    }

    pub fn upgrade_price(&self, track: UpgradeTrack) -> i64 {
        self.store.upgrade_price(track)
    }

    pub fn day(&self) -> u32 {
        self.store.day()
    }

    pub fn is_rent_day(&self, day: u32) -> bool {
        is_rent_day(day, self.store.config().rent_day_interval)
    }

    pub fn event_on(&self, day: u32) -> Option<EventId> {
        self.store.calendar().event_on(day)
    }

    /// The next scheduled event strictly after today.
    pub fn next_event(&self) -> Option<(u32, EventId)> {
        self.store.calendar().next_after(self.store.day())
    }

    pub fn store(&self) -> &AuthoritativeStore {
        &self.store
    }

    pub fn world(&self) -> &World {
        &self.world
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn engine(clock: &mut ManualClock) -> ProgressionEngine {
        ProgressionEngine::new(EngineConfig::default(), Catalog::builtin().unwrap(), clock)
    }

    #[test]
    fn calendar_avoids_rent_days() {
        let mut clock = ManualClock::new(1);
        let e = engine(&mut clock);
        assert!(!e.store().calendar().is_empty());
        for (day, _) in e.store().calendar().iter() {
            assert!(!e.is_rent_day(day), "event on rent day {}", day);
        }
    }

    #[test]
    fn same_seed_same_session() {
        let mut c1 = ManualClock::new(1);
        let mut c2 = ManualClock::new(1);
        let a = engine(&mut c1);
        let b = engine(&mut c2);
        let days_a: Vec<_> = a.store().calendar().iter().collect();
        let days_b: Vec<_> = b.store().calendar().iter().collect();
        assert_eq!(days_a, days_b);
        for slot in 0..a.store().slot_count() {
            assert_eq!(
                a.store().slot(slot).map(|p| p.quest_id),
                b.store().slot(slot).map(|p| p.quest_id)
            );
        }
    }

    #[test]
    fn unknown_participant_rejected() {
        let mut clock = ManualClock::new(1);
        let mut e = engine(&mut clock);
        e.submit(ParticipantId(99), Intent::AcceptQuest(0));
        let report = e.pump(&clock);
        assert_eq!(
            report.rejected,
            vec![(ParticipantId(99), Rejection::UnknownParticipant(ParticipantId(99)))]
        );
    }

    #[test]
    fn pump_reconciles_each_boundary() {
        let mut clock = ManualClock::new(1);
        let mut e = engine(&mut clock);
        clock.advance_day();
        clock.advance_day();
        let report = e.pump(&clock);
        assert_eq!(report.days.iter().map(|d| d.day).collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(e.day(), 3);
        assert_eq!(e.local_mirror().day(), 3);
    }

    #[test]
    fn shutdown_unsubscribes() {
        let mut clock = ManualClock::new(1);
        let e = engine(&mut clock);
        assert_eq!(clock.subscriber_count(), 1);
        e.shutdown(&mut clock);
        assert_eq!(clock.subscriber_count(), 0);
    }
}
