//! Stat consumers - entities owning mutable baseline fields that the
//! progression engine writes into.
//!
//! Buffs and committed upgrade tiers shift a consumer's value once
//! ([`shift_baseline`]). The active event multiplies values through the
//! snapshot map ([`apply_event`]) and is undone by writing the saved values
//! back ([`revert_event`]). Entities despawned while an event is active are
//! skipped on revert.

use std::collections::BTreeMap;

use hecs::{Entity, World};
use storefront_logic::effects::{SnapshotMap, StatKind};
use storefront_logic::events::EventModifier;

/// Named float fields owned by one consumer (a clerk's movement speed, a
/// customer's patience, the spawner's interval, ...).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stats {
    values: BTreeMap<StatKind, f32>,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, stat: StatKind, value: f32) -> Self {
        self.values.insert(stat, value);
        self
    }

    pub fn get(&self, stat: StatKind) -> Option<f32> {
        self.values.get(&stat).copied()
    }

    pub fn set(&mut self, stat: StatKind, value: f32) -> bool {
        match self.values.get_mut(&stat) {
            Some(v) => {
                *v = value;
                true
            }
            None => false,
        }
    }

    pub fn kinds(&self) -> impl Iterator<Item = StatKind> + '_ {
        self.values.keys().copied()
    }

    fn get_mut(&mut self, stat: StatKind) -> Option<&mut f32> {
        self.values.get_mut(&stat)
    }
}

/// Outcome of restoring an event snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RevertSummary {
    pub restored: usize,
    /// Snapshot entries whose entity no longer exists.
    pub skipped: usize,
}

/// Spawn a consumer whose fields start at the given persistent baselines.
/// If an event is active the new entity is onboarded into its snapshot.
pub fn spawn_consumer(
    world: &mut World,
    snapshots: &mut SnapshotMap<Entity>,
    active: Option<&EventModifier>,
    baselines: impl IntoIterator<Item = (StatKind, f32)>,
) -> Entity {
    let mut stats = Stats::new();
    for (stat, value) in baselines {
        stats = stats.with(stat, value);
    }
    let entity = world.spawn((stats,));
    if let Some(event) = active {
        onboard(world, snapshots, entity, event);
    }
    entity
}

/// Capture and modify one entity's fields for the active event.
pub fn onboard(
    world: &mut World,
    snapshots: &mut SnapshotMap<Entity>,
    entity: Entity,
    event: &EventModifier,
) -> usize {
    let Ok(mut stats) = world.get::<&mut Stats>(entity) else {
        return 0;
    };
    let mut touched = 0;
    for m in &event.multipliers {
        if let Some(v) = stats.get_mut(m.stat) {
            *v = snapshots.capture(entity, m.stat, *v, event.factor(m.stat));
            touched += 1;
        }
    }
    touched
}

/// Apply an event to every consumer. Returns the number of fields modified.
pub fn apply_event(world: &mut World, snapshots: &mut SnapshotMap<Entity>, event: &EventModifier) -> usize {
    let entities: Vec<Entity> = world.query::<&Stats>().iter().map(|(e, _)| e).collect();
    entities
        .into_iter()
        .map(|e| onboard(world, snapshots, e, event))
        .sum()
}

/// Write every saved pre-event value back.
pub fn revert_event(world: &mut World, snapshots: &mut SnapshotMap<Entity>) -> RevertSummary {
    let mut summary = RevertSummary::default();
    for (entity, stat, pre) in snapshots.drain() {
        match world.get::<&mut Stats>(entity) {
            Ok(mut stats) => {
                stats.set(stat, pre);
                summary.restored += 1;
            }
            Err(_) => {
                log::warn!("Skipping {:?} restore for despawned entity {:?}", stat, entity);
                summary.skipped += 1;
            }
        }
    }
    summary
}

/// Shift a stat's persistent baseline on every consumer by `delta`.
///
/// Fields captured by the active event have their saved value rebased and
/// are rewritten as `saved × factor`, so a later revert keeps the shift.
pub fn shift_baseline(
    world: &mut World,
    snapshots: &mut SnapshotMap<Entity>,
    stat: StatKind,
    delta: f32,
    factor: f32,
) -> usize {
    let mut touched = 0;
    for (entity, stats) in world.query_mut::<&mut Stats>() {
        let Some(v) = stats.get_mut(stat) else {
            continue;
        };
        *v = match snapshots.rebase(entity, stat, delta) {
            Some(pre) => pre * factor,
            None => *v + delta,
        };
        touched += 1;
    }
    touched
}
