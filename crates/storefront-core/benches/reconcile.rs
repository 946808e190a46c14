use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use storefront_core::prelude::*;

const CONSUMER_KINDS: [StatKind; 4] = [
    StatKind::MovementSpeed,
    StatKind::CustomerWaitTime,
    StatKind::CustomerSpawnInterval,
    StatKind::DeliveryReward,
];

fn session(consumers: usize) -> (ProgressionEngine, ManualClock) {
    let mut clock = ManualClock::new(1);
    let mut engine = ProgressionEngine::new(
        EngineConfig::default(),
        Catalog::builtin().expect("bundled catalog"),
        &mut clock,
    );
    for _ in 0..consumers {
        engine.spawn_consumer(&CONSUMER_KINDS);
    }
    let host = ParticipantId(1);
    engine.connect(host);
    engine.submit(host, Intent::AcceptQuest(0));
    engine.submit(host, Intent::PurchaseUpgrade(UpgradeTrack::Signage));
    engine.submit(host, Intent::SetEventIndex(Some(0)));
    engine.pump(&clock);
    (engine, clock)
}

fn bench_day_boundary(c: &mut Criterion) {
    let mut group = c.benchmark_group("day_boundary");
    for consumers in [10, 100, 1_000] {
        group.bench_function(format!("{consumers}_consumers"), |b| {
            b.iter_batched(
                || session(consumers),
                |(mut engine, mut clock)| {
                    clock.advance_day();
                    black_box(engine.pump(&clock))
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_event_toggle(c: &mut Criterion) {
    let (mut engine, clock) = session(500);
    let host = ParticipantId(1);
    c.bench_function("event_toggle_500", |b| {
        b.iter(|| {
            engine.submit(host, Intent::SetEventIndex(None));
            engine.submit(host, Intent::SetEventIndex(Some(1)));
            black_box(engine.pump(&clock))
        })
    });
}

criterion_group!(benches, bench_day_boundary, bench_event_toggle);
criterion_main!(benches);
