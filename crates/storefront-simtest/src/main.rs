//! Storefront Headless Session Harness
//!
//! Drives a full progression session in-process: one authority, several
//! remote mirrors fed from encoded frames, and a manual day clock.
//! No transport, no rendering.
//!
//! Usage:
//!   cargo run -p storefront-simtest
//!   cargo run -p storefront-simtest -- --verbose
//!   cargo run -p storefront-simtest -- --json
//!   RUST_LOG=debug cargo run -p storefront-simtest

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use storefront_core::prelude::*;
use storefront_logic::constants::is_rent_day;
use storefront_logic::quests::QuestTier;
use storefront_logic::selection::generate_calendar;
use tracing_subscriber::EnvFilter;

// ── Logging ─────────────────────────────────────────────────────────────

/// `RUST_LOG` wins; otherwise `--verbose` shows the engine's info lines.
/// The engine logs through `log`, which the fmt subscriber bridges.
fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn check(name: &str, passed: bool, detail: String) -> TestResult {
    TestResult {
        name: name.into(),
        passed,
        detail,
    }
}

#[derive(Debug, Default, Serialize)]
struct SoakSummary {
    days: u32,
    requests: usize,
    applied: usize,
    rejected: usize,
    signals: usize,
    quests_failed: usize,
    upgrades_committed: usize,
    events_activated: usize,
    final_balance: i64,
    unlocked_tier: String,
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    let json = std::env::args().any(|a| a == "--json");
    init_logging(verbose);
    println!("=== Storefront Session Harness ===\n");

    let mut results = Vec::new();

    // 1. Bundled catalog
    results.extend(validate_catalog(verbose));

    // 2. Configuration defaults
    results.extend(validate_config(verbose));

    // 3. Event calendar sweep
    results.extend(validate_calendar(verbose));

    // 4. Quest lifecycle through the gateway
    results.extend(validate_quest_lifecycle(verbose));

    // 5. Deferred upgrades
    results.extend(validate_deferred_upgrades(verbose));

    // 6. Multi-day soak with remote mirrors
    let (soak_results, summary) = run_soak(verbose);
    results.extend(soak_results);

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    if json {
        match serde_json::to_string_pretty(&summary) {
            Ok(s) => println!("\n{}", s),
            Err(e) => println!("\nsummary encode failed: {}", e),
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Catalog ──────────────────────────────────────────────────────────

fn validate_catalog(verbose: bool) -> Vec<TestResult> {
    println!("--- Catalog ---");
    let catalog = match Catalog::builtin() {
        Ok(c) => c,
        Err(e) => return vec![check("catalog_parse", false, format!("{}", e))],
    };

    let mut results = Vec::new();
    for tier in QuestTier::ALL {
        let count = catalog.quests.iter().filter(|q| q.tier == tier).count();
        results.push(check(
            &format!("catalog_tier_{:?}", tier),
            count > 0,
            format!("{} quests", count),
        ));
    }
    let easy = catalog.quests.iter().filter(|q| q.tier == QuestTier::Easy).count();
    results.push(check(
        "catalog_fills_slots_day_one",
        easy >= EngineConfig::default().slot_count,
        format!("{} easy quests", easy),
    ));
    results.push(check(
        "catalog_has_events",
        !catalog.events.is_empty(),
        format!("{} events", catalog.events.len()),
    ));
    let bonus = catalog.events.iter().filter(|e| e.has_delivery_bonus()).count();
    results.push(check(
        "catalog_delivery_bonus_event",
        bonus > 0,
        format!("{} events with delivery bonus", bonus),
    ));

    if verbose {
        println!("  {} quests, {} events", catalog.quests.len(), catalog.events.len());
    }
    results
}

// ── 2. Config ───────────────────────────────────────────────────────────

fn validate_config(_verbose: bool) -> Vec<TestResult> {
    println!("--- Config ---");
    let defaults = EngineConfig::default();
    let mut results = Vec::new();

    let round_trip = serde_json::to_string(&defaults)
        .ok()
        .and_then(|s| EngineConfig::from_json(&s).ok());
    results.push(check(
        "config_json_round_trip",
        round_trip.as_ref() == Some(&defaults),
        "defaults survive JSON".into(),
    ));

    let empty = EngineConfig::from_json("{}");
    results.push(check(
        "config_empty_document",
        empty.as_ref().ok() == Some(&defaults),
        "empty JSON gives defaults".into(),
    ));
    results
}

// ── 3. Calendar ─────────────────────────────────────────────────────────

fn validate_calendar(verbose: bool) -> Vec<TestResult> {
    println!("--- Event Calendar ---");
    let catalog = match Catalog::builtin() {
        Ok(c) => c,
        Err(e) => return vec![check("calendar_catalog", false, format!("{}", e))],
    };
    let config = EngineConfig::default();
    let rules = config.calendar_rules();

    let mut rent_hits = 0;
    let mut total_events = 0;
    let mut max_gap = 0;
    for seed in 0..50u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let calendar = generate_calendar(&catalog.event_ids(), &rules, &mut rng);
        total_events += calendar.len();
        let mut prev = rules.start_day;
        for (day, _) in calendar.iter() {
            if is_rent_day(day, rules.rent_interval) {
                rent_hits += 1;
            }
            max_gap = max_gap.max(day - prev);
            prev = day;
        }
    }

    if verbose {
        println!("  {} events over 50 calendars, max gap {} days", total_events, max_gap);
    }
    vec![
        check(
            "calendar_no_rent_days",
            rent_hits == 0,
            format!("{} events on rent days", rent_hits),
        ),
        check(
            "calendar_density",
            total_events >= 50 * 20,
            format!("{} events across 50 calendars", total_events),
        ),
        check(
            "calendar_gap_bound",
            max_gap <= rules.step_max + 2,
            format!("max gap {}", max_gap),
        ),
    ]
}

// ── 4. Quest lifecycle ──────────────────────────────────────────────────

fn validate_quest_lifecycle(verbose: bool) -> Vec<TestResult> {
    println!("--- Quest Lifecycle ---");
    let mut clock = ManualClock::new(1);
    let catalog = match Catalog::builtin() {
        Ok(c) => c,
        Err(e) => return vec![check("lifecycle_catalog", false, format!("{}", e))],
    };
    let mut engine = ProgressionEngine::new(EngineConfig::default(), catalog, &mut clock);
    let host = ParticipantId(1);
    let guest = ParticipantId(2);
    engine.connect(host);
    engine.connect(guest);

    let mut results = Vec::new();
    let Some(progress) = engine.store().slot(0).cloned() else {
        return vec![check("lifecycle_slot_assigned", false, "slot 0 empty".into())];
    };

    engine.submit(host, Intent::AcceptQuest(0));
    engine.submit(guest, Intent::AcceptQuest(0));
    let report = engine.pump(&clock);
    results.push(check(
        "lifecycle_accept_once",
        report.applied.len() == 1 && report.rejected.len() == 1,
        format!("{} applied, {} rejected", report.applied.len(), report.rejected.len()),
    ));

    let signal = signal_for(&progress);
    for _ in 0..progress.target() {
        engine.signal(signal.clone());
    }
    engine.pump(&clock);
    let status = engine.store().slot(0).map(|p| p.status);
    results.push(check(
        "lifecycle_completes",
        status == Some(QuestStatus::Completed),
        format!("status {:?} after {} signals", status, progress.target()),
    ));

    let before = engine.balance();
    engine.submit(host, Intent::ClaimReward(0));
    engine.submit(guest, Intent::ClaimReward(0));
    let report = engine.pump(&clock);
    results.push(check(
        "lifecycle_single_claim",
        report.applied.len() == 1 && report.rejected.len() == 1,
        format!("balance {} -> {}", before, engine.balance()),
    ));

    if verbose {
        println!("  quest {:?} target {}", progress.quest_id, progress.target());
    }
    results
}

fn signal_for(progress: &storefront_logic::quests::QuestProgress) -> QuestSignal {
    use storefront_logic::quests::QuestType;
    let subtype = progress.requirement.subtype.clone().unwrap_or_default();
    match progress.quest_type {
        QuestType::CompleteMinigame => QuestSignal::MinigameCompleted,
        QuestType::PlaceOnShelf => QuestSignal::ItemShelved { subtype },
        QuestType::CompleteDelivery => QuestSignal::DeliveryCompleted,
        QuestType::ServeCustomer => QuestSignal::CustomerServed,
        QuestType::IgnoreCustomer => QuestSignal::CustomerIgnored,
        QuestType::PackItem => QuestSignal::ItemPacked { subtype },
    }
}

// ── 5. Deferred upgrades ────────────────────────────────────────────────

fn validate_deferred_upgrades(_verbose: bool) -> Vec<TestResult> {
    println!("--- Deferred Upgrades ---");
    let mut clock = ManualClock::new(5);
    let catalog = match Catalog::builtin() {
        Ok(c) => c,
        Err(e) => return vec![check("upgrade_catalog", false, format!("{}", e))],
    };
    let mut engine = ProgressionEngine::new(EngineConfig::default(), catalog, &mut clock);
    let host = ParticipantId(1);
    engine.connect(host);
    let clerk = engine.spawn_consumer(&[StatKind::MovementSpeed]);
    let speed_before = engine.consumer_stat(clerk, StatKind::MovementSpeed);

    engine.submit(host, Intent::PurchaseUpgrade(UpgradeTrack::Sneakers));
    engine.pump(&clock);
    let same_day = engine.local_mirror().upgrade(UpgradeTrack::Sneakers);

    clock.advance_day();
    engine.pump(&clock);
    let next_day = engine.local_mirror().upgrade(UpgradeTrack::Sneakers);
    let speed_after = engine.consumer_stat(clerk, StatKind::MovementSpeed);

    vec![
        check(
            "upgrade_visual_leads",
            same_day.visual == 1 && same_day.authoritative == 0,
            format!("day 5: {:?}", same_day),
        ),
        check(
            "upgrade_commits_next_day",
            next_day.authoritative == 1,
            format!("day 6: {:?}", next_day),
        ),
        check(
            "upgrade_moves_consumer",
            speed_after > speed_before,
            format!("{:?} -> {:?}", speed_before, speed_after),
        ),
    ]
}

// ── 6. Soak ─────────────────────────────────────────────────────────────

fn run_soak(verbose: bool) -> (Vec<TestResult>, SoakSummary) {
    println!("--- Multi-day Soak ---");
    const DAYS: u32 = 30;
    let mut summary = SoakSummary::default();
    let catalog = match Catalog::builtin() {
        Ok(c) => c,
        Err(e) => return (vec![check("soak_catalog", false, format!("{}", e))], summary),
    };

    let mut clock = ManualClock::new(1);
    let mut engine = ProgressionEngine::new(EngineConfig::default(), catalog, &mut clock);
    let participants = [ParticipantId(1), ParticipantId(2), ParticipantId(3)];
    for p in participants {
        engine.connect(p);
    }
    let mut mirrors: Vec<Mirror> = participants.iter().map(|_| Mirror::new()).collect();
    let consumers: Vec<_> = (0..20)
        .map(|_| engine.spawn_consumer(&StatKind::ALL))
        .collect();

    let mut rng = StdRng::seed_from_u64(7);
    let mut negative_balance = false;
    let mut decode_errors = 0;

    for _ in 0..DAYS {
        for _ in 0..rng.gen_range(5..15) {
            let who = participants[rng.gen_range(0..participants.len())];
            let slot = rng.gen_range(0..engine.store().slot_count());
            let intent = match rng.gen_range(0..10) {
                0..=3 => Intent::AcceptQuest(slot),
                4..=6 => Intent::ClaimReward(slot),
                7..=8 => Intent::PurchaseUpgrade(UpgradeTrack::ALL[rng.gen_range(0..4)]),
                _ => Intent::SetEventIndex(None),
            };
            engine.submit(who, intent);
            summary.requests += 1;

            let signal = engine.store().slot(slot).map(signal_for);
            if let Some(signal) = signal {
                engine.signal(signal);
                summary.signals += 1;
            }
        }

        let report = engine.pump(&clock);
        summary.applied += report.applied.len();
        summary.rejected += report.rejected.len();
        negative_balance |= engine.balance() < 0;

        clock.advance_day();
        let report = engine.pump(&clock);
        for day in &report.days {
            summary.quests_failed += day.failed;
            summary.upgrades_committed += day.committed.len();
            summary.events_activated += usize::from(day.rotation.activated.is_some());
        }
        summary.days += report.days.len() as u32;
        tracing::debug!(day = engine.day(), balance = engine.balance(), "soak day reconciled");

        for (p, mirror) in participants.iter().zip(mirrors.iter_mut()) {
            for frame in engine.drain_frames(*p) {
                if let Err(e) = mirror.apply_frame(&frame) {
                    tracing::warn!(participant = p.0, "frame rejected: {}", e);
                    decode_errors += 1;
                }
            }
        }
    }

    summary.final_balance = engine.balance();
    summary.unlocked_tier = format!("{:?}", engine.store().unlocked_tier());

    let local = engine.local_mirror();
    let converged = mirrors.iter().all(|m| {
        m.day() == local.day()
            && m.buffs() == local.buffs()
            && m.active_event() == local.active_event()
            && m.pending_upgrades() == local.pending_upgrades()
            && UpgradeTrack::ALL.iter().all(|t| m.upgrade(*t) == local.upgrade(*t))
            && m.slots().collect::<Vec<_>>() == local.slots().collect::<Vec<_>>()
    });

    let drift = consumers
        .iter()
        .flat_map(|e| StatKind::ALL.iter().map(move |k| (*e, *k)))
        .filter_map(|(e, k)| Some((engine.consumer_stat(e, k)? - engine.applied_stat(k)).abs()))
        .fold(0.0f32, f32::max);

    if verbose {
        println!(
            "  {} days, {} requests ({} applied), balance {}",
            summary.days, summary.requests, summary.applied, summary.final_balance
        );
    }

    let results = vec![
        check(
            "soak_every_day_reconciled",
            summary.days == DAYS,
            format!("{} of {} days", summary.days, DAYS),
        ),
        check(
            "soak_balance_non_negative",
            !negative_balance,
            format!("final balance {}", summary.final_balance),
        ),
        check(
            "soak_mirrors_converge",
            converged && decode_errors == 0,
            format!("{} mirrors, {} decode errors", mirrors.len(), decode_errors),
        ),
        check(
            "soak_consumers_match_applied_stats",
            drift < 1e-3,
            format!("max drift {:.6}", drift),
        ),
    ];
    (results, summary)
}
