//! Storefront Core - Shared Progression Runtime
//!
//! Runs the progression state of one co-operative shop session: daily
//! quests, buffs, deferred upgrades and calendar events. One authoritative
//! store applies every mutation and replicates the result to read-only
//! observer mirrors.
//!
//! # Architecture
//!
//! - **Gateway**: participants submit intents and gameplay publishes
//!   progress signals; both are queued in receipt order
//! - **Store**: re-validates each intent against current state and applies
//!   it as one step, or rejects it without side effects
//! - **Channel**: every record change goes out as a full-value delta with a
//!   sequence number; observers apply per-record last-write-wins
//! - **Reconciler**: one fixed sequence per day boundary
//! - **Stat consumers**: `hecs` entities whose fields are shifted by buffs
//!   and tiers and multiplied by the active event
//!
//! # Example
//!
//! ```rust,no_run
//! use storefront_core::prelude::*;
//!
//! let mut clock = ManualClock::new(1);
//! let catalog = Catalog::builtin().expect("bundled catalog");
//! let mut engine = ProgressionEngine::new(EngineConfig::default(), catalog, &mut clock);
//!
//! let host = ParticipantId(1);
//! engine.connect(host);
//! engine.submit(host, Intent::AcceptQuest(0));
//! engine.pump(&clock);
//!
//! clock.advance_day();
//! engine.pump(&clock);
//! ```

pub mod catalog;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod ledger;
pub mod mirror;
pub mod reconciler;
pub mod replication;
pub mod stats;
pub mod store;
pub mod wire;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::catalog::Catalog;
    pub use crate::clock::{DayClock, ManualClock};
    pub use crate::config::EngineConfig;
    pub use crate::engine::{ProgressionEngine, PumpReport};
    pub use crate::error::Rejection;
    pub use crate::gateway::{Intent, ParticipantId};
    pub use crate::ledger::{CurrencyLedger, Wallet};
    pub use crate::mirror::Mirror;
    pub use crate::reconciler::DayReport;
    pub use crate::store::Applied;
    pub use storefront_logic::effects::StatKind;
    pub use storefront_logic::quests::{QuestSignal, QuestStatus};
    pub use storefront_logic::upgrades::UpgradeTrack;
}
