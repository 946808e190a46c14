//! Pure progression logic for Storefront.
//!
//! This crate contains the progression rules that are independent of any
//! session, transport, or entity storage. Functions take plain data and
//! return results, so the authoritative store, the observer mirrors and the
//! headless harness all share one implementation.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`buffs`] | Buff records and the merge/decay ledger |
//! | [`constants`] | Slot counts, rent interval, calendar step and draw limits |
//! | [`effects`] | Stat kinds, modifier composition, event snapshot map |
//! | [`events`] | Day-scoped event modifiers and the event calendar |
//! | [`quests`] | Quest content, progress state machine, progress signals |
//! | [`selection`] | Weighted quest selection and calendar placement |
//! | [`upgrades`] | Upgrade tracks, pricing, deferred commit ledger |

pub mod buffs;
pub mod constants;
pub mod effects;
pub mod events;
pub mod quests;
pub mod selection;
pub mod upgrades;
