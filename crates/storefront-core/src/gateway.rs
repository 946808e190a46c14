//! Request gateway - the single inbound queue in front of the store.
//!
//! Any participant may submit intents, and gameplay systems publish quest
//! progress signals here too, so both are applied in one receipt order.
//! The gateway does not validate; the store re-checks everything when the
//! request is applied.

use std::collections::{BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};
use storefront_logic::quests::QuestSignal;
use storefront_logic::upgrades::UpgradeTrack;

/// Stable per-participant identifier supplied by the session layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticipantId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    AcceptQuest(usize),
    ClaimReward(usize),
    PurchaseUpgrade(UpgradeTrack),
    /// Force a catalog event for the rest of the day, or clear it.
    SetEventIndex(Option<usize>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub from: ParticipantId,
    pub intent: Intent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Request(Request),
    Signal(QuestSignal),
}

#[derive(Debug, Clone, Default)]
pub struct RequestGateway {
    participants: BTreeSet<ParticipantId>,
    queue: VecDeque<Inbound>,
    received: u64,
}

impl RequestGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the participant was already registered.
    pub fn register(&mut self, participant: ParticipantId) -> bool {
        self.participants.insert(participant)
    }

    pub fn unregister(&mut self, participant: ParticipantId) -> bool {
        self.participants.remove(&participant)
    }

    pub fn is_registered(&self, participant: ParticipantId) -> bool {
        self.participants.contains(&participant)
    }

    pub fn participants(&self) -> impl Iterator<Item = ParticipantId> + '_ {
        self.participants.iter().copied()
    }

    /// Queue an intent. Returns its receipt number.
    pub fn submit(&mut self, from: ParticipantId, intent: Intent) -> u64 {
        self.push(Inbound::Request(Request { from, intent }))
    }

    /// Queue a progress signal. Returns its receipt number.
    pub fn signal(&mut self, signal: QuestSignal) -> u64 {
        self.push(Inbound::Signal(signal))
    }

    /// Take everything queued, first received first.
    pub fn drain(&mut self) -> Vec<Inbound> {
        self.queue.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn received(&self) -> u64 {
        self.received
    }

    fn push(&mut self, inbound: Inbound) -> u64 {
        self.received += 1;
        self.queue.push_back(inbound);
        self.received
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_preserves_receipt_order() {
        let mut gw = RequestGateway::new();
        let a = ParticipantId(1);
        let b = ParticipantId(2);
        gw.submit(a, Intent::AcceptQuest(0));
        gw.signal(QuestSignal::CustomerServed);
        gw.submit(b, Intent::ClaimReward(0));
        assert_eq!(gw.received(), 3);

        let drained = gw.drain();
        assert_eq!(drained.len(), 3);
        assert!(matches!(&drained[0], Inbound::Request(r) if r.from == a));
        assert!(matches!(&drained[1], Inbound::Signal(QuestSignal::CustomerServed)));
        assert!(matches!(&drained[2], Inbound::Request(r) if r.intent == Intent::ClaimReward(0)));
        assert!(gw.is_empty());
    }

    #[test]
    fn registration_round_trip() {
        let mut gw = RequestGateway::new();
        assert!(gw.register(ParticipantId(5)));
        assert!(!gw.register(ParticipantId(5)));
        assert!(gw.is_registered(ParticipantId(5)));
        assert!(gw.unregister(ParticipantId(5)));
        assert!(!gw.is_registered(ParticipantId(5)));
    }
}
