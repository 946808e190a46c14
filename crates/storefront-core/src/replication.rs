//! Replication channel - ordered fan-out of record deltas from the
//! authoritative store to every observer.
//!
//! Every delta carries the full new value of one record and a
//! channel-wide sequence number. Observers keep the last sequence applied
//! per record and drop anything older or equal, which makes delivery
//! idempotent and tolerant of reordering between records.
//!
//! Frames for remote observers are queued per participant; whatever
//! transport the host uses pulls them with [`ReplicationChannel::drain`] or
//! [`ReplicationChannel::flush`]. The authority's own mirror and any local
//! hooks are updated synchronously inside [`ReplicationChannel::publish`].

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use storefront_logic::buffs::BuffRecord;
use storefront_logic::events::EventId;
use storefront_logic::quests::{QuestProgress, QuestTier};
use storefront_logic::upgrades::{PendingUpgrade, UpgradeLevelPair, UpgradeTrack};

use crate::gateway::ParticipantId;
use crate::mirror::Mirror;
use crate::wire;

/// Identity of one replicated record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKey {
    Slot(u8),
    Buffs,
    Upgrade(UpgradeTrack),
    PendingUpgrades,
    ActiveEvent,
    Day,
    UnlockedTier,
}

/// Observer-facing summary of the active event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveEvent {
    pub id: EventId,
    pub name: String,
}

/// Full new value of one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Delta {
    Slot { slot: u8, progress: Option<QuestProgress> },
    Buffs(Vec<BuffRecord>),
    Upgrade { track: UpgradeTrack, levels: UpgradeLevelPair },
    PendingUpgrades(Vec<PendingUpgrade>),
    ActiveEvent(Option<ActiveEvent>),
    Day(u32),
    UnlockedTier(QuestTier),
}

impl Delta {
    pub fn key(&self) -> RecordKey {
        match self {
            Delta::Slot { slot, .. } => RecordKey::Slot(*slot),
            Delta::Buffs(_) => RecordKey::Buffs,
            Delta::Upgrade { track, .. } => RecordKey::Upgrade(*track),
            Delta::PendingUpgrades(_) => RecordKey::PendingUpgrades,
            Delta::ActiveEvent(_) => RecordKey::ActiveEvent,
            Delta::Day(_) => RecordKey::Day,
            Delta::UnlockedTier(_) => RecordKey::UnlockedTier,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub version: u8,
    pub seq: u64,
    pub delta: Delta,
}

impl Envelope {
    pub fn new(seq: u64, delta: Delta) -> Self {
        Self {
            version: wire::FRAME_VERSION,
            seq,
            delta,
        }
    }
}

/// Host transport for encoded frames.
pub trait Transport {
    fn send(&mut self, to: ParticipantId, frame: &[u8]);
}

type DeltaHook = Box<dyn FnMut(&Envelope) + Send>;

pub struct ReplicationChannel {
    next_seq: u64,
    last_seq: HashMap<RecordKey, u64>,
    observers: BTreeSet<ParticipantId>,
    outbox: BTreeMap<ParticipantId, VecDeque<Vec<u8>>>,
    hooks: Vec<DeltaHook>,
    local: Mirror,
}

impl Default for ReplicationChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplicationChannel {
    pub fn new() -> Self {
        Self {
            next_seq: 0,
            last_seq: HashMap::new(),
            observers: BTreeSet::new(),
            outbox: BTreeMap::new(),
            hooks: Vec::new(),
            local: Mirror::new(),
        }
    }

    /// Register a local reaction hook, called for every published delta.
    pub fn on_delta(&mut self, hook: impl FnMut(&Envelope) + Send + 'static) {
        self.hooks.push(Box::new(hook));
    }

    pub fn connect(&mut self, participant: ParticipantId) {
        self.observers.insert(participant);
        self.outbox.entry(participant).or_default();
    }

    /// Stop delivering to a participant and discard its queued frames.
    pub fn disconnect(&mut self, participant: ParticipantId) {
        self.observers.remove(&participant);
        self.outbox.remove(&participant);
    }

    pub fn observers(&self) -> impl Iterator<Item = ParticipantId> + '_ {
        self.observers.iter().copied()
    }

    /// Fan a delta out to the local mirror, the hooks and every observer,
    /// in that order. Returns the sequence number assigned.
    pub fn publish(&mut self, delta: Delta) -> u64 {
        self.next_seq += 1;
        let seq = self.next_seq;
        let envelope = Envelope::new(seq, delta);
        self.last_seq.insert(envelope.delta.key(), seq);

        self.local.apply(&envelope);
        for hook in &mut self.hooks {
            hook(&envelope);
        }

        match wire::encode(&envelope) {
            Ok(frame) => {
                for observer in &self.observers {
                    self.outbox
                        .entry(*observer)
                        .or_default()
                        .push_back(frame.clone());
                }
            }
            Err(e) => log::error!("Failed to encode delta {}: {}", seq, e),
        }
        seq
    }

    /// Queue a full-state snapshot for one participant. Each record is
    /// stamped with the sequence of its latest broadcast so later
    /// broadcasts still supersede it.
    pub fn send_snapshot(&mut self, participant: ParticipantId, deltas: Vec<Delta>) {
        if !self.observers.contains(&participant) {
            return;
        }
        for delta in deltas {
            let seq = self.last_seq.get(&delta.key()).copied().unwrap_or(0);
            let envelope = Envelope::new(seq, delta);
            match wire::encode(&envelope) {
                Ok(frame) => self.outbox.entry(participant).or_default().push_back(frame),
                Err(e) => log::error!("Failed to encode snapshot frame: {}", e),
            }
        }
    }

    /// Take every frame queued for a participant, in emission order.
    pub fn drain(&mut self, participant: ParticipantId) -> Vec<Vec<u8>> {
        self.outbox
            .get_mut(&participant)
            .map(|q| q.drain(..).collect())
            .unwrap_or_default()
    }

    /// Push all queued frames through a transport. Returns frames sent.
    pub fn flush(&mut self, transport: &mut dyn Transport) -> usize {
        let mut sent = 0;
        for (participant, queue) in &mut self.outbox {
            for frame in queue.drain(..) {
                transport.send(*participant, &frame);
                sent += 1;
            }
        }
        sent
    }

    pub fn pending_frames(&self, participant: ParticipantId) -> usize {
        self.outbox.get(&participant).map_or(0, VecDeque::len)
    }

    /// The authority's own observer-side mirror.
    pub fn local_mirror(&self) -> &Mirror {
        &self.local
    }

    pub fn last_seq(&self) -> u64 {
        self.next_seq
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct Recorder(Vec<(ParticipantId, usize)>);

    impl Transport for Recorder {
        fn send(&mut self, to: ParticipantId, frame: &[u8]) {
            self.0.push((to, frame.len()));
        }
    }

    #[test]
    fn publish_orders_sequences() {
        let mut channel = ReplicationChannel::new();
        let a = channel.publish(Delta::Day(1));
        let b = channel.publish(Delta::Day(2));
        assert!(b > a);
        assert_eq!(channel.local_mirror().day(), 2);
    }

    #[test]
    fn observers_receive_in_order() {
        let mut channel = ReplicationChannel::new();
        let p = ParticipantId(3);
        channel.connect(p);
        channel.publish(Delta::Day(1));
        channel.publish(Delta::Day(2));

        let frames = channel.drain(p);
        assert_eq!(frames.len(), 2);
        let first = wire::decode(&frames[0]).unwrap();
        let second = wire::decode(&frames[1]).unwrap();
        assert!(first.seq < second.seq);
        assert_eq!(second.delta, Delta::Day(2));
        assert!(channel.drain(p).is_empty());
    }

    #[test]
    fn hooks_see_every_delta() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut channel = ReplicationChannel::new();
        channel.on_delta(move |env| sink.lock().unwrap().push(env.seq));
        channel.publish(Delta::Day(1));
        channel.publish(Delta::UnlockedTier(QuestTier::Medium));
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn disconnected_observer_gets_nothing() {
        let mut channel = ReplicationChannel::new();
        let p = ParticipantId(1);
        channel.connect(p);
        channel.disconnect(p);
        channel.publish(Delta::Day(4));
        assert_eq!(channel.pending_frames(p), 0);
    }

    #[test]
    fn snapshot_uses_latest_record_seq() {
        let mut channel = ReplicationChannel::new();
        channel.publish(Delta::Day(9));
        let p = ParticipantId(2);
        channel.connect(p);
        channel.send_snapshot(p, vec![Delta::Day(9), Delta::Buffs(vec![])]);
        let frames = channel.drain(p);
        assert_eq!(wire::decode(&frames[0]).unwrap().seq, 1);
        assert_eq!(wire::decode(&frames[1]).unwrap().seq, 0);
    }

    #[test]
    fn flush_sends_everything() {
        let mut channel = ReplicationChannel::new();
        channel.connect(ParticipantId(1));
        channel.connect(ParticipantId(2));
        channel.publish(Delta::Day(2));
        let mut transport = Recorder(Vec::new());
        assert_eq!(channel.flush(&mut transport), 2);
        assert_eq!(channel.pending_frames(ParticipantId(1)), 0);
    }
}
