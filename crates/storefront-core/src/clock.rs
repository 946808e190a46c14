//! Day clock interface.
//!
//! The clock itself lives outside the engine. It only has to report the
//! current day and hour and notify subscribers when a day boundary passes.
//! [`ManualClock`] is a host-driven implementation used by the harness and
//! the tests.

use std::sync::mpsc::{channel, Receiver, Sender};

/// Payload-free "a day boundary occurred" notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayAdvanced;

/// Handle returned by [`DayClock::subscribe`].
#[derive(Debug)]
pub struct DaySubscription {
    id: u64,
    rx: Receiver<DayAdvanced>,
}

impl DaySubscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Number of boundaries received since the last call.
    pub fn drain(&self) -> usize {
        self.rx.try_iter().count()
    }
}

pub trait DayClock {
    fn current_day(&self) -> u32;
    fn current_hour(&self) -> u8;
    fn subscribe(&mut self) -> DaySubscription;
    fn unsubscribe(&mut self, subscription: DaySubscription);
}

/// Clock advanced explicitly by the host.
#[derive(Debug)]
pub struct ManualClock {
    day: u32,
    hour: u8,
    subscribers: Vec<(u64, Sender<DayAdvanced>)>,
    next_id: u64,
}

impl ManualClock {
    pub fn new(day: u32) -> Self {
        Self {
            day,
            hour: 0,
            subscribers: Vec::new(),
            next_id: 0,
        }
    }

    pub fn set_hour(&mut self, hour: u8) {
        self.hour = hour % 24;
    }

    /// Move to the next day and notify every live subscriber.
    pub fn advance_day(&mut self) {
        self.day += 1;
        self.hour = 0;
        // Dropped receivers fail to send and are pruned.
        self.subscribers.retain(|(_, tx)| tx.send(DayAdvanced).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl DayClock for ManualClock {
    fn current_day(&self) -> u32 {
        self.day
    }

    fn current_hour(&self) -> u8 {
        self.hour
    }

    fn subscribe(&mut self) -> DaySubscription {
        let (tx, rx) = channel();
        let id = self.next_id;
        self.next_id += 1;
        self.subscribers.push((id, tx));
        DaySubscription { id, rx }
    }

    fn unsubscribe(&mut self, subscription: DaySubscription) {
        self.subscribers.retain(|(id, _)| *id != subscription.id);
    }
}
