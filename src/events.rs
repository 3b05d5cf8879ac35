//! Notifications published by a `LidarNode`.

use crate::base::Message;
use crate::types::{SampleBatch, ZoneTransition};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use log::warn;

#[derive(Debug, Clone, PartialEq)]
pub enum LidarEvent {
    /// Samples decoded from one inbound chunk.
    Samples(SampleBatch),
    /// A zone changed state.
    Transition(ZoneTransition),
    /// Raw answer to a query command (device info, health, sample rate, legacy scan).
    Response(Message),
    /// The session hit an unrecoverable condition and was reset.
    Fault(String),
}

/// Fan-out of events to bounded subscriber channels.
///
/// Publishing never blocks: a full subscriber misses the event, a dropped one is forgotten.
#[derive(Debug)]
pub struct EventBus {
    capacity: usize,
    subscribers: Vec<Sender<LidarEvent>>,
}

impl EventBus {
    pub fn new(capacity: usize) -> EventBus {
        EventBus {
            capacity,
            subscribers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self) -> Receiver<LidarEvent> {
        let (tx, rx) = crossbeam_channel::bounded(self.capacity);
        self.subscribers.push(tx);
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn publish(&mut self, event: LidarEvent) {
        self.subscribers.retain(|tx| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("Event subscriber is full, dropping event");
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        });
    }
}
