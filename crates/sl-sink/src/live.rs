//! Live fanout of rendered lines to subscribers.
//!
//! Subscriptions are keyed by subject and only change through
//! [`LiveFanout::subscribe`] and [`LiveFanout::unsubscribe`]. Delivery is
//! synchronous and happens outside the subscription lock; a subscriber
//! that fails delivery is removed and the rest still receive the line.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::debug;

/// A subscriber could not take a line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("subscriber disconnected")]
    Disconnected,
}

/// Receiver of live lines.
pub trait LiveSubscriber: Send + Sync {
    fn deliver(&self, line: &str) -> Result<(), DeliveryError>;
}

/// Subscriber backed by an mpsc channel. Fails once the receiver is gone.
#[derive(Debug, Clone)]
pub struct ChannelSubscriber {
    tx: Sender<String>,
}

impl ChannelSubscriber {
    pub fn new(tx: Sender<String>) -> Self {
        Self { tx }
    }
}

impl LiveSubscriber for ChannelSubscriber {
    fn deliver(&self, line: &str) -> Result<(), DeliveryError> {
        self.tx
            .send(line.to_string())
            .map_err(|_| DeliveryError::Disconnected)
    }
}

/// Stable handle of one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

type Subscriptions = HashMap<String, Vec<(SubscriberId, Arc<dyn LiveSubscriber>)>>;

/// Subscription registry keyed by subject.
#[derive(Default)]
pub struct LiveFanout {
    next_id: AtomicU64,
    subscriptions: Mutex<Subscriptions>,
}

impl LiveFanout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, subject: &str, subscriber: Arc<dyn LiveSubscriber>) -> SubscriberId {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock()
            .entry(subject.to_string())
            .or_default()
            .push((id, subscriber));
        id
    }

    /// Remove one subscription. Returns whether it existed.
    pub fn unsubscribe(&self, subject: &str, id: SubscriberId) -> bool {
        let mut subs = self.lock();
        let Some(list) = subs.get_mut(subject) else {
            return false;
        };
        let before = list.len();
        list.retain(|(sid, _)| *sid != id);
        let removed = list.len() != before;
        if list.is_empty() {
            subs.remove(subject);
        }
        removed
    }

    pub fn has_subscribers(&self, subject: &str) -> bool {
        self.lock().contains_key(subject)
    }

    pub fn subscriber_count(&self, subject: &str) -> usize {
        self.lock().get(subject).map_or(0, Vec::len)
    }

    /// Deliver `line` to every subscriber of `subject`.
    ///
    /// Returns the number of successful deliveries.
    pub fn publish(&self, subject: &str, line: &str) -> usize {
        let targets = match self.lock().get(subject) {
            Some(list) => list.clone(),
            None => return 0,
        };

        let mut delivered = 0;
        let mut failed = Vec::new();
        for (id, subscriber) in &targets {
            match subscriber.deliver(line) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    debug!(subject, error = %e, "dropping live subscriber");
                    failed.push(*id);
                }
            }
        }
        for id in failed {
            self.unsubscribe(subject, id);
        }
        delivered
    }

    fn lock(&self) -> MutexGuard<'_, Subscriptions> {
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for LiveFanout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveFanout")
            .field("subjects", &self.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;

    #[test]
    fn test_publish_only_to_subject() {
        let fanout = LiveFanout::new();
        let (tx, rx) = channel();
        fanout.subscribe("Alice", Arc::new(ChannelSubscriber::new(tx)));

        assert_eq!(fanout.publish("Bob", "nope"), 0);
        assert_eq!(fanout.publish("Alice", "hello"), 1);
        assert_eq!(rx.try_recv().unwrap(), "hello");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_disconnected_subscriber_removed() {
        let fanout = LiveFanout::new();
        let (tx1, rx1) = channel();
        let (tx2, rx2) = channel::<String>();
        fanout.subscribe("Alice", Arc::new(ChannelSubscriber::new(tx1)));
        fanout.subscribe("Alice", Arc::new(ChannelSubscriber::new(tx2)));
        drop(rx2);

        assert_eq!(fanout.publish("Alice", "line"), 1);
        assert_eq!(rx1.recv().unwrap(), "line");
        assert_eq!(fanout.subscriber_count("Alice"), 1);
    }

    #[test]
    fn test_unsubscribe() {
        let fanout = LiveFanout::new();
        let (tx, _rx) = channel();
        let id = fanout.subscribe("Alice", Arc::new(ChannelSubscriber::new(tx)));
        assert!(fanout.has_subscribers("Alice"));
        assert!(fanout.unsubscribe("Alice", id));
        assert!(!fanout.unsubscribe("Alice", id));
        assert!(!fanout.has_subscribers("Alice"));
    }
}
