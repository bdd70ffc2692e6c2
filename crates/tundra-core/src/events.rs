use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Identity key for feed subscriptions. One subscriber instance owns one id
/// for its whole lifetime and uses it for every subscribe/unsubscribe pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

type Callback<T> = Box<dyn Fn(T) + Send>;

struct FeedSlots<T> {
    latest: T,
    callbacks: HashMap<SubscriberId, Callback<T>>,
}

/// Publish/subscribe channel keyed by subscriber identity.
///
/// Subscribe is an upsert: at most one callback per identity, a later
/// subscribe from the same identity replaces the earlier one. The feed holds
/// the latest published value and replays it once to every new subscriber.
/// Unsubscribing an identity that never subscribed is a no-op.
///
/// Callbacks run on the publisher's context and must not call back into the
/// same feed; the slot lock is held across dispatch.
pub struct ChangeFeed<T> {
    slots: Mutex<FeedSlots<T>>,
}

impl<T: Clone> ChangeFeed<T> {
    pub fn new(initial: T) -> Self {
        Self {
            slots: Mutex::new(FeedSlots {
                latest: initial,
                callbacks: HashMap::new(),
            }),
        }
    }

    pub fn subscribe(&self, id: SubscriberId, callback: impl Fn(T) + Send + 'static) {
        let mut slots = self.slots();
        callback(slots.latest.clone());
        slots.callbacks.insert(id, Box::new(callback));
    }

    pub fn unsubscribe(&self, id: SubscriberId) {
        self.slots().callbacks.remove(&id);
    }

    pub fn publish(&self, value: T) {
        let mut slots = self.slots();
        slots.latest = value.clone();
        for callback in slots.callbacks.values() {
            callback(value.clone());
        }
    }

    pub fn latest(&self) -> T {
        self.slots().latest.clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.slots().callbacks.len()
    }

    fn slots(&self) -> MutexGuard<'_, FeedSlots<T>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn subscribe_replays_latest_value() {
        let feed = ChangeFeed::new(7u32);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        feed.subscribe(SubscriberId::new(), move |value| {
            sink.lock().expect("seen lock").push(value);
        });
        assert_eq!(*seen.lock().expect("seen lock"), vec![7]);
    }

    #[test]
    fn publish_reaches_every_subscriber_and_updates_latest() {
        let feed = ChangeFeed::new(0u32);
        let hits = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let hits = hits.clone();
            feed.subscribe(SubscriberId::new(), move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            });
        }
        hits.store(0, Ordering::SeqCst);
        feed.publish(5);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
        assert_eq!(feed.latest(), 5);
    }

    #[test]
    fn resubscribe_with_same_identity_replaces() {
        let feed = ChangeFeed::new(0u32);
        let id = SubscriberId::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let sink = first.clone();
        feed.subscribe(id, move |_| {
            sink.fetch_add(1, Ordering::SeqCst);
        });
        let sink = second.clone();
        feed.subscribe(id, move |_| {
            sink.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(feed.subscriber_count(), 1);
        let first_before = first.load(Ordering::SeqCst);
        feed.publish(1);
        assert_eq!(first.load(Ordering::SeqCst), first_before);
        assert_eq!(second.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unsubscribe_unknown_identity_is_noop() {
        let feed = ChangeFeed::new(0u32);
        feed.unsubscribe(SubscriberId::new());
        assert_eq!(feed.subscriber_count(), 0);
    }

    #[test]
    fn unsubscribed_callback_no_longer_fires() {
        let feed = ChangeFeed::new(0u32);
        let id = SubscriberId::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let sink = hits.clone();
        feed.subscribe(id, move |_| {
            sink.fetch_add(1, Ordering::SeqCst);
        });
        feed.unsubscribe(id);
        feed.publish(9);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
