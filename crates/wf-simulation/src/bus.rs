//! Typed pub/sub with a bounded history.

use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use wf_core::EventId;

use crate::event::{EventRecord, RawEventRecord, WorldEvent, WorldEventType};

/// Callback invoked for each matching published event.
pub type Callback = Box<dyn FnMut(&WorldEvent)>;

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

struct Subscription {
    id: SubscriptionId,
    filter: Option<WorldEventType>,
    callback: Callback,
}

/// Persisted portion of the bus. Subscribers are not saved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventBusSnapshot {
    /// Id the next published event receives.
    #[serde(default)]
    pub next_id: EventId,
    /// Simulated hours stamped on new events.
    #[serde(default)]
    pub time: f64,
    /// Retained events, oldest first.
    #[serde(default)]
    pub history: Vec<WorldEvent>,
}

/// Publishes events to subscribers and keeps the most recent ones.
pub struct EventBus {
    history: VecDeque<WorldEvent>,
    max_history: usize,
    next_id: EventId,
    time: f64,
    subscribers: Vec<Subscription>,
    next_subscription: u64,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("history", &self.history.len())
            .field("max_history", &self.max_history)
            .field("next_id", &self.next_id)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl EventBus {
    /// A bus keeping at most `max_history` events (at least one).
    pub fn new(max_history: usize) -> Self {
        Self {
            history: VecDeque::new(),
            max_history: max_history.max(1),
            next_id: EventId(1),
            time: 0.0,
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Call `callback` for every event of `event_type`.
    pub fn subscribe(
        &mut self,
        event_type: WorldEventType,
        callback: impl FnMut(&WorldEvent) + 'static,
    ) -> SubscriptionId {
        self.add_subscription(Some(event_type), Box::new(callback))
    }

    /// Call `callback` for every event.
    pub fn subscribe_all(&mut self, callback: impl FnMut(&WorldEvent) + 'static) -> SubscriptionId {
        self.add_subscription(None, Box::new(callback))
    }

    fn add_subscription(
        &mut self,
        filter: Option<WorldEventType>,
        callback: Callback,
    ) -> SubscriptionId {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.subscribers.push(Subscription {
            id,
            filter,
            callback,
        });
        id
    }

    /// Remove a subscription. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        self.subscribers.len() != before
    }

    /// Stamp the time used for subsequently published events.
    pub fn set_time(&mut self, hours: f64) {
        self.time = hours;
    }

    /// The time stamped on new events.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Publish one event and notify subscribers.
    ///
    /// A panicking subscriber is logged and skipped; the others still run.
    pub fn publish(&mut self, event_type: WorldEventType, data: Map<String, Value>) -> WorldEvent {
        let event = WorldEvent {
            id: self.next_id,
            event_type,
            data,
            timestamp: self.time,
        };
        self.next_id = self.next_id.next();

        self.history.push_back(event.clone());
        while self.history.len() > self.max_history {
            self.history.pop_front();
        }

        for subscription in &mut self.subscribers {
            if subscription.filter.is_some_and(|f| f != event_type) {
                continue;
            }
            let callback = &mut subscription.callback;
            if catch_unwind(AssertUnwindSafe(|| callback(&event))).is_err() {
                tracing::warn!(
                    subscription = subscription.id.0,
                    event_type = %event_type,
                    "event subscriber panicked"
                );
            }
        }
        event
    }

    /// Publish typed records in order.
    pub fn publish_records(&mut self, records: Vec<EventRecord>) -> Vec<WorldEvent> {
        records
            .into_iter()
            .map(|r| self.publish(r.event_type, r.data))
            .collect()
    }

    /// Publish records whose type arrives as a string. Unknown types are dropped.
    pub fn publish_batch(&mut self, records: Vec<RawEventRecord>) -> Vec<WorldEvent> {
        let mut published = Vec::with_capacity(records.len());
        for record in records {
            match record.event_type.parse::<WorldEventType>() {
                Ok(event_type) => published.push(self.publish(event_type, record.data)),
                Err(err) => tracing::warn!(error = %err, "dropping event with unknown type"),
            }
        }
        published
    }

    /// Up to `count` of the newest events, oldest first, optionally filtered by type.
    pub fn recent(&self, count: usize, filter: Option<WorldEventType>) -> Vec<&WorldEvent> {
        let mut matches: Vec<&WorldEvent> = self
            .history
            .iter()
            .rev()
            .filter(|e| filter.is_none_or(|f| e.event_type == f))
            .take(count)
            .collect();
        matches.reverse();
        matches
    }

    /// All retained events, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &WorldEvent> {
        self.history.iter()
    }

    /// Number of retained events.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// Whether no events are retained.
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Drop the retained history. Subscriptions and the id counter are kept.
    pub fn clear(&mut self) {
        self.history.clear();
    }

    /// Capture history and counters.
    pub fn snapshot(&self) -> EventBusSnapshot {
        EventBusSnapshot {
            next_id: self.next_id,
            time: self.time,
            history: self.history.iter().cloned().collect(),
        }
    }

    /// Replace history and counters. Subscriptions stay registered.
    pub fn restore(&mut self, snapshot: EventBusSnapshot) {
        let newest_id = snapshot.history.last().map(|e| e.id.next());
        self.next_id = newest_id.map_or(snapshot.next_id, |n| n.max(snapshot.next_id));
        self.time = snapshot.time;
        self.history = snapshot.history.into();
        while self.history.len() > self.max_history {
            self.history.pop_front();
        }
    }
}
