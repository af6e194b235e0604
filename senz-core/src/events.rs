//! Sense event notification.
//!
//! Three event classes are published to whoever subscribed:
//!
//! - **newly sensed**: the batch of records detected for the first time, or
//!   re-acquired after a gap, on a scan
//! - **nearest changed**: the selected target switched (either side may be none)
//! - **forgotten**: a record was evicted
//!
//! Every `subscribe_*` call returns a [`Subscription`] handle; passing it to
//! [`EventHub::unsubscribe`] removes exactly that handler, and a second call
//! with the same handle is a no-op.

use crate::record::SensedRecord;
use crate::types::EntityId;

/// Handler for newly-sensed batches.
pub type NewlySensedHandler = Box<dyn FnMut(&[SensedRecord]) + Send>;
/// Handler for nearest-target changes.
pub type NearestChangedHandler = Box<dyn FnMut(NearestChanged) + Send>;
/// Handler for forgotten records.
pub type ForgottenHandler = Box<dyn FnMut(&SensedRecord) + Send>;

/// The nearest target switched from `old` to `new`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NearestChanged {
    /// Previously selected target.
    pub old: Option<EntityId>,
    /// Newly selected target.
    pub new: Option<EntityId>,
}

/// Which event class a subscription listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventClass {
    /// Newly-sensed batches.
    NewlySensed,
    /// Nearest-target changes.
    NearestChanged,
    /// Evicted records.
    Forgotten,
}

/// Handle returned by a subscription; pass it back to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[must_use = "dropping the handle makes the subscription impossible to remove"]
pub struct Subscription {
    id: u64,
    class: EventClass,
}

impl Subscription {
    /// The event class this handle belongs to.
    #[must_use]
    pub fn class(&self) -> EventClass {
        self.class
    }
}

/// Registry of event handlers for one agent.
#[derive(Default)]
pub struct EventHub {
    next_id: u64,
    newly_sensed: Vec<(u64, NewlySensedHandler)>,
    nearest_changed: Vec<(u64, NearestChangedHandler)>,
    forgotten: Vec<(u64, ForgottenHandler)>,
}

impl std::fmt::Debug for EventHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHub")
            .field("newly_sensed", &self.newly_sensed.len())
            .field("nearest_changed", &self.nearest_changed.len())
            .field("forgotten", &self.forgotten.len())
            .finish()
    }
}

impl EventHub {
    /// Create a hub with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn issue(&mut self, class: EventClass) -> Subscription {
        self.next_id += 1;
        Subscription { id: self.next_id, class }
    }

    /// Listen for newly-sensed batches.
    pub fn subscribe_newly_sensed(&mut self, handler: impl FnMut(&[SensedRecord]) + Send + 'static) -> Subscription {
        let sub = self.issue(EventClass::NewlySensed);
        self.newly_sensed.push((sub.id, Box::new(handler)));
        sub
    }

    /// Listen for nearest-target changes.
    pub fn subscribe_nearest_changed(&mut self, handler: impl FnMut(NearestChanged) + Send + 'static) -> Subscription {
        let sub = self.issue(EventClass::NearestChanged);
        self.nearest_changed.push((sub.id, Box::new(handler)));
        sub
    }

    /// Listen for forgotten records.
    pub fn subscribe_forgotten(&mut self, handler: impl FnMut(&SensedRecord) + Send + 'static) -> Subscription {
        let sub = self.issue(EventClass::Forgotten);
        self.forgotten.push((sub.id, Box::new(handler)));
        sub
    }

    /// Remove a handler. Returns `false` if it was already removed.
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        let id = subscription.id;
        let before = self.len();
        match subscription.class {
            EventClass::NewlySensed => self.newly_sensed.retain(|(s, _)| *s != id),
            EventClass::NearestChanged => self.nearest_changed.retain(|(s, _)| *s != id),
            EventClass::Forgotten => self.forgotten.retain(|(s, _)| *s != id),
        }
        self.len() != before
    }

    /// Total number of live subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.newly_sensed.len() + self.nearest_changed.len() + self.forgotten.len()
    }

    /// Whether nobody is listening.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every handler.
    pub fn clear(&mut self) {
        self.newly_sensed.clear();
        self.nearest_changed.clear();
        self.forgotten.clear();
    }

    /// Publish a newly-sensed batch. Empty batches are not published.
    pub fn emit_newly_sensed(&mut self, batch: &[SensedRecord]) {
        if batch.is_empty() {
            return;
        }
        for (_, handler) in &mut self.newly_sensed {
            handler(batch);
        }
    }

    /// Publish a nearest-target change.
    pub fn emit_nearest_changed(&mut self, old: Option<EntityId>, new: Option<EntityId>) {
        let event = NearestChanged { old, new };
        for (_, handler) in &mut self.nearest_changed {
            handler(event);
        }
    }

    /// Publish an evicted record.
    pub fn emit_forgotten(&mut self, record: &SensedRecord) {
        for (_, handler) in &mut self.forgotten {
            handler(record);
        }
    }
}
