//! The detectable-entity registry.
//!
//! An explicitly owned service listing every entity that can be sensed, with
//! its position and category bits. Cloning a [`DetectableRegistry`] yields
//! another handle onto the same registry, so the world and every agent's
//! candidate source can share it.
//!
//! Agents can *watch* an entity: when it stops being sensable (or is
//! removed) the entity id is pushed into the watcher's [`ForgetInbox`] and the
//! watch is dropped. Watches are one-shot and `unwatch` is idempotent, so a
//! record that is forgotten by other means never receives a late signal.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::types::{EntityId, Vec3};

/// A registered, potentially sensable entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detectable {
    /// Entity identity.
    pub id: EntityId,
    /// Current world position.
    pub position: Vec3,
    /// Category bits matched against an agent's detection mask.
    pub category: u32,
    /// Whether senses may currently pick this entity up.
    pub sensable: bool,
}

/// Queue of "no longer detectable" signals for one agent.
#[derive(Debug, Clone, Default)]
pub struct ForgetInbox(Arc<Mutex<Vec<EntityId>>>);

impl ForgetInbox {
    /// Create an empty inbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a signal for `id`.
    pub fn push(&self, id: EntityId) {
        self.0.lock().push(id);
    }

    /// Take every queued signal.
    #[must_use]
    pub fn drain(&self) -> Vec<EntityId> {
        std::mem::take(&mut *self.0.lock())
    }

    /// Number of queued signals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    /// Whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }
}

/// Handle to a one-shot "no longer detectable" watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchHandle {
    entity: EntityId,
    id: u64,
}

impl WatchHandle {
    /// The watched entity.
    #[must_use]
    pub fn entity(&self) -> EntityId {
        self.entity
    }
}

#[derive(Debug, Default)]
struct RegistryInner {
    entities: BTreeMap<EntityId, Detectable>,
    watches: HashMap<EntityId, Vec<(u64, ForgetInbox)>>,
    next_watch: u64,
}

impl RegistryInner {
    fn notify(&mut self, id: EntityId) {
        if let Some(watchers) = self.watches.remove(&id) {
            debug!(entity = %id, watchers = watchers.len(), "Entity no longer detectable");
            for (_, inbox) in watchers {
                inbox.push(id);
            }
        }
    }
}

/// Shared registry of every detectable entity.
#[derive(Debug, Clone, Default)]
pub struct DetectableRegistry {
    inner: Arc<RwLock<RegistryInner>>,
}

impl DetectableRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sensable entity in every category.
    pub fn add(&self, id: EntityId, position: Vec3) {
        self.add_with_category(id, position, u32::MAX);
    }

    /// Register a sensable entity with explicit category bits.
    pub fn add_with_category(&self, id: EntityId, position: Vec3, category: u32) {
        self.inner.write().entities.insert(
            id,
            Detectable {
                id,
                position,
                category,
                sensable: true,
            },
        );
    }

    /// Remove an entity, signalling its watchers. Returns `false` if unknown.
    pub fn remove(&self, id: EntityId) -> bool {
        let mut inner = self.inner.write();
        let removed = inner.entities.remove(&id).is_some();
        inner.notify(id);
        removed
    }

    /// Move an entity. Returns `false` if unknown.
    pub fn set_position(&self, id: EntityId, position: Vec3) -> bool {
        match self.inner.write().entities.get_mut(&id) {
            Some(entity) => {
                entity.position = position;
                true
            }
            None => false,
        }
    }

    /// Toggle whether an entity can be sensed.
    ///
    /// Turning sensing off signals every watcher exactly once.
    /// Returns `false` if the entity is unknown.
    pub fn set_sensable(&self, id: EntityId, sensable: bool) -> bool {
        let mut inner = self.inner.write();
        let Some(entity) = inner.entities.get_mut(&id) else {
            return false;
        };
        let was = entity.sensable;
        entity.sensable = sensable;
        if was && !sensable {
            inner.notify(id);
        }
        true
    }

    /// Make an entity unsensable, then remove it.
    pub fn retire(&self, id: EntityId) -> bool {
        self.set_sensable(id, false);
        self.remove(id)
    }

    /// Look up a registered entity.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<Detectable> {
        self.inner.read().entities.get(&id).copied()
    }

    /// Whether `id` is registered and sensable.
    #[must_use]
    pub fn is_sensable(&self, id: EntityId) -> bool {
        self.get(id).is_some_and(|e| e.sensable)
    }

    /// Every sensable entity.
    #[must_use]
    pub fn list(&self) -> Vec<Detectable> {
        self.inner
            .read()
            .entities
            .values()
            .filter(|e| e.sensable)
            .copied()
            .collect()
    }

    /// Number of registered entities (sensable or not).
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().entities.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().entities.is_empty()
    }

    /// Watch `id` for becoming undetectable.
    ///
    /// Returns `None` if the entity is unknown or already unsensable; there is
    /// nothing left to wait for in that case.
    pub fn watch(&self, id: EntityId, inbox: &ForgetInbox) -> Option<WatchHandle> {
        let mut inner = self.inner.write();
        if !inner.entities.get(&id).is_some_and(|e| e.sensable) {
            return None;
        }
        inner.next_watch += 1;
        let handle = WatchHandle {
            entity: id,
            id: inner.next_watch,
        };
        inner.watches.entry(id).or_default().push((handle.id, inbox.clone()));
        Some(handle)
    }

    /// Cancel a watch. Returns `false` if it already fired or was cancelled.
    pub fn unwatch(&self, handle: WatchHandle) -> bool {
        let mut inner = self.inner.write();
        let Some(watchers) = inner.watches.get_mut(&handle.entity) else {
            return false;
        };
        let before = watchers.len();
        watchers.retain(|(id, _)| *id != handle.id);
        let removed = watchers.len() != before;
        if watchers.is_empty() {
            inner.watches.remove(&handle.entity);
        }
        removed
    }

    /// Number of pending watches across all entities.
    #[must_use]
    pub fn watch_count(&self) -> usize {
        self.inner.read().watches.values().map(Vec::len).sum()
    }
}
