//! The per-agent memory table.
//!
//! Holds one [`SensedRecord`] per identity plus the ranked view over them,
//! ordered by [`priority_cmp`] and bounded to the configured capacity.
//! Per-modality sets (currently seen / heard / smelled / implicit) are
//! derived views, rebuilt on every scan.
//!
//! Records that fall out of the ranked view are evicted from the map as
//! well, so the map and the ranking always hold the same identities and the
//! table never grows beyond `capacity` once re-ranked.

use std::collections::{HashMap, HashSet};

use crate::record::{priority_cmp, Modality, SensedRecord};
use crate::types::EntityId;

/// Identity → record map with a capacity-bounded priority ranking.
#[derive(Debug, Clone)]
pub struct MemoryTable {
    capacity: usize,
    records: HashMap<EntityId, SensedRecord>,
    ranked: Vec<EntityId>,
    seen: HashSet<EntityId>,
    heard: HashSet<EntityId>,
    smelled: HashSet<EntityId>,
    implicit: HashSet<EntityId>,
}

impl MemoryTable {
    /// Create an empty table holding at most `capacity` ranked records.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            records: HashMap::with_capacity(capacity),
            ranked: Vec::with_capacity(capacity),
            seen: HashSet::new(),
            heard: HashSet::new(),
            smelled: HashSet::new(),
            implicit: HashSet::new(),
        }
    }

    /// Maximum number of ranked records.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of remembered records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing is remembered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether `id` is currently remembered.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.records.contains_key(&id)
    }

    /// The record for `id`, if remembered.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&SensedRecord> {
        self.records.get(&id)
    }

    /// Ranked identities, highest priority first.
    #[must_use]
    pub fn ranked_ids(&self) -> &[EntityId] {
        &self.ranked
    }

    /// Ranked records, highest priority first.
    pub fn ranked(&self) -> impl Iterator<Item = &SensedRecord> + '_ {
        self.ranked.iter().filter_map(|id| self.records.get(id))
    }

    /// Position of `id` in the ranking (0 = highest priority).
    #[must_use]
    pub fn rank_of(&self, id: EntityId) -> Option<usize> {
        self.ranked.iter().position(|r| *r == id)
    }

    /// Identities the given sense detected on the last scan.
    #[must_use]
    pub fn sensed_by(&self, modality: Modality) -> &HashSet<EntityId> {
        match modality {
            Modality::Sight => &self.seen,
            Modality::Hearing => &self.heard,
            Modality::Smell => &self.smelled,
            Modality::Implicit => &self.implicit,
        }
    }

    /// Start a scan: clear the modality views and every record's sense flags.
    pub fn begin_scan(&mut self) {
        self.seen.clear();
        self.heard.clear();
        self.smelled.clear();
        self.implicit.clear();
        for record in self.records.values_mut() {
            record.clear_senses();
        }
    }

    /// Insert or overwrite the record for `record.id`, indexing its senses.
    ///
    /// The ranking is not updated until [`MemoryTable::rerank`].
    pub fn upsert(&mut self, record: SensedRecord) {
        let id = record.id;
        for (flag, set) in [
            (record.seen, &mut self.seen),
            (record.heard, &mut self.heard),
            (record.smelled, &mut self.smelled),
            (record.implicitly_detected, &mut self.implicit),
        ] {
            if flag {
                set.insert(id);
            } else {
                set.remove(&id);
            }
        }
        self.records.insert(id, record);
    }

    /// Re-sort every record and trim the ranking to capacity.
    ///
    /// Records ranked past capacity are removed from the table entirely and
    /// returned, best first.
    pub fn rerank(&mut self) -> Vec<SensedRecord> {
        self.rerank_evicting_first(|_| false)
    }

    /// Re-sort and trim, giving up records matching `expendable` first.
    ///
    /// While the table is over capacity, expendable records are dropped
    /// lowest-ranked first; only then is the ranking cut at `capacity`.
    /// Under capacity nothing is dropped, expendable or not.
    pub fn rerank_evicting_first(&mut self, expendable: impl Fn(&SensedRecord) -> bool) -> Vec<SensedRecord> {
        let mut order: Vec<&SensedRecord> = self.records.values().collect();
        order.sort_by(|a, b| priority_cmp(a, b));

        let excess = order.len().saturating_sub(self.capacity);
        let doomed: HashSet<EntityId> = order
            .iter()
            .rev()
            .filter(|r| expendable(**r))
            .take(excess)
            .map(|r| r.id)
            .collect();
        let (mut kept, mut evicted): (Vec<EntityId>, Vec<EntityId>) =
            order.iter().map(|r| r.id).partition(|id| !doomed.contains(id));
        evicted.extend(kept.split_off(self.capacity.min(kept.len())));
        self.ranked = kept;

        evicted.into_iter().filter_map(|id| self.remove_indexes(id)).collect()
    }

    /// Remove `id` from the map, the ranking and every modality view.
    pub fn remove(&mut self, id: EntityId) -> Option<SensedRecord> {
        let record = self.remove_indexes(id)?;
        self.ranked.retain(|r| *r != id);
        Some(record)
    }

    /// Drop every record.
    pub fn clear(&mut self) {
        self.records.clear();
        self.ranked.clear();
        self.seen.clear();
        self.heard.clear();
        self.smelled.clear();
        self.implicit.clear();
    }

    fn remove_indexes(&mut self, id: EntityId) -> Option<SensedRecord> {
        let record = self.records.remove(&id)?;
        self.seen.remove(&id);
        self.heard.remove(&id);
        self.smelled.remove(&id);
        self.implicit.remove(&id);
        Some(record)
    }
}
