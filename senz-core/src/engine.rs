//! The per-agent sense engine.
//!
//! Drives one scan per scheduled tick:
//!
//! ```text
//! candidate source ─▶ classifier ─▶ memory table ─▶ rerank + trim ─▶ retention ─▶ events
//! ```
//!
//! The host owns the lifecycle: [`SenseEngine::initialize`], then
//! [`SenseEngine::tick`] once per frame, then [`SenseEngine::shutdown`].
//! Full scans run every `scan.interval` ticks, or every tick while the agent
//! is alert.
//!
//! "No longer detectable" signals arrive through the engine's
//! [`ForgetInbox`], which anything may push into at any time (including an
//! event handler in the middle of a scan). Queued signals are applied at the
//! start of the next tick, or immediately via
//! [`SenseEngine::process_pending`].

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, trace};

use crate::acquisition::{AcquisitionQuery, CandidateSource};
use crate::classify::ModalityClassifier;
use crate::config::SenzConfig;
use crate::error::Result;
use crate::events::{EventHub, NearestChanged, Subscription};
use crate::memory::MemoryTable;
use crate::record::{Modality, SensedRecord};
use crate::registry::{DetectableRegistry, ForgetInbox, WatchHandle};
use crate::retention::{NearestUpdate, RetentionPolicy};
use crate::types::{EntityId, Pose, SenseStats, SenseTime};

/// Predicate deciding whether a candidate may be sensed at all.
pub type CandidateFilter = Box<dyn Fn(EntityId) -> bool + Send>;

/// Per-tick input from the scheduler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickContext {
    /// Current simulation time.
    pub now: SenseTime,
    /// Where the agent's senses are and which way it faces.
    pub pose: Pose,
}

impl TickContext {
    /// Create a tick context.
    #[must_use]
    pub fn new(now: SenseTime, pose: Pose) -> Self {
        Self { now, pose }
    }
}

/// Perception and short-term target memory for a single agent.
pub struct SenseEngine {
    agent: EntityId,
    config: SenzConfig,
    classifier: ModalityClassifier,
    retention: RetentionPolicy,
    table: MemoryTable,
    source: Box<dyn CandidateSource + Send>,
    filter: Option<CandidateFilter>,
    events: EventHub,
    detectability: Option<DetectableRegistry>,
    inbox: ForgetInbox,
    watches: HashMap<EntityId, WatchHandle>,
    nearest: Option<EntityId>,
    last_scan: Option<SenseTime>,
    ticks_since_scan: u32,
    alert: bool,
    running: bool,
    stats: SenseStats,
}

impl std::fmt::Debug for SenseEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SenseEngine")
            .field("agent", &self.agent)
            .field("remembered", &self.table.len())
            .field("nearest", &self.nearest)
            .field("alert", &self.alert)
            .field("running", &self.running)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl SenseEngine {
    /// Create an engine for `agent`, gathering candidates from `source`.
    ///
    /// # Errors
    /// Returns `SenzError::InvalidConfig` if the configuration is out of range.
    pub fn new(agent: EntityId, config: SenzConfig, source: impl CandidateSource + Send + 'static) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            agent,
            classifier: ModalityClassifier::new(config.senses.clone(), config.scan.rng_seed),
            retention: RetentionPolicy::new(config.targeting.retain_nearest_secs),
            table: MemoryTable::new(config.targeting.capacity),
            config,
            source: Box::new(source),
            filter: None,
            events: EventHub::new(),
            detectability: None,
            inbox: ForgetInbox::new(),
            watches: HashMap::new(),
            nearest: None,
            last_scan: None,
            ticks_since_scan: 0,
            alert: false,
            running: false,
            stats: SenseStats::default(),
        })
    }

    /// Reject candidates for which `filter` returns `false`.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Fn(EntityId) -> bool + Send + 'static) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    /// Watch remembered entities in `registry` for becoming undetectable.
    #[must_use]
    pub fn with_detectability(mut self, registry: DetectableRegistry) -> Self {
        self.detectability = Some(registry);
        self
    }

    /// Replace (or clear) the candidate filter.
    pub fn set_filter(&mut self, filter: Option<CandidateFilter>) {
        self.filter = filter;
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Start accepting ticks. The first tick afterwards always scans.
    pub fn initialize(&mut self) {
        self.running = true;
        self.ticks_since_scan = self.config.scan.interval;
        let unwatched: Vec<EntityId> = self
            .table
            .ranked_ids()
            .iter()
            .copied()
            .filter(|id| !self.watches.contains_key(id))
            .collect();
        for id in unwatched {
            self.watch(id);
        }
        info!(agent = %self.agent, remembered = self.table.len(), "Senses initialized");
    }

    /// Advance one frame. Returns `true` if a full scan ran.
    ///
    /// Ticks before [`SenseEngine::initialize`] or after
    /// [`SenseEngine::shutdown`] do nothing.
    pub fn tick(&mut self, ctx: &TickContext) -> bool {
        if !self.running {
            return false;
        }
        self.stats.ticks += 1;
        self.process_pending();

        self.ticks_since_scan = self.ticks_since_scan.saturating_add(1);
        if !self.alert && self.ticks_since_scan < self.config.scan.interval {
            self.stats.skipped_ticks += 1;
            return false;
        }
        self.ticks_since_scan = 0;
        self.scan(ctx);
        true
    }

    /// Stop accepting ticks and cancel every pending detectability watch.
    ///
    /// Remembered records are kept; [`SenseEngine::initialize`] resumes.
    pub fn shutdown(&mut self) {
        if let Some(registry) = &self.detectability {
            for (_, handle) in self.watches.drain() {
                registry.unwatch(handle);
            }
        }
        self.watches.clear();
        let _ = self.inbox.drain();
        self.running = false;
        info!(agent = %self.agent, "Senses shut down");
    }

    /// Whether the engine is between `initialize` and `shutdown`.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Elevated alertness: scan on every tick instead of every `interval`.
    pub fn set_alert(&mut self, alert: bool) {
        self.alert = alert;
    }

    /// Whether the agent is currently alert.
    #[must_use]
    pub fn is_alert(&self) -> bool {
        self.alert
    }

    // -----------------------------------------------------------------------
    // Scan
    // -----------------------------------------------------------------------

    fn scan(&mut self, ctx: &TickContext) {
        let now = ctx.now;
        self.stats.scans += 1;
        self.table.begin_scan();

        let query = AcquisitionQuery {
            origin: ctx.pose.position,
            radius: self.config.senses.max_sense_range(),
            mask: self.config.targeting.detection_mask,
        };
        let candidates = self.source.acquire(&query);

        let mut processed = HashSet::with_capacity(candidates.len());
        let mut newly_sensed = Vec::new();
        let mut created = Vec::new();

        for candidate in &candidates {
            if candidate.id == self.agent || !processed.insert(candidate.id) {
                continue;
            }
            if self.filter.as_ref().is_some_and(|accept| !accept(candidate.id)) {
                continue;
            }

            let existing = self.table.get(candidate.id).copied();
            let mut record = existing
                .unwrap_or_else(|| SensedRecord::new(candidate.id, candidate.position, candidate.distance, now));
            record.clear_senses();
            if !self.classifier.classify(&mut record, candidate, &ctx.pose, existing.is_none()) {
                continue;
            }

            // Not detected on the previous scan: new, or re-acquired after a gap.
            if existing.is_none_or(|r| Some(r.last_detection) != self.last_scan) {
                newly_sensed.push(candidate.id);
            }
            if existing.is_none() {
                created.push(candidate.id);
            }
            record.last_detection = now;
            self.table.upsert(record);
        }

        self.stats.records_created += created.len() as u64;
        for id in created {
            self.watch(id);
        }

        // Expired memories give up their slots before anything fresh does.
        // The current nearest is spared so its expiry is still announced.
        let retention = self.retention;
        let nearest = self.nearest;
        let evicted = self
            .table
            .rerank_evicting_first(|r| Some(r.id) != nearest && retention.is_expired(r, now));
        for evicted in evicted {
            self.unwatch(evicted.id);
            self.stats.records_forgotten += 1;
            debug!(agent = %self.agent, entity = %evicted.id, "Trimmed past capacity");
            self.events.emit_forgotten(&evicted);
        }

        let batch: Vec<SensedRecord> = newly_sensed
            .iter()
            .filter_map(|id| self.table.get(*id).copied())
            .collect();
        self.events.emit_newly_sensed(&batch);
        self.last_scan = Some(now);

        trace!(
            agent = %self.agent,
            candidates = candidates.len(),
            remembered = self.table.len(),
            newly_sensed = batch.len(),
            "Scan complete"
        );

        self.update_nearest(now);
    }

    fn update_nearest(&mut self, now: SenseTime) {
        let update = self.retention.evaluate(self.nearest, &self.table, now);
        if let NearestUpdate::Expired { old } = update {
            self.stats.nearest_expiries += 1;
            debug!(agent = %self.agent, entity = %old, "Nearest target expired");
        }
        if let Some((old, new)) = update.transition() {
            self.nearest = new;
            debug!(agent = %self.agent, ?old, ?new, "Nearest target changed");
            self.events.emit_nearest_changed(old, new);
        }
    }

    // -----------------------------------------------------------------------
    // Forgetting
    // -----------------------------------------------------------------------

    /// Apply every queued "no longer detectable" signal.
    pub fn process_pending(&mut self) {
        for id in self.inbox.drain() {
            // The watch already fired; nothing to cancel.
            self.watches.remove(&id);
            self.forget(id);
        }
    }

    /// Evict `id`. Returns the removed record, or `None` if it was not remembered.
    ///
    /// If it was the nearest target the next best fresh record (or none) is
    /// promoted and a nearest-changed event fires; a forgotten event always
    /// fires.
    pub fn forget(&mut self, id: EntityId) -> Option<SensedRecord> {
        let record = self.table.remove(id)?;
        self.unwatch(id);
        self.stats.records_forgotten += 1;
        debug!(agent = %self.agent, entity = %id, "Forgot sensed entity");

        if self.nearest == Some(id) {
            let promoted = match self.last_scan {
                Some(now) => self.retention.select(&self.table, now),
                None => self.table.ranked().next(),
            }
            .map(|r| r.id);
            self.nearest = promoted;
            self.events.emit_nearest_changed(Some(id), promoted);
        }
        self.events.emit_forgotten(&record);
        Some(record)
    }

    /// Evict the entity behind `record`.
    pub fn forget_record(&mut self, record: &SensedRecord) -> Option<SensedRecord> {
        self.forget(record.id)
    }

    /// Inbox for "no longer detectable" signals aimed at this agent.
    #[must_use]
    pub fn inbox(&self) -> &ForgetInbox {
        &self.inbox
    }

    fn watch(&mut self, id: EntityId) {
        let Some(registry) = &self.detectability else {
            return;
        };
        if let Some(handle) = registry.watch(id, &self.inbox) {
            self.watches.insert(id, handle);
        }
    }

    fn unwatch(&mut self, id: EntityId) {
        if let (Some(registry), Some(handle)) = (&self.detectability, self.watches.remove(&id)) {
            registry.unwatch(handle);
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// The agent these senses belong to.
    #[must_use]
    pub fn agent(&self) -> EntityId {
        self.agent
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &SenzConfig {
        &self.config
    }

    /// Runtime counters.
    #[must_use]
    pub fn stats(&self) -> SenseStats {
        self.stats
    }

    /// The selected target, if any.
    #[must_use]
    pub fn nearest(&self) -> Option<&SensedRecord> {
        self.nearest.and_then(|id| self.table.get(id))
    }

    /// Identity of the selected target, if any.
    #[must_use]
    pub fn nearest_id(&self) -> Option<EntityId> {
        self.nearest
    }

    /// Whether a target is currently selected.
    #[must_use]
    pub fn senses_something(&self) -> bool {
        self.nearest.is_some()
    }

    /// Remembered records, highest priority first; at most `capacity`.
    pub fn ranked(&self) -> impl Iterator<Item = &SensedRecord> + '_ {
        self.table.ranked()
    }

    /// Whether `id` is currently remembered.
    #[must_use]
    pub fn is_remembered(&self, id: EntityId) -> bool {
        self.table.contains(id)
    }

    /// The remembered record for `id`.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&SensedRecord> {
        self.table.get(id)
    }

    /// Entities the given sense detected on the last scan.
    #[must_use]
    pub fn sensed_by(&self, modality: Modality) -> &HashSet<EntityId> {
        self.table.sensed_by(modality)
    }

    /// The underlying memory table.
    #[must_use]
    pub fn memory(&self) -> &MemoryTable {
        &self.table
    }

    /// Time of the most recent scan.
    #[must_use]
    pub fn last_scan(&self) -> Option<SenseTime> {
        self.last_scan
    }

    /// Number of detectability watches this engine holds.
    #[must_use]
    pub fn pending_watches(&self) -> usize {
        self.watches.len()
    }

    // -----------------------------------------------------------------------
    // Subscriptions
    // -----------------------------------------------------------------------

    /// Listen for newly-sensed batches.
    pub fn on_newly_sensed(&mut self, handler: impl FnMut(&[SensedRecord]) + Send + 'static) -> Subscription {
        self.events.subscribe_newly_sensed(handler)
    }

    /// Listen for nearest-target changes.
    pub fn on_nearest_changed(&mut self, handler: impl FnMut(NearestChanged) + Send + 'static) -> Subscription {
        self.events.subscribe_nearest_changed(handler)
    }

    /// Listen for forgotten records.
    pub fn on_forgotten(&mut self, handler: impl FnMut(&SensedRecord) + Send + 'static) -> Subscription {
        self.events.subscribe_forgotten(handler)
    }

    /// Remove a subscription. Returns `false` if it was already removed.
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        self.events.unsubscribe(subscription)
    }
}
