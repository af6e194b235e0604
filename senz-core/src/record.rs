//! Sensed records and the priority ordering between them.
//!
//! A [`SensedRecord`] is what an agent remembers about one entity. Records
//! are ranked by [`priority_cmp`]:
//!
//! 1. same identity → `Equal`
//! 2. nearer first
//! 3. more recently detected first
//! 4. by sense accuracy: implicit, sight, hearing, smell (`true` first)
//! 5. identity ordinal
//!
//! The last step makes the ordering strict: two distinct entities never
//! compare `Equal`, so a sorted ranking has exactly one slot per record.

use std::cmp::Ordering;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::types::{EntityId, SenseTime, Vec3};

/// The detection channels a record can be tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Modality {
    /// Inside the vision cone and range.
    Sight,
    /// Within hearing range.
    Hearing,
    /// Within scent range.
    Smell,
    /// Close enough to be noticed without any particular sense.
    Implicit,
}

impl std::fmt::Display for Modality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sight => write!(f, "Sight"),
            Self::Hearing => write!(f, "Hearing"),
            Self::Smell => write!(f, "Smell"),
            Self::Implicit => write!(f, "Implicit"),
        }
    }
}

/// What an agent remembers about a single sensed entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensedRecord {
    /// The sensed entity.
    pub id: EntityId,
    /// Best-known position, refined by the most accurate sense that fired.
    pub sensed_position: Vec3,
    /// Ground-truth position at the last update; used to detect movement.
    pub actual_position: Vec3,
    /// Distance from the agent at the last update.
    pub distance: f32,
    /// Seen this scan.
    pub seen: bool,
    /// Heard this scan.
    pub heard: bool,
    /// Smelled this scan.
    pub smelled: bool,
    /// Noticed by proximity this scan.
    pub implicitly_detected: bool,
    /// When the record was last updated by a detection.
    pub last_detection: SenseTime,
}

impl SensedRecord {
    /// A fresh record for a first detection at `position`.
    #[must_use]
    pub fn new(id: EntityId, position: Vec3, distance: f32, now: SenseTime) -> Self {
        Self {
            id,
            sensed_position: position,
            actual_position: position,
            distance,
            seen: false,
            heard: false,
            smelled: false,
            implicitly_detected: false,
            last_detection: now,
        }
    }

    /// Whether any sense fired for this record on its last update.
    #[must_use]
    pub fn is_sensed(&self) -> bool {
        self.seen || self.heard || self.smelled || self.implicitly_detected
    }

    /// Whether the given channel fired on the last update.
    #[must_use]
    pub fn has(&self, modality: Modality) -> bool {
        match modality {
            Modality::Sight => self.seen,
            Modality::Hearing => self.heard,
            Modality::Smell => self.smelled,
            Modality::Implicit => self.implicitly_detected,
        }
    }

    /// Channels that fired on the last update, most accurate first.
    #[must_use]
    pub fn modalities(&self) -> Vec<Modality> {
        [Modality::Implicit, Modality::Sight, Modality::Hearing, Modality::Smell]
            .into_iter()
            .filter(|m| self.has(*m))
            .collect()
    }

    /// Reset every sense flag ahead of a new scan.
    pub fn clear_senses(&mut self) {
        self.seen = false;
        self.heard = false;
        self.smelled = false;
        self.implicitly_detected = false;
    }

    /// Seconds since the last detection.
    #[must_use]
    pub fn age(&self, now: SenseTime) -> f64 {
        now.seconds_since(self.last_detection)
    }

    /// `true` when `self` ranks strictly ahead of `other`.
    #[must_use]
    pub fn outranks(&self, other: &Self) -> bool {
        priority_cmp(self, other) == Ordering::Less
    }
}

/// `true` sorts before `false`.
fn prefer_true(a: bool, b: bool) -> Ordering {
    b.cmp(&a)
}

/// Total priority order between two records; `Less` means `a` ranks higher.
#[must_use]
pub fn priority_cmp(a: &SensedRecord, b: &SensedRecord) -> Ordering {
    if a.id == b.id {
        return Ordering::Equal;
    }

    OrderedFloat(a.distance)
        .cmp(&OrderedFloat(b.distance))
        // An older memory loses to a fresher detection at the same distance.
        .then_with(|| b.last_detection.key().cmp(&a.last_detection.key()))
        .then_with(|| prefer_true(a.implicitly_detected, b.implicitly_detected))
        .then_with(|| prefer_true(a.seen, b.seen))
        .then_with(|| prefer_true(a.heard, b.heard))
        .then_with(|| prefer_true(a.smelled, b.smelled))
        .then_with(|| a.id.cmp(&b.id))
}
