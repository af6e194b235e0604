//! Nearest-target selection with a retention window.
//!
//! The nearest target is the highest-ranked record that is still *fresh*:
//! detected within the last `retain_nearest_secs`. When the current nearest
//! goes stale it is dropped to "none" for that evaluation, and a replacement
//! is only picked on the following evaluation. Stale records stay in the
//! ranking as memories but are never re-selected as nearest.

use crate::memory::MemoryTable;
use crate::record::SensedRecord;
use crate::types::{EntityId, SenseTime};

/// Outcome of one nearest-target evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NearestUpdate {
    /// Same target (or still none).
    Unchanged,
    /// A different target was selected.
    Changed {
        /// The previous target.
        old: Option<EntityId>,
        /// The new target.
        new: Option<EntityId>,
    },
    /// The previous target aged past the retention window.
    Expired {
        /// The target that expired.
        old: EntityId,
    },
}

impl NearestUpdate {
    /// The `(old, new)` pair to announce, if the selection changed.
    #[must_use]
    pub fn transition(self) -> Option<(Option<EntityId>, Option<EntityId>)> {
        match self {
            Self::Unchanged => None,
            Self::Changed { old, new } => Some((old, new)),
            Self::Expired { old } => Some((Some(old), None)),
        }
    }
}

/// How long a nearest target survives without re-detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetentionPolicy {
    window_secs: f64,
}

impl RetentionPolicy {
    /// Create a policy with the given retention window.
    #[must_use]
    pub fn new(window_secs: f64) -> Self {
        Self {
            window_secs: window_secs.max(0.0),
        }
    }

    /// The retention window in seconds.
    #[must_use]
    pub fn window_secs(&self) -> f64 {
        self.window_secs
    }

    /// Whether `record` has gone undetected for longer than the window.
    #[must_use]
    pub fn is_expired(&self, record: &SensedRecord, now: SenseTime) -> bool {
        record.age(now) > self.window_secs
    }

    /// The highest-ranked record that has not expired.
    #[must_use]
    pub fn select<'a>(&self, table: &'a MemoryTable, now: SenseTime) -> Option<&'a SensedRecord> {
        table.ranked().find(|r| !self.is_expired(r, now))
    }

    /// Evaluate the nearest target after a scan.
    ///
    /// An expired `current` yields [`NearestUpdate::Expired`] without
    /// promoting a successor; otherwise the best fresh record is selected.
    #[must_use]
    pub fn evaluate(&self, current: Option<EntityId>, table: &MemoryTable, now: SenseTime) -> NearestUpdate {
        let stale = current.filter(|id| table.get(*id).is_some_and(|r| self.is_expired(r, now)));
        if let Some(old) = stale {
            return NearestUpdate::Expired { old };
        }

        let new = self.select(table, now).map(|r| r.id);
        if new == current {
            NearestUpdate::Unchanged
        } else {
            NearestUpdate::Changed { old: current, new }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Vec3;

    fn at(secs: f64) -> SenseTime {
        SenseTime::from_secs(secs)
    }

    fn table_with(records: &[SensedRecord]) -> MemoryTable {
        let mut table = MemoryTable::new(10);
        for r in records {
            table.upsert(*r);
        }
        table.rerank();
        table
    }

    #[test]
    fn selects_best_fresh_record() {
        let near = SensedRecord::new(EntityId::new(), Vec3::ZERO, 1.0, at(0.0));
        let far = SensedRecord::new(EntityId::new(), Vec3::ZERO, 3.0, at(6.0));
        let table = table_with(&[near, far]);
        let policy = RetentionPolicy::new(5.0);

        assert_eq!(policy.select(&table, at(1.0)).map(|r| r.id), Some(near.id));
        // `near` is stale at t=6 but still ranked first.
        assert_eq!(table.ranked_ids()[0], near.id);
        assert_eq!(policy.select(&table, at(6.0)).map(|r| r.id), Some(far.id));
    }

    #[test]
    fn window_boundary_is_inclusive() {
        let r = SensedRecord::new(EntityId::new(), Vec3::ZERO, 1.0, at(0.0));
        let policy = RetentionPolicy::new(5.0);
        assert!(!policy.is_expired(&r, at(5.0)));
        assert!(policy.is_expired(&r, at(5.001)));
    }

    #[test]
    fn expiry_reports_none_without_promotion() {
        let near = SensedRecord::new(EntityId::new(), Vec3::ZERO, 1.0, at(0.0));
        let far = SensedRecord::new(EntityId::new(), Vec3::ZERO, 3.0, at(6.0));
        let table = table_with(&[near, far]);
        let policy = RetentionPolicy::new(5.0);

        let update = policy.evaluate(Some(near.id), &table, at(6.0));
        assert_eq!(update, NearestUpdate::Expired { old: near.id });
        assert_eq!(update.transition(), Some((Some(near.id), None)));

        // Next evaluation, starting from none, promotes the fresh record.
        let update = policy.evaluate(None, &table, at(6.0));
        assert_eq!(update, NearestUpdate::Changed { old: None, new: Some(far.id) });
    }

    #[test]
    fn unchanged_when_same_target() {
        let r = SensedRecord::new(EntityId::new(), Vec3::ZERO, 1.0, at(0.0));
        let table = table_with(&[r]);
        let policy = RetentionPolicy::new(5.0);
        assert_eq!(policy.evaluate(Some(r.id), &table, at(1.0)), NearestUpdate::Unchanged);
        assert_eq!(policy.evaluate(None, &MemoryTable::new(3), at(1.0)), NearestUpdate::Unchanged);
    }

    #[test]
    fn closer_target_takes_over() {
        let old = SensedRecord::new(EntityId::new(), Vec3::ZERO, 4.0, at(1.0));
        let closer = SensedRecord::new(EntityId::new(), Vec3::ZERO, 2.0, at(1.0));
        let table = table_with(&[old, closer]);
        let policy = RetentionPolicy::new(5.0);
        assert_eq!(
            policy.evaluate(Some(old.id), &table, at(1.0)),
            NearestUpdate::Changed { old: Some(old.id), new: Some(closer.id) }
        );
    }

    #[test]
    fn vanished_target_is_replaced() {
        let r = SensedRecord::new(EntityId::new(), Vec3::ZERO, 1.0, at(0.0));
        let table = table_with(&[r]);
        let ghost = EntityId::new();
        let policy = RetentionPolicy::new(5.0);
        assert_eq!(
            policy.evaluate(Some(ghost), &table, at(1.0)),
            NearestUpdate::Changed { old: Some(ghost), new: Some(r.id) }
        );
    }
}
