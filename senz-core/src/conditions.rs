//! Read-only checks for decision logic.
//!
//! Behaviour trees and planners query an agent's senses through these
//! helpers rather than poking at the memory table.

use serde::{Deserialize, Serialize};

use crate::engine::SenseEngine;
use crate::types::{EntityId, Vec3};

/// The selected target as a decision node sees it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetSnapshot {
    /// The target entity.
    pub id: EntityId,
    /// Where the agent believes the target is.
    pub sensed_position: Vec3,
    /// Where the target actually was at last detection.
    pub actual_position: Vec3,
}

/// Whether the agent currently has a target.
#[must_use]
pub fn senses_something(engine: &SenseEngine) -> bool {
    engine.senses_something()
}

/// Whether the selected target is within `max_distance` of `agent_position`.
///
/// Measured against the *sensed* position, so a smelled target may be judged
/// near or far depending on scent noise.
#[must_use]
pub fn near_sensed_target(engine: &SenseEngine, agent_position: Vec3, max_distance: f32) -> bool {
    engine
        .nearest()
        .is_some_and(|r| r.sensed_position.distance(agent_position) <= max_distance)
}

/// Snapshot of the selected target, if any.
#[must_use]
pub fn target_snapshot(engine: &SenseEngine) -> Option<TargetSnapshot> {
    engine.nearest().map(|r| TargetSnapshot {
        id: r.id,
        sensed_position: r.sensed_position,
        actual_position: r.actual_position,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::RegistryScanSource;
    use crate::config::SenzConfig;
    use crate::engine::TickContext;
    use crate::registry::DetectableRegistry;
    use crate::types::{Pose, SenseTime};

    fn engine_with(registry: &DetectableRegistry) -> SenseEngine {
        let mut config = SenzConfig::default();
        config.scan.rng_seed = Some(1);
        let mut engine =
            SenseEngine::new(EntityId::new(), config, RegistryScanSource::new(registry.clone())).expect("valid config");
        engine.initialize();
        engine
    }

    #[test]
    fn nothing_sensed_in_empty_world() {
        let engine = engine_with(&DetectableRegistry::new());
        assert!(!senses_something(&engine));
        assert!(!near_sensed_target(&engine, Vec3::ZERO, 1000.0));
        assert!(target_snapshot(&engine).is_none());
    }

    #[test]
    fn reports_seen_target() {
        let registry = DetectableRegistry::new();
        let target = EntityId::new();
        registry.add(target, Vec3::new(0.0, 0.0, 30.0));
        let mut engine = engine_with(&registry);
        engine.tick(&TickContext::new(SenseTime::from_secs(0.0), Pose::default()));

        assert!(senses_something(&engine));
        assert!(near_sensed_target(&engine, Vec3::ZERO, 30.0));
        assert!(!near_sensed_target(&engine, Vec3::ZERO, 29.0));
        let snapshot = target_snapshot(&engine).expect("target selected");
        assert_eq!(snapshot.id, target);
        assert_eq!(snapshot.sensed_position, snapshot.actual_position);
    }
}
