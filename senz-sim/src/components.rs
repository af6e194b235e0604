//! Per-agent components for the SENZ simulator.
//!
//! A [`SenseComponent`] is attached to every agent that perceives the
//! world. The agent itself is also registered in the world, so agents can
//! sense one another.

use senz_core::config::SenzConfig;
use senz_core::engine::SenseEngine;
use senz_core::error::Result;
use senz_core::types::{EntityId, Pose, SenseStats};

use crate::world::SimWorld;

/// Sense engine plus the agent's current pose.
#[derive(Debug)]
pub struct SenseComponent {
    /// The agent's perception engine.
    pub engine: SenseEngine,
    /// Where the agent is and which way it faces.
    pub pose: Pose,
    /// Whether the scheduler should tick this agent.
    pub active: bool,
}

impl SenseComponent {
    /// Spawn an agent into `world` and give it initialized senses.
    ///
    /// # Errors
    /// Returns `SenzError::InvalidConfig` if `config` is out of range.
    pub fn spawn(world: &SimWorld, config: &SenzConfig, pose: Pose) -> Result<Self> {
        let id = world.spawn(pose.position);
        let source = world.candidate_source(&config.scan);
        let mut engine = SenseEngine::new(id, config.clone(), source)?.with_detectability(world.registry().clone());
        engine.initialize();
        Ok(Self {
            engine,
            pose,
            active: true,
        })
    }

    /// The agent's entity id.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.engine.agent()
    }

    /// Turn to face `forward`.
    pub fn face(&mut self, forward: senz_core::types::Vec3) {
        self.pose.forward = forward;
    }

    /// Runtime statistics.
    #[must_use]
    pub fn stats(&self) -> SenseStats {
        self.engine.stats()
    }
}
