//! Systems for the SENZ simulator.
//!
//! [`SenseScheduler`] is the external driver the engine expects: it owns
//! the simulation clock and ticks every active agent once per frame.
//!
//! ## Frame Budget
//!
//! | System        | Budget   | Frequency                         |
//! |---------------|----------|-----------------------------------|
//! | Pose sync     | 0.01ms   | Every frame                       |
//! | Sense scan    | 0.1ms    | Every `scan.interval` frames      |
//! | Forget inbox  | 0.01ms   | Every frame                       |

use serde::Serialize;
use tracing::{info, trace};

use senz_core::conditions::{self, TargetSnapshot};
use senz_core::engine::TickContext;
use senz_core::types::{EntityId, SenseStats, SenseTime, Vec3};

use crate::components::SenseComponent;
use crate::world::SimWorld;

/// Fixed-step clock that drives every agent's senses.
#[derive(Debug, Clone)]
pub struct SenseScheduler {
    tick_secs: f64,
    frame: u64,
}

impl SenseScheduler {
    /// Create a scheduler advancing `tick_secs` per frame.
    #[must_use]
    pub fn new(tick_secs: f64) -> Self {
        Self { tick_secs, frame: 0 }
    }

    /// Frames run so far.
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Simulation time of the next frame.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn now(&self) -> SenseTime {
        SenseTime::from_secs(self.frame as f64 * self.tick_secs)
    }

    /// Run one frame: sync each active agent's pose from the world, then tick it.
    ///
    /// Returns how many agents ran a full scan.
    pub fn step(&mut self, world: &SimWorld, agents: &mut [SenseComponent]) -> usize {
        let now = self.now();
        let mut scans = 0;
        for agent in agents.iter_mut().filter(|a| a.active) {
            if let Some(position) = world.position(agent.id()) {
                agent.pose.position = position;
            }
            if agent.engine.tick(&TickContext::new(now, agent.pose)) {
                scans += 1;
            }
        }
        trace!(frame = self.frame, %now, scans, "Frame complete");
        self.frame += 1;
        scans
    }

    /// Run `frames` frames, calling `before_frame` ahead of each one.
    pub fn run(
        &mut self,
        world: &SimWorld,
        agents: &mut [SenseComponent],
        frames: u64,
        mut before_frame: impl FnMut(SenseTime, &SimWorld),
    ) {
        for _ in 0..frames {
            before_frame(self.now(), world);
            self.step(world, agents);
        }
    }

    /// Stop every agent's senses and release their detectability watches.
    pub fn shutdown(&self, agents: &mut [SenseComponent]) {
        for agent in agents.iter_mut() {
            agent.engine.shutdown();
            agent.active = false;
        }
        info!(agents = agents.len(), frame = self.frame, "Scheduler shut down");
    }

    /// Snapshot of every agent's perception state.
    #[must_use]
    pub fn report(&self, agents: &[SenseComponent]) -> SimReport {
        SimReport {
            frame: self.frame,
            time_secs: self.now().secs(),
            agents: agents.iter().map(AgentReport::from_component).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Perception state of one agent.
#[derive(Debug, Clone, Serialize)]
pub struct AgentReport {
    /// The agent.
    pub agent: EntityId,
    /// Where it is.
    pub position: Vec3,
    /// Its selected target.
    pub nearest: Option<TargetSnapshot>,
    /// Remembered entities, highest priority first.
    pub ranked: Vec<EntityId>,
    /// Runtime counters.
    pub stats: SenseStats,
}

impl AgentReport {
    fn from_component(agent: &SenseComponent) -> Self {
        Self {
            agent: agent.id(),
            position: agent.pose.position,
            nearest: conditions::target_snapshot(&agent.engine),
            ranked: agent.engine.ranked().map(|r| r.id).collect(),
            stats: agent.stats(),
        }
    }
}

/// Perception state of every agent at one frame.
#[derive(Debug, Clone, Serialize)]
pub struct SimReport {
    /// Frames run so far.
    pub frame: u64,
    /// Simulation time in seconds.
    pub time_secs: f64,
    /// One entry per agent.
    pub agents: Vec<AgentReport>,
}

impl SimReport {
    /// Pretty-printed JSON.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
