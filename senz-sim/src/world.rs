//! The simulated world.
//!
//! Owns the [`DetectableRegistry`] and the broad-phase [`SpatialGrid`] and
//! keeps them consistent: every spawn, move and retirement goes through
//! here so both acquisition strategies see the same world.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use senz_core::acquisition::ToggleSource;
use senz_core::config::ScanConfig;
use senz_core::registry::DetectableRegistry;
use senz_core::spatial::SpatialGrid;
use senz_core::types::{EntityId, Vec3};

/// Registry plus spatial index for one simulation.
#[derive(Debug, Clone)]
pub struct SimWorld {
    registry: DetectableRegistry,
    grid: Arc<RwLock<SpatialGrid>>,
}

impl SimWorld {
    /// Create an empty world with the given grid cell size.
    #[must_use]
    pub fn new(cell_size: f32) -> Self {
        Self {
            registry: DetectableRegistry::new(),
            grid: Arc::new(RwLock::new(SpatialGrid::new(cell_size))),
        }
    }

    /// The shared registry.
    #[must_use]
    pub fn registry(&self) -> &DetectableRegistry {
        &self.registry
    }

    /// The shared broad-phase grid.
    #[must_use]
    pub fn grid(&self) -> Arc<RwLock<SpatialGrid>> {
        Arc::clone(&self.grid)
    }

    /// Spawn a detectable entity in every category.
    pub fn spawn(&self, position: Vec3) -> EntityId {
        self.spawn_with_category(position, u32::MAX)
    }

    /// Spawn a detectable entity with explicit category bits.
    pub fn spawn_with_category(&self, position: Vec3, category: u32) -> EntityId {
        let id = EntityId::new();
        self.insert(id, position, category);
        id
    }

    /// Register an entity whose identity is chosen by the caller.
    pub fn insert(&self, id: EntityId, position: Vec3, category: u32) {
        self.registry.add_with_category(id, position, category);
        self.grid.write().insert(id, position, category);
        debug!(entity = %id, %position, "Spawned");
    }

    /// Move an entity. Returns `false` if unknown.
    pub fn move_to(&self, id: EntityId, position: Vec3) -> bool {
        let known = self.registry.set_position(id, position);
        if known {
            self.grid.write().update(id, position);
        }
        known
    }

    /// Current position of an entity.
    #[must_use]
    pub fn position(&self, id: EntityId) -> Option<Vec3> {
        self.registry.get(id).map(|e| e.position)
    }

    /// Hide or reveal an entity from senses.
    pub fn set_sensable(&self, id: EntityId, sensable: bool) -> bool {
        self.registry.set_sensable(id, sensable)
    }

    /// Make an entity undetectable, then remove it from the world.
    pub fn retire(&self, id: EntityId) -> bool {
        self.grid.write().remove(id);
        let removed = self.registry.retire(id);
        if removed {
            debug!(entity = %id, "Retired");
        }
        removed
    }

    /// Number of entities in the world.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Whether the world is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Candidate source for an agent, honoring the configured acquisition mode.
    #[must_use]
    pub fn candidate_source(&self, scan: &ScanConfig) -> ToggleSource {
        ToggleSource::from_config(scan, self.registry.clone(), Some(Box::new(self.grid())))
    }
}
