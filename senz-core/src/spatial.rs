//! Broad-phase spatial queries.
//!
//! [`SpatialQuery`] is the contract the broad-phase candidate source needs:
//! "everything within `radius` of `origin` whose category matches `mask`".
//! [`SpatialGrid`] is a uniform hash grid implementing it; hosts with their
//! own physics or spatial tree implement the trait directly instead.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::types::{EntityId, Vec3};

/// Radius query over positioned, categorized entities.
pub trait SpatialQuery {
    /// Every entity within `radius` of `origin` sharing a bit with `mask`.
    fn query_within_radius(&self, origin: Vec3, radius: f32, mask: u32) -> Vec<(EntityId, Vec3)>;
}

impl<T: SpatialQuery + ?Sized> SpatialQuery for Arc<T> {
    fn query_within_radius(&self, origin: Vec3, radius: f32, mask: u32) -> Vec<(EntityId, Vec3)> {
        (**self).query_within_radius(origin, radius, mask)
    }
}

impl<T: SpatialQuery + ?Sized> SpatialQuery for Box<T> {
    fn query_within_radius(&self, origin: Vec3, radius: f32, mask: u32) -> Vec<(EntityId, Vec3)> {
        (**self).query_within_radius(origin, radius, mask)
    }
}

impl<T: SpatialQuery> SpatialQuery for RwLock<T> {
    fn query_within_radius(&self, origin: Vec3, radius: f32, mask: u32) -> Vec<(EntityId, Vec3)> {
        self.read().query_within_radius(origin, radius, mask)
    }
}

type Cell = (i32, i32, i32);

#[derive(Debug, Clone, Copy)]
struct GridEntry {
    position: Vec3,
    category: u32,
    cell: Cell,
}

/// Uniform hash grid over entity positions.
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f32,
    cells: HashMap<Cell, Vec<EntityId>>,
    entries: HashMap<EntityId, GridEntry>,
}

impl SpatialGrid {
    /// Create an empty grid. `cell_size` should be on the order of the
    /// typical query radius.
    #[must_use]
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: if cell_size > 0.0 { cell_size } else { 1.0 },
            cells: HashMap::new(),
            entries: HashMap::new(),
        }
    }

    /// Number of indexed entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the grid is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[allow(clippy::cast_possible_truncation)]
    fn cell_of(&self, p: Vec3) -> Cell {
        (
            (p.x / self.cell_size).floor() as i32,
            (p.y / self.cell_size).floor() as i32,
            (p.z / self.cell_size).floor() as i32,
        )
    }

    /// Insert or move an entity.
    pub fn insert(&mut self, id: EntityId, position: Vec3, category: u32) {
        self.remove(id);
        let cell = self.cell_of(position);
        self.cells.entry(cell).or_default().push(id);
        self.entries.insert(id, GridEntry { position, category, cell });
    }

    /// Move an already-indexed entity. Returns `false` if unknown.
    pub fn update(&mut self, id: EntityId, position: Vec3) -> bool {
        let Some(entry) = self.entries.get(&id).copied() else {
            return false;
        };
        let cell = self.cell_of(position);
        if cell == entry.cell {
            self.entries.insert(id, GridEntry { position, ..entry });
        } else {
            self.insert(id, position, entry.category);
        }
        true
    }

    /// Drop an entity. Returns `false` if unknown.
    pub fn remove(&mut self, id: EntityId) -> bool {
        let Some(entry) = self.entries.remove(&id) else {
            return false;
        };
        if let Some(bucket) = self.cells.get_mut(&entry.cell) {
            bucket.retain(|e| *e != id);
            if bucket.is_empty() {
                self.cells.remove(&entry.cell);
            }
        }
        true
    }
}

impl SpatialQuery for SpatialGrid {
    fn query_within_radius(&self, origin: Vec3, radius: f32, mask: u32) -> Vec<(EntityId, Vec3)> {
        let lo = self.cell_of(origin - Vec3::new(radius, radius, radius));
        let hi = self.cell_of(origin + Vec3::new(radius, radius, radius));
        let mut found = Vec::new();
        for x in lo.0..=hi.0 {
            for y in lo.1..=hi.1 {
                for z in lo.2..=hi.2 {
                    let Some(bucket) = self.cells.get(&(x, y, z)) else {
                        continue;
                    };
                    for id in bucket {
                        let Some(entry) = self.entries.get(id) else {
                            continue;
                        };
                        if entry.category & mask != 0 && entry.position.distance(origin) <= radius {
                            found.push((*id, entry.position));
                        }
                    }
                }
            }
        }
        found
    }
}
