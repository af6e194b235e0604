//! Candidate acquisition strategies.
//!
//! A [`CandidateSource`] produces this scan's candidates around the agent;
//! the engine applies self-exclusion and the validity predicate on top, so
//! classification, ranking and retention are identical whichever strategy
//! is plugged in.
//!
//! - [`BroadPhaseSource`]: radius query against a [`SpatialQuery`] backend,
//!   optionally checked against a registry so hidden entities are skipped
//! - [`RegistryScanSource`]: linear scan of the [`DetectableRegistry`]
//! - [`ToggleSource`]: picks one of the two from [`AcquisitionMode`], falling
//!   back to the registry when no spatial backend is attached

use crate::classify::Candidate;
use crate::config::{AcquisitionMode, ScanConfig};
use crate::registry::DetectableRegistry;
use crate::spatial::SpatialQuery;
use crate::types::{EntityId, Vec3};

/// Parameters of one acquisition pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcquisitionQuery {
    /// Where the agent is.
    pub origin: Vec3,
    /// Farthest reach of any sense.
    pub radius: f32,
    /// Category bits a candidate must share.
    pub mask: u32,
}

/// Produces the candidates inside an agent's sensing radius.
pub trait CandidateSource {
    /// Every candidate within `query.radius` of `query.origin`, with distances.
    fn acquire(&self, query: &AcquisitionQuery) -> Vec<Candidate>;
}

impl<T: CandidateSource + ?Sized> CandidateSource for Box<T> {
    fn acquire(&self, query: &AcquisitionQuery) -> Vec<Candidate> {
        (**self).acquire(query)
    }
}

/// Radius query against a spatial backend.
///
/// The backend knows positions only. Without a registry attached, an entity
/// marked unsensable is still returned as long as the backend holds it; use
/// [`BroadPhaseSource::with_registry`] when the two can disagree.
#[derive(Debug, Clone)]
pub struct BroadPhaseSource<Q> {
    backend: Q,
    registry: Option<DetectableRegistry>,
}

impl<Q: SpatialQuery> BroadPhaseSource<Q> {
    /// Wrap a spatial backend.
    pub fn new(backend: Q) -> Self {
        Self { backend, registry: None }
    }

    /// Skip hits the registry knows to be unsensable. Entities the registry
    /// has never heard of pass through.
    #[must_use]
    pub fn with_registry(mut self, registry: DetectableRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    fn is_sensable(&self, id: EntityId) -> bool {
        self.registry
            .as_ref()
            .is_none_or(|registry| registry.get(id).is_none_or(|e| e.sensable))
    }
}

impl<Q: SpatialQuery> CandidateSource for BroadPhaseSource<Q> {
    fn acquire(&self, query: &AcquisitionQuery) -> Vec<Candidate> {
        self.backend
            .query_within_radius(query.origin, query.radius, query.mask)
            .into_iter()
            .filter(|(id, _)| self.is_sensable(*id))
            .map(|(id, position)| Candidate::measured(id, position, query.origin))
            .filter(|c| c.distance <= query.radius)
            .collect()
    }
}

/// Linear scan over every registered, sensable entity.
#[derive(Debug, Clone)]
pub struct RegistryScanSource {
    registry: DetectableRegistry,
}

impl RegistryScanSource {
    /// Scan the given registry.
    #[must_use]
    pub fn new(registry: DetectableRegistry) -> Self {
        Self { registry }
    }
}

impl CandidateSource for RegistryScanSource {
    fn acquire(&self, query: &AcquisitionQuery) -> Vec<Candidate> {
        self.registry
            .list()
            .into_iter()
            .filter(|e| e.category & query.mask != 0)
            .map(|e| Candidate::measured(e.id, e.position, query.origin))
            .filter(|c| c.distance <= query.radius)
            .collect()
    }
}

/// Mode-switchable source: broad-phase when available, registry otherwise.
pub struct ToggleSource {
    mode: AcquisitionMode,
    broad_phase: Option<BroadPhaseSource<Box<dyn SpatialQuery + Send + Sync>>>,
    registry: RegistryScanSource,
}

impl std::fmt::Debug for ToggleSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToggleSource")
            .field("mode", &self.mode)
            .field("broad_phase", &self.broad_phase.is_some())
            .finish_non_exhaustive()
    }
}

impl ToggleSource {
    /// Build from the scan configuration.
    #[must_use]
    pub fn from_config(
        scan: &ScanConfig,
        registry: DetectableRegistry,
        broad_phase: Option<Box<dyn SpatialQuery + Send + Sync>>,
    ) -> Self {
        Self {
            mode: scan.acquisition,
            broad_phase: broad_phase.map(|backend| BroadPhaseSource::new(backend).with_registry(registry.clone())),
            registry: RegistryScanSource::new(registry),
        }
    }

    /// Configured mode.
    #[must_use]
    pub fn mode(&self) -> AcquisitionMode {
        self.mode
    }

    /// Switch strategy at runtime.
    pub fn set_mode(&mut self, mode: AcquisitionMode) {
        self.mode = mode;
    }

    /// The strategy a scan would actually use right now.
    #[must_use]
    pub fn effective_mode(&self) -> AcquisitionMode {
        match (self.mode, &self.broad_phase) {
            (AcquisitionMode::BroadPhase, Some(_)) => AcquisitionMode::BroadPhase,
            _ => AcquisitionMode::Registry,
        }
    }
}

impl CandidateSource for ToggleSource {
    fn acquire(&self, query: &AcquisitionQuery) -> Vec<Candidate> {
        match (self.mode, &self.broad_phase) {
            (AcquisitionMode::BroadPhase, Some(broad_phase)) => broad_phase.acquire(query),
            _ => self.registry.acquire(query),
        }
    }
}
