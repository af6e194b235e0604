//! # SENZ Core Library
//!
//! Game-agnostic perception for characters. Every agent gets a
//! [`SenseEngine`] that periodically scans its surroundings and remembers
//! what it found:
//!
//! - **Sight**: inside the vision range and field-of-view cone, exact position
//! - **Hearing**: inside the hearing range, position blurred by sound noise
//! - **Smell**: inside the scent range, position blurred by scent noise
//! - **Implicit**: within arm's reach, exact position, regardless of facing
//!
//! Detected entities go into a bounded memory table ranked by
//! [`priority_cmp`]. The best record that is still fresh becomes the agent's
//! nearest target; a target that goes undetected for longer than the
//! retention window is dropped. Subscribers are told about newly-sensed
//! entities, nearest-target changes and forgotten records.
//!
//! ## Performance Contract
//!
//! - Scan of 200 candidates: < 100μs
//! - Rerank of a full table (capacity 10): < 5μs
//! - No allocation on ticks skipped by the scan interval

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod acquisition;
pub mod classify;
pub mod conditions;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod memory;
pub mod record;
pub mod registry;
pub mod retention;
pub mod spatial;
pub mod types;

pub use acquisition::{BroadPhaseSource, CandidateSource, RegistryScanSource, ToggleSource};
pub use config::SenzConfig;
pub use engine::{SenseEngine, TickContext};
pub use error::SenzError;
pub use events::{NearestChanged, Subscription};
pub use record::{Modality, SensedRecord, priority_cmp};
pub use registry::{DetectableRegistry, ForgetInbox};
pub use spatial::{SpatialGrid, SpatialQuery};
pub use types::*;
