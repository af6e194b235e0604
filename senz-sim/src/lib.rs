//! # senz-sim: Headless Host for SENZ
//!
//! This crate provides the host side that `senz-core` deliberately leaves
//! out: a world that keeps the detectable registry and the broad-phase grid
//! in sync, per-agent components, a fixed-step scheduler, and tracing setup.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │                senz-sim                  │
//! │  ┌──────────┐ ┌────────────┐ ┌─────────┐ │
//! │  │  World   │ │ Components │ │ Systems │ │
//! │  └────┬─────┘ └─────┬──────┘ └────┬────┘ │
//! │       │             │             │      │
//! │       ▼             ▼             ▼      │
//! │  ┌────────────────────────────────────┐  │
//! │  │             senz-core              │  │
//! │  └────────────────────────────────────┘  │
//! └──────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `config`: host tuning on top of `senz_core::config::SenzConfig`
//! - `world`: registry + spatial grid, kept consistent on every move
//! - `components`: the per-agent sense component
//! - `systems`: the scheduler that ticks every agent, and JSON reports
//! - `telemetry`: `tracing-subscriber` installation

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod components;
pub mod config;
pub mod systems;
pub mod telemetry;
pub mod world;

pub use components::SenseComponent;
pub use config::SimConfig;
pub use systems::{SenseScheduler, SimReport};
pub use world::SimWorld;
