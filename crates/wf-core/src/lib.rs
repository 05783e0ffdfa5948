//! Core types for Wayfarer: geometry, identifiers, configuration, and regions.
//!
//! This crate holds everything the simulation is parameterized by. It has no
//! simulation state of its own; `wf-simulation` builds on these types.

/// Bounded scalar types.
pub mod bounded;
/// Typed, validated simulation tunables.
pub mod config;
/// Error types used throughout the crate.
pub mod error;
/// 3D position and vector math.
pub mod geometry;
/// Validated identifier types.
pub mod id;
/// Closed enumerations shared by config and simulation.
pub mod kind;
/// Static region metadata.
pub mod region;

/// Re-export the bounded scalar.
pub use bounded::UnitInterval;
/// Re-export configuration types.
pub use config::{
    GlobalConfig, HazardConfig, LawConfig, SimulationConfig, SpeciesConfig, TrafficConfig,
    ValueRange, WeatherConfig, WildlifeConfig,
};
/// Re-export error types.
pub use error::{CoreError, CoreResult};
/// Re-export geometry.
pub use geometry::Vec3;
/// Re-export identifier types.
pub use id::{
    BiomeId, CreatureId, CrimeId, EventId, FactionId, HazardId, RegionId, RouteId, SectorId,
    ShipId, SpeciesId,
};
/// Re-export closed enumerations.
pub use kind::{CrimeType, ShipType, WeatherState};
/// Re-export region types.
pub use region::{Region, RegionCatalog};
