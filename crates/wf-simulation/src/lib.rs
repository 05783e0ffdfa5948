//! Tick-based world-state simulation for Wayfarer.
//!
//! A [`SimulationLoop`] owns four subsystems (weather, wildlife, traffic, and
//! law), advances them in bounded sub-ticks, and publishes what happened on an
//! [`EventBus`]. The host supplies a [`GameStateView`] each tick; everything
//! else is simulation state that can be saved and restored through
//! [`SimulationSnapshot`].

/// Bounded pub/sub event bus.
pub mod bus;
/// Simulated and wall-clock time.
pub mod clock;
/// Host-facing game state and per-tick context.
pub mod context;
/// Error types for the simulation crate.
pub mod error;
/// Event types and records.
pub mod event;
/// Crime, suspicion, investigations, pursuits, and bounties.
pub mod law;
/// Cross-system event rules.
pub mod rules;
/// Top-level simulation orchestrator.
pub mod simulation;
/// Versioned save format.
pub mod snapshot;
/// The trait all subsystems implement.
pub mod system;
/// Ships, routes, and congestion.
pub mod traffic;
/// Per-sector weather and hazards.
pub mod weather;
/// Creature populations and predator/prey behavior.
pub mod wildlife;

/// Re-exports of the event bus types.
pub use bus::{EventBus, EventBusSnapshot, SubscriptionId};
/// Re-exports of the clock types.
pub use clock::{ManualWallClock, SimClock, SystemWallClock, WallClock};
/// Re-exports of the game-state types.
pub use context::{GameState, GameStateView, PlayerState, TickContext};
/// Re-exports of [`error::SimError`] and [`error::SimResult`].
pub use error::{SimError, SimResult};
/// Re-exports of the event types.
pub use event::{
    EventOrigin, EventRecord, RawEventRecord, UnknownEventType, WorldEvent, WorldEventType,
};
/// Re-exports of the law types.
pub use law::{
    Bounty, Crime, EscalationLevel, Investigation, LawSnapshot, LawSystem, Pursuit, WitnessReport,
};
/// Re-exports of the coordinator.
pub use simulation::{MAX_SUB_TICKS, OBSERVER_POSITION_PLACEHOLDER, SimulationLoop};
/// Re-exports of the save format.
pub use snapshot::{SNAPSHOT_VERSION, SimulationSnapshot};
/// Re-export of [`system::Subsystem`].
pub use system::Subsystem;
/// Re-exports of the traffic types.
pub use traffic::{PatrolRoute, ShipTraffic, TradeRoute, TrafficSnapshot, TrafficSystem};
/// Re-exports of the weather types.
pub use weather::{WeatherCondition, WeatherHazard, WeatherSnapshot, WeatherSystem};
/// Re-exports of the wildlife types.
pub use wildlife::{Behavior, Creature, SpeciesPopulation, WildlifeSnapshot, WildlifeSystem};
