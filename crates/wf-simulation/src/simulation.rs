use std::collections::BTreeSet;

use chrono::Utc;
use wf_core::{RegionCatalog, RegionId, RouteId, SimulationConfig, Vec3};

use crate::bus::EventBus;
use crate::clock::{SimClock, SystemWallClock, WallClock};
use crate::context::{GameStateView, TickContext};
use crate::error::{SimError, SimResult};
use crate::event::{EventRecord, WorldEvent};
use crate::law::LawSystem;
use crate::rules;
use crate::snapshot::{SNAPSHOT_VERSION, SimulationSnapshot};
use crate::system::Subsystem;
use crate::traffic::{PatrolRoute, TrafficSystem};
use crate::weather::WeatherSystem;
use crate::wildlife::WildlifeSystem;

/// Where the observer is assumed to be for spawning, culling, avoidance and scans.
// TODO: take the observer position from GameStateView once the host exposes
// spatial coordinates for the player.
pub const OBSERVER_POSITION_PLACEHOLDER: Vec3 = Vec3::ZERO;

/// Most sub-ticks a single [`SimulationLoop::advance`] call may run.
pub const MAX_SUB_TICKS: u64 = 1_000_000;

/// The top-level simulation orchestrator.
///
/// Owns the clock, the event bus, and the four subsystems. Each call to
/// [`SimulationLoop::advance`] is split into bounded sub-ticks; within a
/// sub-tick the subsystems run in the order weather, wildlife, traffic, law,
/// their events are published, and the cross-system rules are evaluated.
pub struct SimulationLoop {
    config: SimulationConfig,
    regions: RegionCatalog,
    clock: SimClock,
    wall_clock: Box<dyn WallClock>,
    weather: WeatherSystem,
    wildlife: WildlifeSystem,
    traffic: TrafficSystem,
    law: LawSystem,
    bus: EventBus,
    initialized_regions: BTreeSet<RegionId>,
}

impl std::fmt::Debug for SimulationLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationLoop")
            .field("tick", &self.clock.tick())
            .field("elapsed_hours", &self.clock.elapsed_hours())
            .field("regions", &self.initialized_regions)
            .field("events", &self.bus.len())
            .finish()
    }
}

impl SimulationLoop {
    /// Create a simulation from validated configuration and a region catalog.
    pub fn new(config: SimulationConfig, regions: RegionCatalog) -> SimResult<Self> {
        config.validate()?;
        let seed = config.global.seed;
        Ok(Self {
            clock: SimClock::new(),
            wall_clock: Box::new(SystemWallClock::new()),
            weather: WeatherSystem::new(config.weather.clone(), seed),
            wildlife: WildlifeSystem::new(config.wildlife.clone(), seed),
            traffic: TrafficSystem::new(config.traffic.clone(), seed),
            law: LawSystem::new(config.law.clone(), seed),
            bus: EventBus::new(config.global.max_history),
            initialized_regions: BTreeSet::new(),
            config,
            regions,
        })
    }

    /// Replace the wall clock used by [`SimulationLoop::tick`].
    pub fn with_wall_clock(mut self, clock: impl WallClock + 'static) -> Self {
        self.wall_clock = Box::new(clock);
        self
    }

    /// Advance by the real time elapsed since the previous call, scaled by
    /// `time_scale` into simulated hours.
    pub fn tick(&mut self, state: &dyn GameStateView) -> SimResult<Vec<WorldEvent>> {
        let seconds = self.wall_clock.elapsed_seconds();
        self.advance(seconds * self.config.global.time_scale, state)
    }

    /// Advance by `hours` of simulated time.
    ///
    /// Deltas larger than `max_tick_hours` run as a sequence of equal
    /// sub-ticks, so one large skip produces the same events as many small
    /// calls covering the same span. A delta needing more than
    /// [`MAX_SUB_TICKS`] sub-ticks is rejected.
    pub fn advance(&mut self, hours: f64, state: &dyn GameStateView) -> SimResult<Vec<WorldEvent>> {
        if !hours.is_finite() || hours < 0.0 {
            return Err(SimError::InvalidDelta(hours));
        }
        if hours <= 0.0 {
            return Ok(Vec::new());
        }

        let steps = (hours / self.config.global.max_tick_hours).ceil().max(1.0);
        if steps > MAX_SUB_TICKS as f64 {
            return Err(SimError::InvalidDelta(hours));
        }
        let steps = steps as u64;
        let step = hours / steps as f64;
        if steps > 1 {
            tracing::debug!(hours, steps, step, "splitting delta into sub-ticks");
        }

        let mut published = Vec::new();
        for _ in 0..steps {
            published.extend(self.sub_tick(step, state));
        }
        Ok(published)
    }

    fn sub_tick(&mut self, delta_hours: f64, state: &dyn GameStateView) -> Vec<WorldEvent> {
        self.clock.advance(delta_hours);
        self.bus.set_time(self.clock.elapsed_hours());
        let ctx = TickContext {
            delta_hours,
            sector: state.sector(),
            biome: state.biome(),
            observer: OBSERVER_POSITION_PLACEHOLDER,
            player: state.player(),
        };

        let systems: [&mut dyn Subsystem; 4] = [
            &mut self.weather,
            &mut self.wildlife,
            &mut self.traffic,
            &mut self.law,
        ];
        let records = update_all(systems, &ctx);
        let produced = records.len();

        let mut published = self.bus.publish_records(records);
        if self.config.global.cross_system_events {
            let synthesized = rules::synthesize(&published, ctx.sector);
            published.extend(self.bus.publish_records(synthesized));
        }
        if self.config.global.debug {
            tracing::info!(
                tick = self.clock.tick(),
                elapsed_hours = self.clock.elapsed_hours(),
                delta_hours,
                produced,
                published = published.len(),
                "sub-tick complete"
            );
        }
        published
    }

    /// Seed the subsystems from a region's static metadata.
    ///
    /// Returns `Ok(false)` for a region not in the catalog. Seeding the same
    /// region twice is a no-op.
    pub fn initialize_from_region(&mut self, region_id: &str) -> SimResult<bool> {
        let id = RegionId::new(region_id)?;
        if self.initialized_regions.contains(&id) {
            return Ok(true);
        }
        let Some(region) = self.regions.get(&id) else {
            tracing::warn!(region = region_id, "unknown region; skipping initialization");
            return Ok(false);
        };

        self.weather.set_default_state(region.default_weather);
        self.weather
            .set_sector_default(region.sector.clone(), region.default_weather);

        let mut populations = 0usize;
        for species in &region.wildlife {
            if self
                .wildlife
                .register_population(region.biome.clone(), species.clone())
            {
                populations += 1;
            }
        }

        let mut patrol = false;
        let patrolling = region
            .dominant_faction
            .as_ref()
            .filter(|_| region.patrol_density > 0.0);
        if let Some(faction) = patrolling {
            let extent = self.config.traffic.patrol_route_extent;
            self.traffic.register_patrol_route(PatrolRoute {
                id: RouteId::new(format!("{}-patrol", region.id))?,
                faction: faction.clone(),
                sector: region.sector.clone(),
                waypoints: vec![
                    Vec3::new(-extent, -extent, 0.0),
                    Vec3::new(extent, -extent, 0.0),
                    Vec3::new(extent, extent, 0.0),
                    Vec3::new(-extent, extent, 0.0),
                ],
                frequency: region.patrol_density,
            })?;
            patrol = true;
        }

        tracing::info!(
            region = %region.id,
            sector = %region.sector,
            weather = %region.default_weather,
            populations,
            patrol,
            "region initialized"
        );
        self.initialized_regions.insert(id);
        Ok(true)
    }

    /// Capture the full persisted state.
    pub fn snapshot(&self) -> SimulationSnapshot {
        SimulationSnapshot {
            version: SNAPSHOT_VERSION,
            saved_at: Utc::now(),
            seed: self.config.global.seed,
            tick: self.clock.tick(),
            elapsed_hours: self.clock.elapsed_hours(),
            initialized_regions: self.initialized_regions.clone(),
            weather: self.weather.snapshot(),
            wildlife: self.wildlife.snapshot(),
            traffic: self.traffic.snapshot(),
            law: self.law.snapshot(),
            events: self.bus.snapshot(),
        }
    }

    /// Replace all state from a snapshot. Event subscriptions stay registered.
    pub fn restore(&mut self, snapshot: SimulationSnapshot) -> SimResult<()> {
        snapshot.check_version()?;
        let seed = snapshot.seed;
        let tick = snapshot.tick;

        self.config.global.seed = seed;
        self.clock = SimClock::resume(tick, snapshot.elapsed_hours);
        self.initialized_regions = snapshot.initialized_regions;
        self.weather.restore(snapshot.weather, seed, tick);
        self.wildlife.restore(snapshot.wildlife, seed, tick);
        self.traffic.restore(snapshot.traffic, seed, tick);
        self.law.restore(snapshot.law, seed, tick);
        self.bus.restore(snapshot.events);

        tracing::info!(
            tick,
            elapsed_hours = self.clock.elapsed_hours(),
            saved_at = %snapshot.saved_at,
            "simulation restored"
        );
        Ok(())
    }

    /// The active configuration.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// The region catalog.
    pub fn regions(&self) -> &RegionCatalog {
        &self.regions
    }

    pub fn weather(&self) -> &WeatherSystem {
        &self.weather
    }

    pub fn weather_mut(&mut self) -> &mut WeatherSystem {
        &mut self.weather
    }

    pub fn wildlife(&self) -> &WildlifeSystem {
        &self.wildlife
    }

    pub fn wildlife_mut(&mut self) -> &mut WildlifeSystem {
        &mut self.wildlife
    }

    pub fn traffic(&self) -> &TrafficSystem {
        &self.traffic
    }

    pub fn traffic_mut(&mut self) -> &mut TrafficSystem {
        &mut self.traffic
    }

    pub fn law(&self) -> &LawSystem {
        &self.law
    }

    pub fn law_mut(&mut self) -> &mut LawSystem {
        &mut self.law
    }

    pub fn events(&self) -> &EventBus {
        &self.bus
    }

    /// Mutable access to the bus, for subscribing.
    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    /// Total simulated hours.
    pub fn elapsed_hours(&self) -> f64 {
        self.clock.elapsed_hours()
    }

    /// Sub-ticks run so far.
    pub fn current_tick(&self) -> u64 {
        self.clock.tick()
    }
}

/// Run each subsystem in order and collect its records.
///
/// A failing subsystem is logged and contributes nothing; the rest still run.
fn update_all<'s>(
    systems: impl IntoIterator<Item = &'s mut dyn Subsystem>,
    ctx: &TickContext<'_>,
) -> Vec<EventRecord> {
    let mut records = Vec::new();
    for system in systems {
        match system.update(ctx) {
            Ok(events) => records.extend(events),
            Err(err) => {
                tracing::warn!(system = system.name(), error = %err, "subsystem tick failed");
            }
        }
    }
    records
}
