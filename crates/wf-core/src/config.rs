//! Typed, validated simulation tunables.
//!
//! Every field is required in the JSON document; a missing or malformed
//! tunable fails the load. [`SimulationConfig::validate`] runs after every
//! parse and rejects out-of-range values.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::id::SpeciesId;
use crate::kind::{CrimeType, ShipType, WeatherState};

const BUILTIN_CONFIG: &str = include_str!("../data/simulation.json");

/// An inclusive `min..=max` range used for randomized durations and values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
}

impl ValueRange {
    /// Create a range.
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Settings that apply to the coordinator as a whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Seed for every subsystem RNG stream.
    pub seed: u64,
    /// Simulated hours per real-time second.
    pub time_scale: f64,
    /// Largest simulated delta applied in a single sub-tick.
    pub max_tick_hours: f64,
    /// Event-bus history capacity.
    pub max_history: usize,
    /// Whether cross-system rules synthesize combined events.
    pub cross_system_events: bool,
    /// Extra diagnostics.
    pub debug: bool,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            time_scale: 0.05,
            max_tick_hours: 0.25,
            max_history: 1000,
            cross_system_events: true,
            debug: false,
        }
    }
}

/// Lifecycle parameters for a hazardous weather state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardConfig {
    /// Hull damage per hour at full severity.
    pub damage_rate: f64,
    /// How long a spawned hazard lasts.
    pub duration_hours: ValueRange,
}

/// Weather tunables. A state is hazardous iff it has an entry in `hazards`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// How long a weather state holds before the next transition check.
    pub transition_hours: ValueRange,
    /// Number of future states kept in a sector forecast.
    pub forecast_length: usize,
    /// Chance that each forecast step follows the transition table.
    pub forecast_accuracy: f64,
    /// Weighted successor table keyed by current state.
    pub transitions: BTreeMap<WeatherState, BTreeMap<WeatherState, f64>>,
    /// Gameplay multipliers applied while a state is active.
    pub modifiers: BTreeMap<WeatherState, BTreeMap<String, f64>>,
    /// Hazard parameters for hazardous states.
    pub hazards: BTreeMap<WeatherState, HazardConfig>,
}

impl WeatherConfig {
    /// Whether `state` spawns a hazard when entered.
    pub fn is_hazardous(&self, state: WeatherState) -> bool {
        self.hazards.contains_key(&state)
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        use WeatherState::*;

        let table = |entries: &[(WeatherState, f64)]| -> BTreeMap<WeatherState, f64> {
            entries.iter().copied().collect()
        };
        let transitions = BTreeMap::from([
            (
                Clear,
                table(&[
                    (Clear, 0.5),
                    (LightNebula, 0.2),
                    (AsteroidField, 0.1),
                    (DebrisField, 0.1),
                    (IonStorm, 0.05),
                    (SolarFlare, 0.05),
                ]),
            ),
            (
                LightNebula,
                table(&[(Clear, 0.4), (LightNebula, 0.3), (DenseNebula, 0.2), (IonStorm, 0.1)]),
            ),
            (
                DenseNebula,
                table(&[(LightNebula, 0.5), (DenseNebula, 0.3), (IonStorm, 0.2)]),
            ),
            (AsteroidField, table(&[(Clear, 0.6), (AsteroidField, 0.3), (DebrisField, 0.1)])),
            (DebrisField, table(&[(Clear, 0.7), (DebrisField, 0.3)])),
            (IonStorm, table(&[(Clear, 0.5), (LightNebula, 0.3), (IonStorm, 0.2)])),
            (SolarFlare, table(&[(Clear, 0.8), (SolarFlare, 0.2)])),
        ]);

        let mods = |entries: &[(&str, f64)]| {
            entries
                .iter()
                .map(|(k, v)| ((*k).to_string(), *v))
                .collect::<BTreeMap<_, _>>()
        };
        let modifiers = BTreeMap::from([
            (Clear, mods(&[("visibility", 1.0), ("ship_damage_rate", 1.0)])),
            (LightNebula, mods(&[("visibility", 0.8), ("sensor_range", 0.9)])),
            (DenseNebula, mods(&[("visibility", 0.4), ("sensor_range", 0.5)])),
            (
                AsteroidField,
                mods(&[
                    ("visibility", 0.9),
                    ("ship_damage_rate", 1.5),
                    ("traffic_speed", 0.7),
                ]),
            ),
            (
                DebrisField,
                mods(&[
                    ("visibility", 0.9),
                    ("ship_damage_rate", 1.2),
                    ("traffic_speed", 0.8),
                ]),
            ),
            (
                IonStorm,
                mods(&[
                    ("visibility", 0.6),
                    ("sensor_range", 0.3),
                    ("ship_damage_rate", 2.0),
                ]),
            ),
            (SolarFlare, mods(&[("visibility", 0.7), ("ship_damage_rate", 2.5)])),
        ]);

        let hazards = BTreeMap::from([
            (
                AsteroidField,
                HazardConfig {
                    damage_rate: 0.03,
                    duration_hours: ValueRange::new(3.0, 8.0),
                },
            ),
            (
                IonStorm,
                HazardConfig {
                    damage_rate: 0.05,
                    duration_hours: ValueRange::new(2.0, 6.0),
                },
            ),
            (
                SolarFlare,
                HazardConfig {
                    damage_rate: 0.08,
                    duration_hours: ValueRange::new(1.0, 3.0),
                },
            ),
        ]);

        Self {
            transition_hours: ValueRange::new(4.0, 12.0),
            forecast_length: 3,
            forecast_accuracy: 0.8,
            transitions,
            modifiers,
            hazards,
        }
    }
}

/// Static description of a species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesConfig {
    /// Base population cap per biome, before `cap_multiplier`.
    pub population_cap: u32,
    /// Whether this species hunts.
    pub predator: bool,
    /// Species this one hunts.
    #[serde(default)]
    pub prey: Vec<SpeciesId>,
}

/// Wildlife tunables. Per-hour rates are multiplied by the tick delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WildlifeConfig {
    /// Multiplier applied to every species cap.
    pub cap_multiplier: f64,
    /// Multiplier applied to spawn chance.
    pub density_multiplier: f64,
    /// Spawn chance per hour for a population below its cap.
    pub spawn_chance_per_hour: f64,
    /// Maximum offset from the observer for a new creature.
    pub spawn_radius: f64,
    /// Creatures farther than this from the observer are culled.
    pub despawn_distance: f64,
    /// How far a hunting predator can sense prey.
    pub detection_range: f64,
    /// Chance a predator kills the prey it reaches.
    pub hunt_success_chance: f64,
    /// How long escaped prey keeps fleeing.
    pub flee_duration_hours: f64,
    /// Idle to hunting transition rate.
    pub idle_to_hunting_per_hour: f64,
    /// Hunting to idle transition rate.
    pub hunting_to_idle_per_hour: f64,
    /// Migration rate for the current biome.
    pub migration_chance_per_hour: f64,
    /// Movement speed of hunting and fleeing creatures, units per hour.
    pub creature_speed: f64,
    /// Species catalog.
    pub species: BTreeMap<SpeciesId, SpeciesConfig>,
}

impl Default for WildlifeConfig {
    fn default() -> Self {
        let id = SpeciesId::literal;
        let species = BTreeMap::from([
            (
                id("void_shark"),
                SpeciesConfig {
                    population_cap: 3,
                    predator: true,
                    prey: vec![id("drift_ray"), id("star_krill")],
                },
            ),
            (
                id("drift_ray"),
                SpeciesConfig {
                    population_cap: 10,
                    predator: false,
                    prey: Vec::new(),
                },
            ),
            (
                id("star_krill"),
                SpeciesConfig {
                    population_cap: 30,
                    predator: false,
                    prey: Vec::new(),
                },
            ),
        ]);
        Self {
            cap_multiplier: 1.0,
            density_multiplier: 1.0,
            spawn_chance_per_hour: 0.5,
            spawn_radius: 200.0,
            despawn_distance: 1000.0,
            detection_range: 50.0,
            hunt_success_chance: 0.4,
            flee_duration_hours: 2.0,
            idle_to_hunting_per_hour: 0.2,
            hunting_to_idle_per_hour: 0.1,
            migration_chance_per_hour: 0.01,
            creature_speed: 20.0,
            species,
        }
    }
}

/// Traffic tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficConfig {
    /// Spawning stops once a sector holds this many ships.
    pub max_ships_per_sector: usize,
    /// Trade-lane spawn chance per hour.
    pub trade_density: f64,
    /// Patrol spawn chance per hour per registered route.
    pub patrol_frequency: f64,
    /// Share of trade-density spawns that are civilian.
    pub civilian_share: f64,
    /// Share of trade-density spawns that are pirates.
    pub pirate_share: f64,
    /// Cruise speed per ship type, units per hour.
    pub ship_speeds: BTreeMap<ShipType, f64>,
    /// Patrol sensor range.
    pub scan_range: f64,
    /// Ships inside this distance of the observer slow down.
    pub avoidance_distance: f64,
    /// Ships inside this distance of the observer stop for one tick.
    pub emergency_distance: f64,
    /// Speed multiplier inside the avoidance distance.
    pub avoidance_factor: f64,
    /// Congestion above which a congestion event fires.
    pub congestion_threshold: f64,
    /// Half-extent of a sector, used for random spawn points.
    pub sector_radius: f64,
    /// Distance at which a ship counts as arrived.
    pub arrival_tolerance: f64,
    /// Half-extent of a region's default rectangular patrol route.
    pub patrol_route_extent: f64,
}

impl TrafficConfig {
    /// Cruise speed for `ship_type`, zero when unconfigured.
    pub fn speed_of(&self, ship_type: ShipType) -> f64 {
        self.ship_speeds.get(&ship_type).copied().unwrap_or(0.0)
    }
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            max_ships_per_sector: 20,
            trade_density: 0.6,
            patrol_frequency: 0.3,
            civilian_share: 0.2,
            pirate_share: 0.05,
            ship_speeds: BTreeMap::from([
                (ShipType::Trader, 40.0),
                (ShipType::Patrol, 60.0),
                (ShipType::Civilian, 35.0),
                (ShipType::Pirate, 70.0),
            ]),
            scan_range: 150.0,
            avoidance_distance: 80.0,
            emergency_distance: 20.0,
            avoidance_factor: 0.5,
            congestion_threshold: 0.8,
            sector_radius: 2000.0,
            arrival_tolerance: 1.0,
            patrol_route_extent: 500.0,
        }
    }
}

/// Law tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LawConfig {
    /// Global scale on suspicion gained per crime.
    pub suspicion_scale: f64,
    /// Per-type multiplier on suspicion gained.
    pub crime_multipliers: BTreeMap<CrimeType, f64>,
    /// Suspicion lost per hour.
    pub decay_per_hour: f64,
    /// Chance each witness files a report with each faction.
    pub witness_report_chance: f64,
    /// Reliability assigned to a witness report.
    pub witness_reliability: ValueRange,
    /// Suspicion at which a faction opens an investigation.
    pub investigation_threshold: f64,
    /// Suspicion at which a pursuit escalates to arrest. Pursuits open at a
    /// warning and climb one rung per tick. Must not exceed `lethal_threshold`.
    pub arrest_threshold: f64,
    /// Suspicion at investigation end that starts a pursuit.
    pub pursuit_threshold: f64,
    /// Suspicion at which a pursuit escalates to lethal force.
    pub lethal_threshold: f64,
    /// Suspicion at which a pursuit sets up a blockade.
    pub blockade_threshold: f64,
    /// Length of an investigation.
    pub investigation_hours: f64,
    /// Quiet period after an inconclusive investigation.
    pub investigation_cooldown_hours: f64,
    /// Length of a pursuit before it is abandoned.
    pub pursuit_hours: f64,
    /// Ships committed to a pursuit at full suspicion.
    pub max_pursuit_ships: u32,
    /// Crimes at or above this severity post a bounty.
    pub severe_crime_severity: u8,
    /// Flat bounty amount per severe crime.
    pub bounty_base: f64,
    /// Additional bounty per severity point.
    pub bounty_per_severity: f64,
    /// Fraction of a bounty lost per hour.
    pub bounty_decay_per_hour: f64,
    /// Bounties below this amount expire.
    pub bounty_floor: f64,
    /// Decay multiplier while the player wears a disguise.
    pub disguise_decay_multiplier: f64,
    /// Decay multiplier while the player has a weapon readied.
    pub weapon_readied_decay_multiplier: f64,
}

impl LawConfig {
    /// Suspicion multiplier for `crime`, one when unconfigured.
    pub fn multiplier_for(&self, crime: CrimeType) -> f64 {
        self.crime_multipliers.get(&crime).copied().unwrap_or(1.0)
    }
}

impl Default for LawConfig {
    fn default() -> Self {
        Self {
            suspicion_scale: 0.1,
            crime_multipliers: BTreeMap::from([
                (CrimeType::Trespass, 0.5),
                (CrimeType::Theft, 1.0),
                (CrimeType::Smuggling, 1.2),
                (CrimeType::Assault, 1.5),
                (CrimeType::Murder, 2.5),
            ]),
            decay_per_hour: 0.01,
            witness_report_chance: 0.6,
            witness_reliability: ValueRange::new(0.4, 1.0),
            investigation_threshold: 0.3,
            arrest_threshold: 0.5,
            pursuit_threshold: 0.6,
            lethal_threshold: 0.85,
            blockade_threshold: 0.95,
            investigation_hours: 6.0,
            investigation_cooldown_hours: 12.0,
            pursuit_hours: 8.0,
            max_pursuit_ships: 6,
            severe_crime_severity: 4,
            bounty_base: 500.0,
            bounty_per_severity: 250.0,
            bounty_decay_per_hour: 0.02,
            bounty_floor: 1.0,
            disguise_decay_multiplier: 2.0,
            weapon_readied_decay_multiplier: 0.5,
        }
    }
}

// ---------------------------------------------------------------------------
// Top level
// ---------------------------------------------------------------------------

/// The complete set of simulation tunables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Coordinator settings.
    pub global: GlobalConfig,
    /// Weather tunables.
    pub weather: WeatherConfig,
    /// Wildlife tunables.
    pub wildlife: WildlifeConfig,
    /// Traffic tunables.
    pub traffic: TrafficConfig,
    /// Law tunables.
    pub law: LawConfig,
}

impl SimulationConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json_str(json: &str) -> CoreResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| CoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&json)?;
        tracing::info!(path = %path.display(), "simulation config loaded");
        Ok(config)
    }

    /// The configuration bundled with the crate.
    pub fn builtin() -> CoreResult<Self> {
        Self::from_json_str(BUILTIN_CONFIG)
    }

    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.global.seed = seed;
        self
    }

    /// Set the simulated hours per real-time second.
    pub fn with_time_scale(mut self, time_scale: f64) -> Self {
        self.global.time_scale = time_scale;
        self
    }

    /// Set the largest delta applied per sub-tick.
    pub fn with_max_tick_hours(mut self, hours: f64) -> Self {
        self.global.max_tick_hours = hours;
        self
    }

    /// Set the event-bus history capacity.
    pub fn with_max_history(mut self, max: usize) -> Self {
        self.global.max_history = max;
        self
    }

    /// Enable or disable cross-system event synthesis.
    pub fn with_cross_system_events(mut self, enabled: bool) -> Self {
        self.global.cross_system_events = enabled;
        self
    }

    /// Enable or disable extra diagnostics.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.global.debug = debug;
        self
    }

    /// Reject out-of-range tunables.
    pub fn validate(&self) -> CoreResult<()> {
        let g = &self.global;
        positive("global.time_scale", g.time_scale)?;
        positive("global.max_tick_hours", g.max_tick_hours)?;
        if g.max_history == 0 {
            return Err(invalid("global.max_history must be at least 1"));
        }

        let w = &self.weather;
        range("weather.transition_hours", w.transition_hours)?;
        if w.transition_hours.min <= 0.0 {
            return Err(invalid("weather.transition_hours.min must be positive"));
        }
        probability("weather.forecast_accuracy", w.forecast_accuracy)?;
        for (from, successors) in &w.transitions {
            for (to, weight) in successors {
                non_negative(&format!("weather.transitions.{from}.{to}"), *weight)?;
            }
        }
        for (state, hazard) in &w.hazards {
            non_negative(&format!("weather.hazards.{state}.damage_rate"), hazard.damage_rate)?;
            range(&format!("weather.hazards.{state}.duration_hours"), hazard.duration_hours)?;
        }

        let wl = &self.wildlife;
        non_negative("wildlife.cap_multiplier", wl.cap_multiplier)?;
        non_negative("wildlife.density_multiplier", wl.density_multiplier)?;
        non_negative("wildlife.spawn_chance_per_hour", wl.spawn_chance_per_hour)?;
        non_negative("wildlife.spawn_radius", wl.spawn_radius)?;
        positive("wildlife.despawn_distance", wl.despawn_distance)?;
        non_negative("wildlife.detection_range", wl.detection_range)?;
        probability("wildlife.hunt_success_chance", wl.hunt_success_chance)?;
        non_negative("wildlife.flee_duration_hours", wl.flee_duration_hours)?;
        non_negative("wildlife.idle_to_hunting_per_hour", wl.idle_to_hunting_per_hour)?;
        non_negative("wildlife.hunting_to_idle_per_hour", wl.hunting_to_idle_per_hour)?;
        non_negative("wildlife.migration_chance_per_hour", wl.migration_chance_per_hour)?;
        non_negative("wildlife.creature_speed", wl.creature_speed)?;
        for (species, entry) in &wl.species {
            for prey in &entry.prey {
                if !wl.species.contains_key(prey) {
                    return Err(invalid(format!(
                        "wildlife.species.{species} hunts unknown species {prey}"
                    )));
                }
            }
        }

        let t = &self.traffic;
        if t.max_ships_per_sector == 0 {
            return Err(invalid("traffic.max_ships_per_sector must be at least 1"));
        }
        non_negative("traffic.trade_density", t.trade_density)?;
        non_negative("traffic.patrol_frequency", t.patrol_frequency)?;
        probability("traffic.civilian_share", t.civilian_share)?;
        probability("traffic.pirate_share", t.pirate_share)?;
        if t.civilian_share + t.pirate_share > 1.0 {
            return Err(invalid("traffic.civilian_share + traffic.pirate_share exceeds 1"));
        }
        for (ship_type, speed) in &t.ship_speeds {
            non_negative(&format!("traffic.ship_speeds.{ship_type}"), *speed)?;
        }
        non_negative("traffic.scan_range", t.scan_range)?;
        non_negative("traffic.emergency_distance", t.emergency_distance)?;
        if t.emergency_distance > t.avoidance_distance {
            return Err(invalid(
                "traffic.emergency_distance exceeds traffic.avoidance_distance",
            ));
        }
        probability("traffic.avoidance_factor", t.avoidance_factor)?;
        probability("traffic.congestion_threshold", t.congestion_threshold)?;
        positive("traffic.sector_radius", t.sector_radius)?;
        non_negative("traffic.arrival_tolerance", t.arrival_tolerance)?;
        positive("traffic.patrol_route_extent", t.patrol_route_extent)?;

        let l = &self.law;
        non_negative("law.suspicion_scale", l.suspicion_scale)?;
        for (crime, multiplier) in &l.crime_multipliers {
            non_negative(&format!("law.crime_multipliers.{crime}"), *multiplier)?;
        }
        non_negative("law.decay_per_hour", l.decay_per_hour)?;
        probability("law.witness_report_chance", l.witness_report_chance)?;
        range("law.witness_reliability", l.witness_reliability)?;
        probability("law.witness_reliability.min", l.witness_reliability.min)?;
        probability("law.witness_reliability.max", l.witness_reliability.max)?;
        for (name, value) in [
            ("law.investigation_threshold", l.investigation_threshold),
            ("law.arrest_threshold", l.arrest_threshold),
            ("law.pursuit_threshold", l.pursuit_threshold),
            ("law.lethal_threshold", l.lethal_threshold),
            ("law.blockade_threshold", l.blockade_threshold),
        ] {
            probability(name, value)?;
        }
        if l.investigation_threshold > l.pursuit_threshold
            || l.pursuit_threshold > l.lethal_threshold
            || l.pursuit_threshold > l.blockade_threshold
        {
            return Err(invalid(
                "law thresholds must satisfy investigation <= pursuit <= lethal and pursuit <= blockade",
            ));
        }
        if l.arrest_threshold > l.lethal_threshold {
            return Err(invalid("law.arrest_threshold exceeds law.lethal_threshold"));
        }
        positive("law.investigation_hours", l.investigation_hours)?;
        non_negative("law.investigation_cooldown_hours", l.investigation_cooldown_hours)?;
        positive("law.pursuit_hours", l.pursuit_hours)?;
        if !(1..=5).contains(&l.severe_crime_severity) {
            return Err(invalid("law.severe_crime_severity must be within 1..=5"));
        }
        non_negative("law.bounty_base", l.bounty_base)?;
        non_negative("law.bounty_per_severity", l.bounty_per_severity)?;
        probability("law.bounty_decay_per_hour", l.bounty_decay_per_hour)?;
        non_negative("law.bounty_floor", l.bounty_floor)?;
        non_negative("law.disguise_decay_multiplier", l.disguise_decay_multiplier)?;
        non_negative(
            "law.weapon_readied_decay_multiplier",
            l.weapon_readied_decay_multiplier,
        )?;
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> CoreError {
    CoreError::InvalidConfig(message.into())
}

fn non_negative(name: &str, value: f64) -> CoreResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{name} must be a non-negative number, got {value}")))
    }
}

fn positive(name: &str, value: f64) -> CoreResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{name} must be positive, got {value}")))
    }
}

fn probability(name: &str, value: f64) -> CoreResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(format!("{name} must be within 0..=1, got {value}")))
    }
}

fn range(name: &str, value: ValueRange) -> CoreResult<()> {
    non_negative(&format!("{name}.min"), value.min)?;
    non_negative(&format!("{name}.max"), value.max)?;
    if value.min > value.max {
        return Err(invalid(format!(
            "{name}: min {} exceeds max {}",
            value.min, value.max
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn default_config_is_valid() {
        SimulationConfig::default().validate().unwrap();
    }

    #[test]
    fn builtin_config_parses_and_validates() {
        let config = SimulationConfig::builtin().unwrap();
        assert!(config.weather.is_hazardous(WeatherState::IonStorm));
        assert!(!config.weather.is_hazardous(WeatherState::Clear));
        assert_eq!(config.law.multiplier_for(CrimeType::Assault), 1.5);
        assert!(config.traffic.speed_of(ShipType::Patrol) > 0.0);
    }

    #[test]
    fn builder_chain() {
        let config = SimulationConfig::default()
            .with_seed(7)
            .with_time_scale(2.0)
            .with_max_tick_hours(0.5)
            .with_max_history(10)
            .with_cross_system_events(false)
            .with_debug(true);
        assert_eq!(config.global.seed, 7);
        assert!((config.global.time_scale - 2.0).abs() < f64::EPSILON);
        assert!((config.global.max_tick_hours - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.global.max_history, 10);
        assert!(!config.global.cross_system_events);
        assert!(config.global.debug);
    }

    #[test]
    fn json_round_trip() {
        let config = SimulationConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back = SimulationConfig::from_json_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn missing_section_is_fatal() {
        let mut value = serde_json::to_value(SimulationConfig::default()).unwrap();
        value.as_object_mut().unwrap().remove("law");
        let err = SimulationConfig::from_json_str(&value.to_string()).unwrap_err();
        assert!(matches!(err, CoreError::Parse(_)));
    }

    #[test]
    fn missing_tunable_is_fatal() {
        let mut value = serde_json::to_value(SimulationConfig::default()).unwrap();
        value["traffic"]
            .as_object_mut()
            .unwrap()
            .remove("max_ships_per_sector");
        assert!(SimulationConfig::from_json_str(&value.to_string()).is_err());
    }

    #[test]
    fn unknown_weather_key_is_fatal() {
        let mut value = serde_json::to_value(SimulationConfig::default()).unwrap();
        value["weather"]["modifiers"]["acid_rain"] = serde_json::json!({ "visibility": 0.1 });
        assert!(SimulationConfig::from_json_str(&value.to_string()).is_err());
    }

    #[test]
    fn out_of_order_thresholds_rejected() {
        let mut config = SimulationConfig::default();
        config.law.pursuit_threshold = 0.2;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfig(_)));
    }

    #[test]
    fn escalation_thresholds_must_climb() {
        let mut config = SimulationConfig::default();
        config.law.arrest_threshold = 0.9;
        assert!(matches!(config.validate(), Err(CoreError::InvalidConfig(_))));

        let mut config = SimulationConfig::default();
        config.law.blockade_threshold = 0.5;
        assert!(matches!(config.validate(), Err(CoreError::InvalidConfig(_))));
    }

    #[test]
    fn inverted_range_rejected() {
        let mut config = SimulationConfig::default();
        config.weather.transition_hours = ValueRange::new(10.0, 2.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_prey_rejected() {
        let mut config = SimulationConfig::default();
        let shark = SpeciesId::new("void_shark").unwrap();
        config
            .wildlife
            .species
            .get_mut(&shark)
            .unwrap()
            .prey
            .push(SpeciesId::new("moon_moth").unwrap());
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let json = serde_json::to_string_pretty(&SimulationConfig::default().with_seed(99)).unwrap();
        file.write_all(json.as_bytes()).unwrap();
        let config = SimulationConfig::load(file.path()).unwrap();
        assert_eq!(config.global.seed, 99);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SimulationConfig::load(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, CoreError::Io { .. }));
    }
}
