//! Per-sector weather: a Markov chain over [`WeatherState`] plus hazards.
//!
//! Each sector referenced by a tick holds exactly one [`WeatherCondition`].
//! When its timer runs out a successor state is drawn from the configured
//! transition table. Entering a hazardous state spawns a [`WeatherHazard`]
//! unless the sector already has one.

use std::collections::BTreeMap;

use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use wf_core::{HazardId, SectorId, UnitInterval, WeatherConfig, WeatherState};

use crate::context::TickContext;
use crate::error::SimResult;
use crate::event::{EventRecord, WorldEventType};
use crate::system::{Subsystem, rng_stream, roll, sample};

const RNG_SALT: u64 = 0x5745_4154_4845_5200;

/// Weather currently affecting a sector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherCondition {
    /// The sector.
    pub sector: SectorId,
    /// Current state.
    pub state: WeatherState,
    /// How strongly the state is felt.
    pub intensity: UnitInterval,
    /// Hours until the next transition check.
    pub remaining_hours: f64,
    /// Gameplay multipliers for the current state.
    #[serde(default)]
    pub modifiers: BTreeMap<String, f64>,
    /// Expected upcoming states, nearest first.
    #[serde(default)]
    pub forecast: Vec<WeatherState>,
}

/// A damaging weather event with its own lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherHazard {
    /// Hazard id.
    pub id: HazardId,
    /// Sector the hazard is in.
    pub sector: SectorId,
    /// State that spawned the hazard.
    pub state: WeatherState,
    /// Severity, taken from the intensity at spawn.
    pub severity: UnitInterval,
    /// Hours until the hazard ends.
    pub remaining_hours: f64,
    /// Hull damage per hour.
    pub damage_rate: f64,
}

/// Persisted weather state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// State new sectors start in.
    #[serde(default)]
    pub default_state: WeatherState,
    /// Per-sector starting states seeded from regions.
    #[serde(default)]
    pub sector_defaults: BTreeMap<SectorId, WeatherState>,
    /// Current condition per sector.
    #[serde(default)]
    pub conditions: Vec<WeatherCondition>,
    /// Active hazards.
    #[serde(default)]
    pub hazards: Vec<WeatherHazard>,
    /// Last hazard id handed out.
    #[serde(default)]
    pub last_hazard: HazardId,
}

/// Drives weather for every sector the simulation has visited.
#[derive(Debug)]
pub struct WeatherSystem {
    config: WeatherConfig,
    rng: StdRng,
    default_state: WeatherState,
    sector_defaults: BTreeMap<SectorId, WeatherState>,
    conditions: BTreeMap<SectorId, WeatherCondition>,
    hazards: Vec<WeatherHazard>,
    last_hazard: HazardId,
    pending: Vec<EventRecord>,
}

impl WeatherSystem {
    /// A weather system with its own RNG stream derived from `seed`.
    pub fn new(config: WeatherConfig, seed: u64) -> Self {
        Self {
            config,
            rng: rng_stream(seed, RNG_SALT, 0),
            default_state: WeatherState::Clear,
            sector_defaults: BTreeMap::new(),
            conditions: BTreeMap::new(),
            hazards: Vec::new(),
            last_hazard: HazardId::default(),
            pending: Vec::new(),
        }
    }

    /// Advance weather in `sector` and age every active hazard.
    pub fn tick(&mut self, delta_hours: f64, sector: &SectorId) -> Vec<EventRecord> {
        let mut events = std::mem::take(&mut self.pending);

        for hazard in &mut self.hazards {
            hazard.remaining_hours -= delta_hours;
        }
        let (expired, active): (Vec<_>, Vec<_>) = std::mem::take(&mut self.hazards)
            .into_iter()
            .partition(|h| h.remaining_hours <= 0.0);
        self.hazards = active;
        for hazard in expired {
            events.push(
                EventRecord::new(WorldEventType::WeatherHazardEnded)
                    .with("hazard_id", hazard.id.0)
                    .with("sector", hazard.sector.as_str())
                    .with("state", hazard.state.as_str()),
            );
        }

        self.ensure_condition(sector);
        let expired = match self.conditions.get_mut(sector) {
            Some(condition) => {
                condition.remaining_hours -= delta_hours;
                condition.remaining_hours <= 0.0
            }
            None => false,
        };
        if expired {
            self.transition(sector, &mut events);
        }
        events
    }

    /// Force `sector` into the state named by `state`.
    ///
    /// Unknown names are an error. Events are emitted on the next tick.
    pub fn set_weather(&mut self, sector: &SectorId, state: &str) -> SimResult<()> {
        let state: WeatherState = state.parse()?;
        self.set_weather_state(sector, state);
        Ok(())
    }

    /// Force `sector` into `state`, bypassing the transition table.
    ///
    /// Modifiers, timer and forecast are refreshed. A hazardous state spawns a
    /// hazard only if the sector has none active.
    pub fn set_weather_state(&mut self, sector: &SectorId, state: WeatherState) {
        self.ensure_condition(sector);
        let mut events = std::mem::take(&mut self.pending);
        self.apply_state(sector, state, &mut events);
        self.pending = events;
    }

    /// State new sectors start in when no region seeded one.
    pub fn set_default_state(&mut self, state: WeatherState) {
        self.default_state = state;
    }

    /// State `sector` starts in on first reference.
    pub fn set_sector_default(&mut self, sector: SectorId, state: WeatherState) {
        self.sector_defaults.insert(sector, state);
    }

    /// Current condition of `sector`, if it has been referenced.
    pub fn condition(&self, sector: &SectorId) -> Option<&WeatherCondition> {
        self.conditions.get(sector)
    }

    /// Current state of `sector`, or the state it would start in.
    pub fn state_of(&self, sector: &SectorId) -> WeatherState {
        self.conditions
            .get(sector)
            .map_or_else(|| self.initial_state(sector), |c| c.state)
    }

    /// Multiplier `key` for the current weather in `sector`, one when absent.
    pub fn modifier(&self, sector: &SectorId, key: &str) -> f64 {
        self.conditions
            .get(sector)
            .and_then(|c| c.modifiers.get(key).copied())
            .unwrap_or(1.0)
    }

    /// Forecast for `sector`, empty if unvisited.
    pub fn forecast(&self, sector: &SectorId) -> &[WeatherState] {
        self.conditions
            .get(sector)
            .map(|c| c.forecast.as_slice())
            .unwrap_or(&[])
    }

    /// All active hazards.
    pub fn hazards(&self) -> &[WeatherHazard] {
        &self.hazards
    }

    /// Active hazards in `sector`.
    pub fn hazards_in<'a>(&'a self, sector: &'a SectorId) -> impl Iterator<Item = &'a WeatherHazard> {
        self.hazards.iter().filter(move |h| &h.sector == sector)
    }

    /// Capture persisted state.
    pub fn snapshot(&self) -> WeatherSnapshot {
        WeatherSnapshot {
            default_state: self.default_state,
            sector_defaults: self.sector_defaults.clone(),
            conditions: self.conditions.values().cloned().collect(),
            hazards: self.hazards.clone(),
            last_hazard: self.last_hazard,
        }
    }

    /// Replace state from a snapshot and reseed the RNG stream for `tick`.
    pub fn restore(&mut self, snapshot: WeatherSnapshot, seed: u64, tick: u64) {
        self.default_state = snapshot.default_state;
        self.sector_defaults = snapshot.sector_defaults;
        self.conditions = snapshot
            .conditions
            .into_iter()
            .map(|c| (c.sector.clone(), c))
            .collect();
        self.hazards = snapshot.hazards;
        self.last_hazard = snapshot.last_hazard;
        self.pending.clear();
        self.rng = rng_stream(seed, RNG_SALT, tick);
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn initial_state(&self, sector: &SectorId) -> WeatherState {
        self.sector_defaults
            .get(sector)
            .copied()
            .unwrap_or(self.default_state)
    }

    fn ensure_condition(&mut self, sector: &SectorId) {
        if self.conditions.contains_key(sector) {
            return;
        }
        let state = self.initial_state(sector);
        let condition = WeatherCondition {
            sector: sector.clone(),
            state,
            intensity: UnitInterval::new(0.5),
            remaining_hours: sample(&mut self.rng, self.config.transition_hours),
            modifiers: self.modifiers_for(state),
            forecast: self.generate_forecast(state),
        };
        self.conditions.insert(sector.clone(), condition);
    }

    fn transition(&mut self, sector: &SectorId, events: &mut Vec<EventRecord>) {
        let Some(current) = self.conditions.get(sector).map(|c| c.state) else {
            return;
        };
        match self.draw_successor(current) {
            Some(next) => self.apply_state(sector, next, events),
            None => {
                let hours = sample(&mut self.rng, self.config.transition_hours);
                if let Some(condition) = self.conditions.get_mut(sector) {
                    condition.remaining_hours = hours;
                }
            }
        }
    }

    fn apply_state(&mut self, sector: &SectorId, state: WeatherState, events: &mut Vec<EventRecord>) {
        let intensity = UnitInterval::new(self.rng.random_range(0.3..=1.0));
        let remaining_hours = sample(&mut self.rng, self.config.transition_hours);
        let modifiers = self.modifiers_for(state);
        let forecast = self.generate_forecast(state);

        let Some(condition) = self.conditions.get_mut(sector) else {
            return;
        };
        let previous = condition.state;
        condition.state = state;
        condition.intensity = intensity;
        condition.remaining_hours = remaining_hours;
        condition.modifiers = modifiers;
        condition.forecast = forecast;

        if previous != state {
            tracing::debug!(sector = %sector, from = %previous, to = %state, "weather changed");
            events.push(
                EventRecord::new(WorldEventType::WeatherChanged)
                    .with("sector", sector.as_str())
                    .with("from", previous.as_str())
                    .with("to", state.as_str())
                    .with("intensity", intensity.get()),
            );
        }

        let Some(hazard_config) = self.config.hazards.get(&state) else {
            return;
        };
        if self.hazards.iter().any(|h| &h.sector == sector) {
            return;
        }
        self.last_hazard = self.last_hazard.next();
        let hazard = WeatherHazard {
            id: self.last_hazard,
            sector: sector.clone(),
            state,
            severity: intensity,
            remaining_hours: sample(&mut self.rng, hazard_config.duration_hours),
            damage_rate: hazard_config.damage_rate * intensity.get(),
        };
        events.push(
            EventRecord::new(WorldEventType::WeatherHazardStarted)
                .with("hazard_id", hazard.id.0)
                .with("sector", sector.as_str())
                .with("state", state.as_str())
                .with("severity", hazard.severity.get())
                .with("duration_hours", hazard.remaining_hours)
                .with("damage_rate", hazard.damage_rate),
        );
        self.hazards.push(hazard);
    }

    /// Weighted draw from the transition table. `None` when the state has no
    /// listed successors.
    fn draw_successor(&mut self, current: WeatherState) -> Option<WeatherState> {
        let entries: Vec<(WeatherState, f64)> = self
            .config
            .transitions
            .get(&current)?
            .iter()
            .map(|(state, weight)| (*state, *weight))
            .collect();
        match entries.choose_weighted(&mut self.rng, |(_, weight)| *weight) {
            Ok((state, _)) => Some(*state),
            Err(_) => entries.choose(&mut self.rng).map(|(state, _)| *state),
        }
    }

    fn generate_forecast(&mut self, from: WeatherState) -> Vec<WeatherState> {
        let mut forecast = Vec::with_capacity(self.config.forecast_length);
        let mut cursor = from;
        for _ in 0..self.config.forecast_length {
            let next = if roll(&mut self.rng, self.config.forecast_accuracy) {
                self.draw_successor(cursor).unwrap_or(cursor)
            } else {
                WeatherState::ALL
                    .choose(&mut self.rng)
                    .copied()
                    .unwrap_or(cursor)
            };
            forecast.push(next);
            cursor = next;
        }
        forecast
    }

    fn modifiers_for(&self, state: WeatherState) -> BTreeMap<String, f64> {
        self.config.modifiers.get(&state).cloned().unwrap_or_default()
    }
}

impl Subsystem for WeatherSystem {
    fn name(&self) -> &'static str {
        "weather"
    }

    fn update(&mut self, ctx: &TickContext<'_>) -> SimResult<Vec<EventRecord>> {
        Ok(self.tick(ctx.delta_hours, ctx.sector))
    }
}
