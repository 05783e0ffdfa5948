//! Per-biome species populations and individual creature behavior.
//!
//! A population's `count` always equals the number of living creatures of
//! that species in that biome. Spawns increment it; despawn, kills and
//! migration decrement it.

use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use wf_core::{BiomeId, CreatureId, SpeciesId, UnitInterval, Vec3, WildlifeConfig};

use crate::context::TickContext;
use crate::error::SimResult;
use crate::event::{EventRecord, WorldEventType};
use crate::system::{Subsystem, rng_stream, roll};

const RNG_SALT: u64 = 0x5749_4c44_4c49_4645;

/// What a creature is doing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Behavior {
    /// Drifting.
    #[default]
    Idle,
    /// Looking for prey.
    Hunting,
    /// Running from a predator.
    Fleeing,
}

/// A species tracked in one biome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesPopulation {
    /// Biome the population lives in.
    pub biome: BiomeId,
    /// Species.
    pub species: SpeciesId,
    /// Living creatures.
    pub count: u32,
    /// Spawning stops at this count.
    pub cap: u32,
    /// Whether the species hunts.
    pub predator: bool,
    /// Species this one hunts.
    #[serde(default)]
    pub prey: Vec<SpeciesId>,
}

impl SpeciesPopulation {
    fn has_headroom(&self) -> bool {
        self.count < self.cap
    }
}

/// One live animal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Creature {
    /// Creature id.
    pub id: CreatureId,
    /// Species.
    pub species: SpeciesId,
    /// Biome it belongs to.
    pub biome: BiomeId,
    /// Position in sector space.
    pub position: Vec3,
    /// Current behavior.
    #[serde(default)]
    pub behavior: Behavior,
    /// Health.
    pub health: UnitInterval,
    /// Hunting: where the prey was. Fleeing: where the attacker was.
    #[serde(default)]
    pub target: Option<Vec3>,
    /// Hours of fleeing left.
    #[serde(default)]
    pub flee_timer: f64,
}

/// Persisted wildlife state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WildlifeSnapshot {
    /// Every registered population.
    #[serde(default)]
    pub populations: Vec<SpeciesPopulation>,
    /// Every living creature.
    #[serde(default)]
    pub creatures: Vec<Creature>,
    /// Last creature id handed out.
    #[serde(default)]
    pub last_creature: CreatureId,
}

/// Spawns, moves and culls wildlife around the observer.
#[derive(Debug)]
pub struct WildlifeSystem {
    config: WildlifeConfig,
    rng: StdRng,
    populations: BTreeMap<(BiomeId, SpeciesId), SpeciesPopulation>,
    creatures: BTreeMap<CreatureId, Creature>,
    last_creature: CreatureId,
}

impl WildlifeSystem {
    /// A wildlife system with its own RNG stream derived from `seed`.
    pub fn new(config: WildlifeConfig, seed: u64) -> Self {
        Self {
            config,
            rng: rng_stream(seed, RNG_SALT, 0),
            populations: BTreeMap::new(),
            creatures: BTreeMap::new(),
            last_creature: CreatureId::default(),
        }
    }

    /// Track `species` in `biome`. Returns `false` for species missing from
    /// the configuration. Registering twice is a no-op.
    pub fn register_population(&mut self, biome: BiomeId, species: SpeciesId) -> bool {
        let Some(entry) = self.config.species.get(&species) else {
            tracing::warn!(biome = %biome, species = %species, "species not in wildlife config");
            return false;
        };
        let cap = (f64::from(entry.population_cap) * self.config.cap_multiplier).floor() as u32;
        let population = SpeciesPopulation {
            biome: biome.clone(),
            species: species.clone(),
            count: 0,
            cap,
            predator: entry.predator,
            prey: entry.prey.clone(),
        };
        self.populations
            .entry((biome, species))
            .or_insert(population);
        true
    }

    /// The population of `species` in `biome`.
    pub fn population(&self, biome: &BiomeId, species: &SpeciesId) -> Option<&SpeciesPopulation> {
        self.populations.get(&(biome.clone(), species.clone()))
    }

    /// Every registered population.
    pub fn populations(&self) -> impl Iterator<Item = &SpeciesPopulation> {
        self.populations.values()
    }

    /// Every living creature, in id order.
    pub fn creatures(&self) -> impl Iterator<Item = &Creature> {
        self.creatures.values()
    }

    /// Look up a creature.
    pub fn creature(&self, id: CreatureId) -> Option<&Creature> {
        self.creatures.get(&id)
    }

    /// Living creatures of `species` in `biome`.
    pub fn living_count(&self, biome: &BiomeId, species: &SpeciesId) -> usize {
        self.creatures
            .values()
            .filter(|c| &c.biome == biome && &c.species == species)
            .count()
    }

    /// Advance wildlife in `biome` around `observer`.
    pub fn tick(&mut self, delta_hours: f64, biome: &BiomeId, observer: Vec3) -> Vec<EventRecord> {
        let mut events = Vec::new();
        self.despawn_distant(observer);
        self.update_behavior(delta_hours, biome, &mut events);
        self.move_creatures(delta_hours, biome);
        self.spawn(delta_hours, biome, observer, &mut events);
        self.resolve_hunts(biome, &mut events);
        self.migrate(delta_hours, biome, &mut events);
        events
    }

    /// Capture persisted state.
    pub fn snapshot(&self) -> WildlifeSnapshot {
        WildlifeSnapshot {
            populations: self.populations.values().cloned().collect(),
            creatures: self.creatures.values().cloned().collect(),
            last_creature: self.last_creature,
        }
    }

    /// Replace state from a snapshot and reseed the RNG stream for `tick`.
    ///
    /// Counts are recomputed from the restored creatures.
    pub fn restore(&mut self, snapshot: WildlifeSnapshot, seed: u64, tick: u64) {
        self.creatures = snapshot
            .creatures
            .into_iter()
            .map(|c| (c.id, c))
            .collect();
        self.populations = snapshot
            .populations
            .into_iter()
            .map(|p| ((p.biome.clone(), p.species.clone()), p))
            .collect();
        for population in self.populations.values_mut() {
            population.count = self
                .creatures
                .values()
                .filter(|c| c.biome == population.biome && c.species == population.species)
                .count() as u32;
        }
        self.last_creature = snapshot.last_creature;
        self.rng = rng_stream(seed, RNG_SALT, tick);
    }

    // -----------------------------------------------------------------------
    // Tick phases
    // -----------------------------------------------------------------------

    fn remove_creature(&mut self, id: CreatureId) -> Option<Creature> {
        let creature = self.creatures.remove(&id)?;
        if let Some(population) = self
            .populations
            .get_mut(&(creature.biome.clone(), creature.species.clone()))
        {
            population.count = population.count.saturating_sub(1);
        }
        Some(creature)
    }

    fn is_predator(&self, biome: &BiomeId, species: &SpeciesId) -> bool {
        self.populations
            .get(&(biome.clone(), species.clone()))
            .is_some_and(|p| p.predator)
    }

    fn despawn_distant(&mut self, observer: Vec3) {
        let limit = self.config.despawn_distance;
        let distant: Vec<CreatureId> = self
            .creatures
            .values()
            .filter(|c| c.position.distance(observer) > limit)
            .map(|c| c.id)
            .collect();
        for id in distant {
            self.remove_creature(id);
        }
    }

    fn update_behavior(&mut self, delta_hours: f64, biome: &BiomeId, events: &mut Vec<EventRecord>) {
        let to_hunting = self.config.idle_to_hunting_per_hour * delta_hours;
        let to_idle = self.config.hunting_to_idle_per_hour * delta_hours;
        let ids: Vec<CreatureId> = self
            .creatures
            .values()
            .filter(|c| &c.biome == biome)
            .map(|c| c.id)
            .collect();

        for id in ids {
            let Some(creature) = self.creatures.get(&id) else {
                continue;
            };
            let predator = self.is_predator(biome, &creature.species);
            let behavior = creature.behavior;
            match behavior {
                Behavior::Idle => {
                    if predator && roll(&mut self.rng, to_hunting) {
                        if let Some(creature) = self.creatures.get_mut(&id) {
                            creature.behavior = Behavior::Hunting;
                            events.push(
                                EventRecord::new(WorldEventType::PredatorStalking)
                                    .with("creature_id", id.0)
                                    .with("species", creature.species.as_str())
                                    .with("biome", biome.as_str()),
                            );
                        }
                    }
                }
                Behavior::Hunting => {
                    if roll(&mut self.rng, to_idle) {
                        if let Some(creature) = self.creatures.get_mut(&id) {
                            creature.behavior = Behavior::Idle;
                            creature.target = None;
                        }
                    }
                }
                Behavior::Fleeing => {
                    if let Some(creature) = self.creatures.get_mut(&id) {
                        creature.flee_timer -= delta_hours;
                        if creature.flee_timer <= 0.0 {
                            creature.behavior = Behavior::Idle;
                            creature.flee_timer = 0.0;
                            creature.target = None;
                        }
                    }
                }
            }
        }
    }

    /// Nearest non-fleeing prey of `hunter`, optionally limited to `range`.
    fn nearest_prey(&self, hunter: &Creature, range: Option<f64>) -> Option<(CreatureId, f64)> {
        let prey = &self
            .populations
            .get(&(hunter.biome.clone(), hunter.species.clone()))?
            .prey;
        self.creatures
            .values()
            .filter(|c| {
                c.biome == hunter.biome
                    && c.behavior != Behavior::Fleeing
                    && prey.contains(&c.species)
            })
            .map(|c| (c.id, c.position.distance(hunter.position)))
            .filter(|(_, d)| range.is_none_or(|r| *d <= r))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    fn move_creatures(&mut self, delta_hours: f64, biome: &BiomeId) {
        let step = self.config.creature_speed * delta_hours;
        let hunters: Vec<(CreatureId, Option<Vec3>)> = self
            .creatures
            .values()
            .filter(|c| &c.biome == biome && c.behavior == Behavior::Hunting)
            .map(|c| {
                let target = self
                    .nearest_prey(c, None)
                    .and_then(|(id, _)| self.creatures.get(&id))
                    .map(|prey| prey.position);
                (c.id, target)
            })
            .collect();
        for (id, target) in hunters {
            if let Some(creature) = self.creatures.get_mut(&id) {
                creature.target = target;
                if let Some(target) = target {
                    creature.position = creature.position.move_towards(target, step);
                }
            }
        }

        for creature in self.creatures.values_mut() {
            if &creature.biome != biome || creature.behavior != Behavior::Fleeing {
                continue;
            }
            if let Some(threat) = creature.target {
                let away = (creature.position - threat).normalized();
                creature.position = creature.position + away * step;
            }
        }
    }

    fn spawn(&mut self, delta_hours: f64, biome: &BiomeId, observer: Vec3, events: &mut Vec<EventRecord>) {
        let chance =
            self.config.spawn_chance_per_hour * self.config.density_multiplier * delta_hours;
        let eligible: Vec<SpeciesId> = self
            .populations
            .values()
            .filter(|p| &p.biome == biome && p.has_headroom())
            .map(|p| p.species.clone())
            .collect();

        for species in eligible {
            if !roll(&mut self.rng, chance) {
                continue;
            }
            let position = observer + self.random_offset();
            self.last_creature = self.last_creature.next();
            let creature = Creature {
                id: self.last_creature,
                species: species.clone(),
                biome: biome.clone(),
                position,
                behavior: Behavior::Idle,
                health: UnitInterval::ONE,
                target: None,
                flee_timer: 0.0,
            };
            if let Some(population) = self.populations.get_mut(&(biome.clone(), species.clone())) {
                population.count += 1;
            }
            events.push(
                EventRecord::new(WorldEventType::CreatureSpawned)
                    .with("creature_id", creature.id.0)
                    .with("species", species.as_str())
                    .with("biome", biome.as_str())
                    .with("x", position.x)
                    .with("y", position.y)
                    .with("z", position.z),
            );
            self.creatures.insert(creature.id, creature);
        }
    }

    fn random_offset(&mut self) -> Vec3 {
        let direction = Vec3::new(
            self.rng.random_range(-1.0..=1.0),
            self.rng.random_range(-1.0..=1.0),
            self.rng.random_range(-1.0..=1.0),
        )
        .normalized();
        direction * self.rng.random_range(0.0..=self.config.spawn_radius)
    }

    fn resolve_hunts(&mut self, biome: &BiomeId, events: &mut Vec<EventRecord>) {
        let range = self.config.detection_range;
        let hunters: Vec<CreatureId> = self
            .creatures
            .values()
            .filter(|c| &c.biome == biome && c.behavior == Behavior::Hunting)
            .map(|c| c.id)
            .collect();
        let mut resolved: BTreeSet<CreatureId> = BTreeSet::new();

        for hunter_id in hunters {
            let Some(hunter) = self.creatures.get(&hunter_id).cloned() else {
                continue;
            };
            let Some((prey_id, _)) = self
                .nearest_prey(&hunter, Some(range))
                .filter(|(id, _)| !resolved.contains(id))
            else {
                continue;
            };
            resolved.insert(prey_id);

            if roll(&mut self.rng, self.config.hunt_success_chance) {
                if let Some(prey) = self.remove_creature(prey_id) {
                    events.push(
                        EventRecord::new(WorldEventType::PredatorKill)
                            .with("predator_id", hunter.id.0)
                            .with("prey_id", prey.id.0)
                            .with("predator_species", hunter.species.as_str())
                            .with("prey_species", prey.species.as_str())
                            .with("biome", biome.as_str()),
                    );
                }
                if let Some(hunter) = self.creatures.get_mut(&hunter_id) {
                    hunter.behavior = Behavior::Idle;
                    hunter.target = None;
                }
            } else if let Some(prey) = self.creatures.get_mut(&prey_id) {
                prey.behavior = Behavior::Fleeing;
                prey.flee_timer = self.config.flee_duration_hours;
                prey.target = Some(hunter.position);
                events.push(
                    EventRecord::new(WorldEventType::PreyEscape)
                        .with("predator_id", hunter.id.0)
                        .with("prey_id", prey.id.0)
                        .with("predator_species", hunter.species.as_str())
                        .with("prey_species", prey.species.as_str())
                        .with("biome", biome.as_str()),
                );
            }
        }
    }

    fn migrate(&mut self, delta_hours: f64, biome: &BiomeId, events: &mut Vec<EventRecord>) {
        if !roll(&mut self.rng, self.config.migration_chance_per_hour * delta_hours) {
            return;
        }
        let present: Vec<SpeciesId> = self
            .populations
            .values()
            .filter(|p| &p.biome == biome && p.count > 0)
            .map(|p| p.species.clone())
            .collect();
        let Some(species) = present.choose(&mut self.rng).cloned() else {
            return;
        };
        let count = self.living_count(biome, &species) as u32;
        let departing = (count / 2).max(1);
        let leavers: Vec<CreatureId> = self
            .creatures
            .values()
            .filter(|c| &c.biome == biome && c.species == species)
            .map(|c| c.id)
            .take(departing as usize)
            .collect();
        for id in &leavers {
            self.remove_creature(*id);
        }
        let remaining = self
            .population(biome, &species)
            .map_or(0, |p| p.count);
        events.push(
            EventRecord::new(WorldEventType::Migration)
                .with("biome", biome.as_str())
                .with("species", species.as_str())
                .with("departed", leavers.len() as u64)
                .with("remaining", u64::from(remaining)),
        );
    }
}

impl Subsystem for WildlifeSystem {
    fn name(&self) -> &'static str {
        "wildlife"
    }

    fn update(&mut self, ctx: &TickContext<'_>) -> SimResult<Vec<EventRecord>> {
        Ok(self.tick(ctx.delta_hours, ctx.biome, ctx.observer))
    }
}
