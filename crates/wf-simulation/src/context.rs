use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use wf_core::{BiomeId, CrimeType, FactionId, SectorId, UnitInterval, Vec3};

/// Player-facing facts the law subsystem reads but does not own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Crimes the game already attributes to the player.
    #[serde(default)]
    pub crime_history: Vec<CrimeType>,
    /// Standing with each faction.
    #[serde(default)]
    pub reputation: BTreeMap<FactionId, f64>,
    /// Personal honor score.
    #[serde(default)]
    pub honor: f64,
    /// Free-form stance, e.g. "neutral" or "aggressive".
    #[serde(default)]
    pub posture: String,
    /// Whether a weapon is drawn.
    #[serde(default)]
    pub weapon_readied: bool,
    /// How intoxicated the player is.
    #[serde(default)]
    pub intoxication: UnitInterval,
    /// Name of the active disguise, if any.
    #[serde(default)]
    pub disguise: Option<String>,
}

impl PlayerState {
    /// Whether a disguise is being worn.
    pub fn is_disguised(&self) -> bool {
        self.disguise.is_some()
    }
}

/// The slice of game state the simulation consumes from its host.
pub trait GameStateView {
    /// Sector the player is in.
    fn sector(&self) -> &SectorId;
    /// Biome the player is in.
    fn biome(&self) -> &BiomeId;
    /// Player facts.
    fn player(&self) -> &PlayerState;
}

/// A plain [`GameStateView`] for hosts without their own state type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Current sector.
    pub sector: SectorId,
    /// Current biome.
    pub biome: BiomeId,
    /// Player facts.
    #[serde(default)]
    pub player: PlayerState,
}

impl GameState {
    /// A game state with default player facts.
    pub fn new(sector: SectorId, biome: BiomeId) -> Self {
        Self {
            sector,
            biome,
            player: PlayerState::default(),
        }
    }
}

impl GameStateView for GameState {
    fn sector(&self) -> &SectorId {
        &self.sector
    }

    fn biome(&self) -> &BiomeId {
        &self.biome
    }

    fn player(&self) -> &PlayerState {
        &self.player
    }
}

/// Read-only facts passed to each subsystem for one sub-tick.
#[derive(Debug, Clone, Copy)]
pub struct TickContext<'a> {
    /// Simulated hours covered by this sub-tick.
    pub delta_hours: f64,
    /// Sector being simulated.
    pub sector: &'a SectorId,
    /// Biome being simulated.
    pub biome: &'a BiomeId,
    /// Where the observer is.
    pub observer: Vec3,
    /// Player facts.
    pub player: &'a PlayerState,
}
