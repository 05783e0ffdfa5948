//! Crime recording, suspicion, and the investigation → pursuit → bounty ladder.
//!
//! Suspicion is tracked per faction and always stays in `0..=1`. A faction at
//! or above the investigation threshold opens an investigation; when it runs
//! out, the faction either starts a pursuit or closes the case and cools down.
//! A pursuit only ever escalates and a blockade, once set, stays set.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use wf_core::{CrimeId, CrimeType, FactionId, LawConfig, SectorId, UnitInterval};

use crate::context::{PlayerState, TickContext};
use crate::error::{SimError, SimResult};
use crate::event::{EventRecord, WorldEventType};
use crate::system::{Subsystem, rng_stream, roll, sample};

const RNG_SALT: u64 = 0x4c41_5700_0000_0000;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// An immutable crime record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crime {
    /// Crime id.
    pub id: CrimeId,
    /// Category.
    pub crime_type: CrimeType,
    /// Severity in `1..=5`.
    pub severity: u8,
    /// Factions that witnessed it.
    pub factions: Vec<FactionId>,
    /// Where it happened.
    pub location: SectorId,
    /// Simulated hours when it was reported.
    pub timestamp: f64,
    /// Ids of the individual witnesses.
    #[serde(default)]
    pub witnesses: Vec<String>,
}

/// A witness statement filed with a faction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WitnessReport {
    /// Who saw it.
    pub witness: String,
    /// What they saw.
    pub crime: CrimeId,
    /// Who they told.
    pub faction: FactionId,
    /// How much the statement can be trusted.
    pub reliability: UnitInterval,
}

/// An open case held by one faction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investigation {
    /// Investigating faction.
    pub faction: FactionId,
    /// Suspicion when the case opened.
    pub suspicion: UnitInterval,
    /// Simulated hours when the case opened.
    pub started_at: f64,
    /// Hours until the case resolves.
    pub remaining_hours: f64,
    /// Crimes known to the faction.
    #[serde(default)]
    pub evidence: Vec<CrimeId>,
}

/// How much force a pursuing faction is willing to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationLevel {
    /// Hail and demand the player stand down.
    Warning,
    /// Disable and detain.
    Arrest,
    /// Shoot to kill.
    Lethal,
}

impl EscalationLevel {
    /// The wire tag.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Arrest => "arrest",
            Self::Lethal => "lethal",
        }
    }

    /// One rung up the ladder; `Lethal` stays put.
    pub fn next(self) -> Self {
        match self {
            Self::Warning => Self::Arrest,
            Self::Arrest | Self::Lethal => Self::Lethal,
        }
    }
}

impl fmt::Display for EscalationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A faction actively hunting the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pursuit {
    /// Pursuing faction.
    pub faction: FactionId,
    /// Ships committed.
    pub ships: u32,
    /// Hours until the pursuit is abandoned.
    pub remaining_hours: f64,
    /// Current rung of the ladder. Never decreases.
    pub escalation: EscalationLevel,
    /// Whether exits are blocked. Never reverts.
    #[serde(default)]
    pub blockade: bool,
    /// Simulated hours when the pursuit began.
    pub started_at: f64,
}

/// Reward a faction offers for the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bounty {
    /// Posting faction.
    pub faction: FactionId,
    /// Current amount.
    pub amount: f64,
    /// Crimes the bounty covers.
    #[serde(default)]
    pub crimes: Vec<CrimeId>,
    /// Simulated hours when first posted.
    pub posted_at: f64,
}

/// Persisted law state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LawSnapshot {
    /// Simulated hours the law clock has reached.
    #[serde(default)]
    pub now: f64,
    /// Suspicion per faction.
    #[serde(default)]
    pub suspicion: BTreeMap<FactionId, UnitInterval>,
    /// Crime history.
    #[serde(default)]
    pub crimes: Vec<Crime>,
    /// Witness statements.
    #[serde(default)]
    pub witness_reports: Vec<WitnessReport>,
    /// Open investigations.
    #[serde(default)]
    pub investigations: Vec<Investigation>,
    /// Active pursuits.
    #[serde(default)]
    pub pursuits: Vec<Pursuit>,
    /// Posted bounties.
    #[serde(default)]
    pub bounties: Vec<Bounty>,
    /// Per-faction time before which no new investigation opens.
    #[serde(default)]
    pub cooldowns: BTreeMap<FactionId, f64>,
    /// Last crime id handed out.
    #[serde(default)]
    pub last_crime: CrimeId,
}

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

/// Tracks how the factions respond to the player's crimes.
#[derive(Debug)]
pub struct LawSystem {
    config: LawConfig,
    rng: StdRng,
    now: f64,
    suspicion: BTreeMap<FactionId, UnitInterval>,
    crimes: Vec<Crime>,
    witness_reports: Vec<WitnessReport>,
    investigations: BTreeMap<FactionId, Investigation>,
    pursuits: BTreeMap<FactionId, Pursuit>,
    bounties: BTreeMap<FactionId, Bounty>,
    cooldowns: BTreeMap<FactionId, f64>,
    last_crime: CrimeId,
    pending: Vec<EventRecord>,
}

impl LawSystem {
    /// A law system with its own RNG stream derived from `seed`.
    pub fn new(config: LawConfig, seed: u64) -> Self {
        Self {
            config,
            rng: rng_stream(seed, RNG_SALT, 0),
            now: 0.0,
            suspicion: BTreeMap::new(),
            crimes: Vec::new(),
            witness_reports: Vec::new(),
            investigations: BTreeMap::new(),
            pursuits: BTreeMap::new(),
            bounties: BTreeMap::new(),
            cooldowns: BTreeMap::new(),
            last_crime: CrimeId::default(),
            pending: Vec::new(),
        }
    }

    /// Record a crime and raise suspicion with each witnessing faction.
    ///
    /// Witness reports are filed at random, and severe crimes post or raise a
    /// bounty. The resulting events are emitted on the next tick.
    pub fn report_crime(
        &mut self,
        crime_type: CrimeType,
        severity: u8,
        location: SectorId,
        witnesses: Vec<String>,
        factions: Vec<FactionId>,
    ) -> SimResult<Crime> {
        if !(1..=5).contains(&severity) {
            return Err(SimError::InvalidSeverity(severity));
        }
        let mut seen = BTreeSet::new();
        let factions: Vec<FactionId> = factions
            .into_iter()
            .filter(|f| seen.insert(f.clone()))
            .collect();

        self.last_crime = self.last_crime.next();
        let crime = Crime {
            id: self.last_crime,
            crime_type,
            severity,
            factions,
            location,
            timestamp: self.now,
            witnesses,
        };

        let gain = f64::from(severity)
            * self.config.multiplier_for(crime_type)
            * self.config.suspicion_scale;
        for faction in &crime.factions {
            let level = self.suspicion.entry(faction.clone()).or_default();
            *level = level.raise(gain);
        }

        let mut filed = 0u64;
        for witness in &crime.witnesses {
            for faction in &crime.factions {
                if !roll(&mut self.rng, self.config.witness_report_chance) {
                    continue;
                }
                let reliability = UnitInterval::new(sample(&mut self.rng, self.config.witness_reliability));
                self.witness_reports.push(WitnessReport {
                    witness: witness.clone(),
                    crime: crime.id,
                    faction: faction.clone(),
                    reliability,
                });
                filed += 1;
            }
        }

        let factions: Vec<&str> = crime.factions.iter().map(FactionId::as_str).collect();
        self.pending.push(
            EventRecord::new(WorldEventType::CrimeReported)
                .with("crime_id", crime.id.0)
                .with("crime_type", crime_type.as_str())
                .with("severity", u64::from(severity))
                .with("location", crime.location.as_str())
                .with("factions", factions)
                .with("witness_reports", filed),
        );

        if severity >= self.config.severe_crime_severity {
            let amount = self.config.bounty_base + f64::from(severity) * self.config.bounty_per_severity;
            for faction in &crime.factions {
                let bounty = self.bounties.entry(faction.clone()).or_insert_with(|| Bounty {
                    faction: faction.clone(),
                    amount: 0.0,
                    crimes: Vec::new(),
                    posted_at: self.now,
                });
                bounty.amount += amount;
                bounty.crimes.push(crime.id);
                self.pending.push(
                    EventRecord::new(WorldEventType::BountyPosted)
                        .with("faction", faction.as_str())
                        .with("amount", bounty.amount)
                        .with("crime_id", crime.id.0),
                );
            }
        }

        self.crimes.push(crime.clone());
        Ok(crime)
    }

    /// [`LawSystem::report_crime`] with the crime type given as a wire tag.
    pub fn report_crime_str(
        &mut self,
        crime_type: &str,
        severity: u8,
        location: SectorId,
        witnesses: Vec<String>,
        factions: Vec<FactionId>,
    ) -> SimResult<Crime> {
        let crime_type: CrimeType = crime_type.parse()?;
        self.report_crime(crime_type, severity, location, witnesses, factions)
    }

    /// Lower a faction's suspicion from outside the simulation (bribes, favors).
    /// Returns the new level.
    pub fn clear_suspicion(&mut self, faction: &FactionId, amount: f64) -> f64 {
        let Some(level) = self.suspicion.get_mut(faction) else {
            return 0.0;
        };
        *level = level.lower(amount.max(0.0));
        if level.is_zero() {
            self.suspicion.remove(faction);
            self.pending.push(cleared(faction));
            return 0.0;
        }
        level.get()
    }

    /// End a pursuit from outside the simulation. Returns `false` if the
    /// faction was not pursuing.
    pub fn resolve_pursuit(&mut self, faction: &FactionId) -> bool {
        let Some(pursuit) = self.pursuits.remove(faction) else {
            return false;
        };
        self.pending.push(
            EventRecord::new(WorldEventType::PursuitResolved)
                .with("faction", faction.as_str())
                .with("escalation", pursuit.escalation.as_str()),
        );
        true
    }

    /// Suspicion held by `faction`, zero when untracked.
    pub fn suspicion(&self, faction: &FactionId) -> f64 {
        self.suspicion.get(faction).map_or(0.0, |s| s.get())
    }

    /// Suspicion of every tracked faction.
    pub fn suspicion_levels(&self) -> &BTreeMap<FactionId, UnitInterval> {
        &self.suspicion
    }

    /// The open investigation of `faction`.
    pub fn investigation(&self, faction: &FactionId) -> Option<&Investigation> {
        self.investigations.get(faction)
    }

    /// The active pursuit of `faction`.
    pub fn pursuit(&self, faction: &FactionId) -> Option<&Pursuit> {
        self.pursuits.get(faction)
    }

    /// Every active pursuit.
    pub fn pursuits(&self) -> impl Iterator<Item = &Pursuit> {
        self.pursuits.values()
    }

    /// The bounty posted by `faction`.
    pub fn bounty(&self, faction: &FactionId) -> Option<&Bounty> {
        self.bounties.get(faction)
    }

    /// Crime history, oldest first.
    pub fn crimes(&self) -> &[Crime] {
        &self.crimes
    }

    /// Witness statements, oldest first.
    pub fn witness_reports(&self) -> &[WitnessReport] {
        &self.witness_reports
    }

    /// Advance the law clock by `delta_hours`.
    pub fn tick(&mut self, delta_hours: f64, player: &PlayerState) -> Vec<EventRecord> {
        self.now += delta_hours;
        let mut events = std::mem::take(&mut self.pending);
        self.decay_suspicion(delta_hours, player, &mut events);
        let started = self.advance_investigations(delta_hours, &mut events);
        self.advance_pursuits(delta_hours, &mut events);
        self.pursuits.extend(started.into_iter().map(|p| (p.faction.clone(), p)));
        self.decay_bounties(delta_hours, &mut events);
        self.open_investigations(&mut events);
        events
    }

    /// Capture persisted state.
    pub fn snapshot(&self) -> LawSnapshot {
        LawSnapshot {
            now: self.now,
            suspicion: self.suspicion.clone(),
            crimes: self.crimes.clone(),
            witness_reports: self.witness_reports.clone(),
            investigations: self.investigations.values().cloned().collect(),
            pursuits: self.pursuits.values().cloned().collect(),
            bounties: self.bounties.values().cloned().collect(),
            cooldowns: self.cooldowns.clone(),
            last_crime: self.last_crime,
        }
    }

    /// Replace state from a snapshot and reseed the RNG stream for `tick`.
    pub fn restore(&mut self, snapshot: LawSnapshot, seed: u64, tick: u64) {
        self.now = snapshot.now;
        self.suspicion = snapshot.suspicion;
        self.crimes = snapshot.crimes;
        self.witness_reports = snapshot.witness_reports;
        self.investigations = snapshot
            .investigations
            .into_iter()
            .map(|i| (i.faction.clone(), i))
            .collect();
        self.pursuits = snapshot
            .pursuits
            .into_iter()
            .map(|p| (p.faction.clone(), p))
            .collect();
        self.bounties = snapshot
            .bounties
            .into_iter()
            .map(|b| (b.faction.clone(), b))
            .collect();
        self.cooldowns = snapshot.cooldowns;
        self.last_crime = snapshot.last_crime;
        self.pending.clear();
        self.rng = rng_stream(seed, RNG_SALT, tick);
    }

    // -----------------------------------------------------------------------
    // Tick phases
    // -----------------------------------------------------------------------

    fn escalation_for(&self, suspicion: f64) -> EscalationLevel {
        if suspicion >= self.config.lethal_threshold {
            EscalationLevel::Lethal
        } else if suspicion >= self.config.arrest_threshold {
            EscalationLevel::Arrest
        } else {
            EscalationLevel::Warning
        }
    }

    fn ships_for(&self, suspicion: f64) -> u32 {
        let ships = (suspicion * f64::from(self.config.max_pursuit_ships)).ceil() as u32;
        ships.max(1)
    }

    fn decay_suspicion(&mut self, delta_hours: f64, player: &PlayerState, events: &mut Vec<EventRecord>) {
        let mut rate = self.config.decay_per_hour;
        if player.is_disguised() {
            rate *= self.config.disguise_decay_multiplier;
        }
        if player.weapon_readied {
            rate *= self.config.weapon_readied_decay_multiplier;
        }
        let amount = rate * delta_hours;

        let mut zeroed = Vec::new();
        for (faction, level) in &mut self.suspicion {
            *level = level.lower(amount);
            if level.is_zero() {
                zeroed.push(faction.clone());
            }
        }
        for faction in zeroed {
            self.suspicion.remove(&faction);
            events.push(cleared(&faction));
        }
    }

    /// Tick open cases. Returns pursuits started by cases that resolved.
    fn advance_investigations(&mut self, delta_hours: f64, events: &mut Vec<EventRecord>) -> Vec<Pursuit> {
        let mut resolved = Vec::new();
        for (faction, investigation) in &mut self.investigations {
            investigation.remaining_hours -= delta_hours;
            if investigation.remaining_hours <= 0.0 {
                resolved.push(faction.clone());
            }
        }

        let mut started = Vec::new();
        for faction in resolved {
            let Some(investigation) = self.investigations.remove(&faction) else {
                continue;
            };
            let suspicion = self.suspicion(&faction);
            if suspicion >= self.config.pursuit_threshold {
                let pursuit = Pursuit {
                    faction: faction.clone(),
                    ships: self.ships_for(suspicion),
                    remaining_hours: self.config.pursuit_hours,
                    escalation: EscalationLevel::Warning,
                    blockade: suspicion >= self.config.blockade_threshold,
                    started_at: self.now,
                };
                tracing::debug!(faction = %faction, suspicion, "pursuit initiated");
                events.push(
                    EventRecord::new(WorldEventType::PursuitInitiated)
                        .with("faction", faction.as_str())
                        .with("suspicion", suspicion)
                        .with("ships", u64::from(pursuit.ships))
                        .with("escalation", pursuit.escalation.as_str())
                        .with("evidence", investigation.evidence.len() as u64),
                );
                if pursuit.blockade {
                    events.push(blockade(&faction, suspicion));
                }
                started.push(pursuit);
            } else {
                tracing::debug!(faction = %faction, suspicion, "investigation closed");
                self.cooldowns
                    .insert(faction.clone(), self.now + self.config.investigation_cooldown_hours);
                events.push(
                    EventRecord::new(WorldEventType::InvestigationConcluded)
                        .with("faction", faction.as_str())
                        .with("suspicion", suspicion)
                        .with("outcome", "insufficient_evidence"),
                );
            }
        }
        started
    }

    fn advance_pursuits(&mut self, delta_hours: f64, events: &mut Vec<EventRecord>) {
        let factions: Vec<FactionId> = self.pursuits.keys().cloned().collect();
        for faction in factions {
            let suspicion = self.suspicion(&faction);
            let target = self.escalation_for(suspicion);
            let ships = self.ships_for(suspicion);
            let blockade_threshold = self.config.blockade_threshold;
            let Some(pursuit) = self.pursuits.get_mut(&faction) else {
                continue;
            };

            pursuit.remaining_hours -= delta_hours;
            if pursuit.remaining_hours <= 0.0 {
                let escalation = pursuit.escalation;
                self.pursuits.remove(&faction);
                events.push(
                    EventRecord::new(WorldEventType::PursuitAbandoned)
                        .with("faction", faction.as_str())
                        .with("escalation", escalation.as_str()),
                );
                continue;
            }

            pursuit.ships = ships;
            // One rung per tick.
            if target > pursuit.escalation {
                let next = pursuit.escalation.next();
                tracing::debug!(faction = %faction, from = %pursuit.escalation, to = %next, "pursuit escalated");
                events.push(
                    EventRecord::new(WorldEventType::PursuitEscalated)
                        .with("faction", faction.as_str())
                        .with("from", pursuit.escalation.as_str())
                        .with("to", next.as_str())
                        .with("suspicion", suspicion),
                );
                pursuit.escalation = next;
            }
            if !pursuit.blockade && suspicion >= blockade_threshold {
                pursuit.blockade = true;
                events.push(blockade(&faction, suspicion));
            }
        }
    }

    fn decay_bounties(&mut self, delta_hours: f64, events: &mut Vec<EventRecord>) {
        let retain = (1.0 - self.config.bounty_decay_per_hour).powf(delta_hours);
        let floor = self.config.bounty_floor;
        let mut expired = Vec::new();
        for (faction, bounty) in &mut self.bounties {
            bounty.amount *= retain;
            if bounty.amount < floor || bounty.amount <= 0.0 {
                expired.push(faction.clone());
            }
        }
        for faction in expired {
            self.bounties.remove(&faction);
            events.push(EventRecord::new(WorldEventType::BountyExpired).with("faction", faction.as_str()));
        }
    }

    fn open_investigations(&mut self, events: &mut Vec<EventRecord>) {
        self.cooldowns.retain(|_, until| *until > self.now);
        let candidates: Vec<(FactionId, UnitInterval)> = self
            .suspicion
            .iter()
            .filter(|(faction, level)| {
                level.get() >= self.config.investigation_threshold
                    && !self.investigations.contains_key(*faction)
                    && !self.pursuits.contains_key(*faction)
                    && !self.cooldowns.contains_key(*faction)
            })
            .map(|(faction, level)| (faction.clone(), *level))
            .collect();

        for (faction, suspicion) in candidates {
            let evidence = self
                .crimes
                .iter()
                .filter(|c| c.factions.contains(&faction))
                .map(|c| c.id)
                .collect();
            tracing::debug!(faction = %faction, suspicion = suspicion.get(), "investigation started");
            events.push(
                EventRecord::new(WorldEventType::InvestigationStarted)
                    .with("faction", faction.as_str())
                    .with("suspicion", suspicion.get())
                    .with("duration_hours", self.config.investigation_hours),
            );
            self.investigations.insert(
                faction.clone(),
                Investigation {
                    faction,
                    suspicion,
                    started_at: self.now,
                    remaining_hours: self.config.investigation_hours,
                    evidence,
                },
            );
        }
    }
}

fn cleared(faction: &FactionId) -> EventRecord {
    EventRecord::new(WorldEventType::SuspicionCleared).with("faction", faction.as_str())
}

fn blockade(faction: &FactionId, suspicion: f64) -> EventRecord {
    EventRecord::new(WorldEventType::BlockadeActivated)
        .with("faction", faction.as_str())
        .with("suspicion", suspicion)
}

impl Subsystem for LawSystem {
    fn name(&self) -> &'static str {
        "law"
    }

    fn update(&mut self, ctx: &TickContext<'_>) -> SimResult<Vec<EventRecord>> {
        Ok(self.tick(ctx.delta_hours, ctx.player))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keepers() -> FactionId {
        FactionId::new("Keepers").unwrap()
    }

    fn here() -> SectorId {
        SectorId::new("meridian").unwrap()
    }

    fn count(events: &[EventRecord], event_type: WorldEventType) -> usize {
        events.iter().filter(|e| e.event_type == event_type).count()
    }

    fn run(law: &mut LawSystem, hours: f64, step: f64) -> Vec<EventRecord> {
        let player = PlayerState::default();
        let mut events = Vec::new();
        let mut elapsed = 0.0;
        while elapsed < hours {
            events.extend(law.tick(step, &player));
            elapsed += step;
        }
        events
    }

    #[test]
    fn report_raises_suspicion_by_formula() {
        let mut law = LawSystem::new(LawConfig::default(), 1);
        law.report_crime(CrimeType::Assault, 3, here(), Vec::new(), vec![keepers()])
            .unwrap();
        assert!((law.suspicion(&keepers()) - 0.45).abs() < 1e-12);
        assert_eq!(law.suspicion(&FactionId::new("Nobody").unwrap()), 0.0);
        assert_eq!(law.crimes().len(), 1);
    }

    #[test]
    fn severity_out_of_range_rejected() {
        let mut law = LawSystem::new(LawConfig::default(), 1);
        for severity in [0, 6] {
            let err = law
                .report_crime(CrimeType::Theft, severity, here(), Vec::new(), vec![keepers()])
                .unwrap_err();
            assert!(matches!(err, SimError::InvalidSeverity(s) if s == severity));
        }
        assert!(law.crimes().is_empty());
    }

    #[test]
    fn unknown_crime_string_rejected() {
        let mut law = LawSystem::new(LawConfig::default(), 1);
        assert!(law
            .report_crime_str("jaywalking", 2, here(), Vec::new(), vec![keepers()])
            .is_err());
        assert!(law
            .report_crime_str("smuggling", 2, here(), Vec::new(), vec![keepers()])
            .is_ok());
    }

    #[test]
    fn suspicion_clamps_at_one() {
        let mut law = LawSystem::new(LawConfig::default(), 1);
        for _ in 0..5 {
            law.report_crime(CrimeType::Murder, 5, here(), Vec::new(), vec![keepers()])
                .unwrap();
        }
        assert_eq!(law.suspicion(&keepers()), 1.0);
    }

    #[test]
    fn crime_events_emitted_on_next_tick() {
        let mut law = LawSystem::new(LawConfig::default(), 1);
        law.report_crime(CrimeType::Murder, 5, here(), Vec::new(), vec![keepers()])
            .unwrap();
        let events = law.tick(0.1, &PlayerState::default());
        assert_eq!(count(&events, WorldEventType::CrimeReported), 1);
        assert_eq!(count(&events, WorldEventType::BountyPosted), 1);
        assert_eq!(count(&events, WorldEventType::InvestigationStarted), 1);
        let bounty = law.bounty(&keepers()).unwrap();
        assert!(bounty.amount > 1700.0 && bounty.amount <= 1750.0);
    }

    #[test]
    fn witnesses_file_reports() {
        let config = LawConfig {
            witness_report_chance: 1.0,
            ..LawConfig::default()
        };
        let mut law = LawSystem::new(config, 1);
        let other = FactionId::new("Ashen Compact").unwrap();
        law.report_crime(
            CrimeType::Theft,
            2,
            here(),
            vec!["dockhand".into(), "pilot".into()],
            vec![keepers(), other, keepers()],
        )
        .unwrap();
        assert_eq!(law.crimes()[0].factions.len(), 2);
        assert_eq!(law.witness_reports().len(), 4);
        for report in law.witness_reports() {
            assert!((0.4..=1.0).contains(&report.reliability.get()));
        }
    }

    #[test]
    fn suspicion_decays_to_cleared() {
        let mut law = LawSystem::new(LawConfig::default(), 1);
        law.report_crime(CrimeType::Trespass, 1, here(), Vec::new(), vec![keepers()])
            .unwrap();
        let events = run(&mut law, 6.0, 1.0);
        assert_eq!(count(&events, WorldEventType::SuspicionCleared), 1);
        assert_eq!(law.suspicion(&keepers()), 0.0);
        assert!(law.suspicion_levels().is_empty());
    }

    #[test]
    fn disguise_speeds_decay_and_weapon_slows_it() {
        let mut plain = LawSystem::new(LawConfig::default(), 1);
        let mut disguised = LawSystem::new(LawConfig::default(), 1);
        let mut armed = LawSystem::new(LawConfig::default(), 1);
        for law in [&mut plain, &mut disguised, &mut armed] {
            law.report_crime(CrimeType::Theft, 2, here(), Vec::new(), vec![keepers()])
                .unwrap();
        }
        plain.tick(1.0, &PlayerState::default());
        disguised.tick(
            1.0,
            &PlayerState {
                disguise: Some("courier".into()),
                ..PlayerState::default()
            },
        );
        armed.tick(
            1.0,
            &PlayerState {
                weapon_readied: true,
                ..PlayerState::default()
            },
        );
        assert!(disguised.suspicion(&keepers()) < plain.suspicion(&keepers()));
        assert!(armed.suspicion(&keepers()) > plain.suspicion(&keepers()));
    }

    #[test]
    fn inconclusive_investigation_cools_down() {
        let mut law = LawSystem::new(LawConfig::default(), 1);
        law.report_crime(CrimeType::Assault, 3, here(), Vec::new(), vec![keepers()])
            .unwrap();
        let events = run(&mut law, 10.0, 0.25);
        assert_eq!(count(&events, WorldEventType::InvestigationStarted), 1);
        assert_eq!(count(&events, WorldEventType::InvestigationConcluded), 1);
        assert_eq!(count(&events, WorldEventType::PursuitInitiated), 0);
        assert!(law.investigation(&keepers()).is_none());
    }

    #[test]
    fn high_suspicion_leads_to_pursuit_and_escalation() {
        let mut law = LawSystem::new(LawConfig::default(), 1);
        law.report_crime(CrimeType::Murder, 3, here(), Vec::new(), vec![keepers()])
            .unwrap();
        let player = PlayerState::default();
        let mut initiated = Vec::new();
        for _ in 0..40 {
            initiated = law.tick(0.25, &player);
            if count(&initiated, WorldEventType::PursuitInitiated) == 1 {
                break;
            }
        }
        assert_eq!(count(&initiated, WorldEventType::PursuitInitiated), 1);
        let pursuit = law.pursuit(&keepers()).unwrap().clone();
        assert_eq!(pursuit.escalation, EscalationLevel::Warning);
        assert!(pursuit.ships >= 1);

        let events = law.tick(0.25, &player);
        assert_eq!(count(&events, WorldEventType::PursuitEscalated), 1);
        assert_eq!(
            law.pursuit(&keepers()).unwrap().escalation,
            EscalationLevel::Arrest
        );

        law.report_crime(CrimeType::Murder, 5, here(), Vec::new(), vec![keepers()])
            .unwrap();
        let events = law.tick(0.25, &PlayerState::default());
        assert_eq!(count(&events, WorldEventType::PursuitEscalated), 1);
        assert_eq!(count(&events, WorldEventType::BlockadeActivated), 1);
        let pursuit = law.pursuit(&keepers()).unwrap();
        assert_eq!(pursuit.escalation, EscalationLevel::Lethal);
        assert!(pursuit.blockade);
        assert_eq!(pursuit.ships, 6);

        assert!(law.resolve_pursuit(&keepers()));
        assert!(!law.resolve_pursuit(&keepers()));
        let events = law.tick(0.25, &PlayerState::default());
        assert_eq!(count(&events, WorldEventType::PursuitResolved), 1);
    }

    #[test]
    fn pursuit_is_abandoned_when_time_runs_out() {
        let config = LawConfig {
            pursuit_hours: 2.0,
            ..LawConfig::default()
        };
        let mut law = LawSystem::new(config, 1);
        law.report_crime(CrimeType::Murder, 3, here(), Vec::new(), vec![keepers()])
            .unwrap();
        let events = run(&mut law, 9.0, 0.25);
        assert_eq!(count(&events, WorldEventType::PursuitAbandoned), 1);
        assert!(law.pursuit(&keepers()).is_none());
    }

    #[test]
    fn bounty_decays_and_expires() {
        let config = LawConfig {
            bounty_decay_per_hour: 0.5,
            bounty_floor: 100.0,
            ..LawConfig::default()
        };
        let mut law = LawSystem::new(config, 1);
        law.report_crime(CrimeType::Assault, 4, here(), Vec::new(), vec![keepers()])
            .unwrap();
        let events = run(&mut law, 6.0, 1.0);
        assert_eq!(count(&events, WorldEventType::BountyExpired), 1);
        assert!(law.bounty(&keepers()).is_none());
    }

    #[test]
    fn clear_suspicion_reduces_and_clears() {
        let mut law = LawSystem::new(LawConfig::default(), 1);
        law.report_crime(CrimeType::Theft, 3, here(), Vec::new(), vec![keepers()])
            .unwrap();
        let left = law.clear_suspicion(&keepers(), 0.1);
        assert!((left - 0.2).abs() < 1e-12);
        assert_eq!(law.clear_suspicion(&keepers(), 1.0), 0.0);
        let events = law.tick(0.1, &PlayerState::default());
        assert_eq!(count(&events, WorldEventType::SuspicionCleared), 1);
    }

    #[test]
    fn snapshot_round_trip() {
        let mut law = LawSystem::new(LawConfig::default(), 1);
        law.report_crime(CrimeType::Murder, 4, here(), vec!["pilot".into()], vec![keepers()])
            .unwrap();
        run(&mut law, 7.0, 0.25);
        let snapshot = law.snapshot();
        let json = serde_json::to_string(&snapshot).unwrap();

        let mut restored = LawSystem::new(LawConfig::default(), 1);
        restored.restore(serde_json::from_str(&json).unwrap(), 1, 28);
        assert_eq!(restored.snapshot(), snapshot);
    }
}
