//! World event types and records.
//!
//! Subsystems return [`EventRecord`]s; the event bus stamps them with an id
//! and timestamp to produce [`WorldEvent`]s.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use wf_core::EventId;

/// The subsystem an event type belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventOrigin {
    /// Weather subsystem.
    Weather,
    /// Wildlife subsystem.
    Wildlife,
    /// Traffic subsystem.
    Traffic,
    /// Law subsystem.
    Law,
    /// Synthesized by the coordinator from co-occurring events.
    CrossSystem,
}

/// Every event the simulation can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorldEventType {
    // Weather
    /// A sector moved to a new weather state.
    WeatherChanged,
    /// A hazard began in a sector.
    WeatherHazardStarted,
    /// A hazard ran its course.
    WeatherHazardEnded,

    // Wildlife
    /// A creature appeared near the observer.
    CreatureSpawned,
    /// A predator started hunting.
    PredatorStalking,
    /// A predator caught its prey.
    PredatorKill,
    /// Prey got away and is fleeing.
    PreyEscape,
    /// Part of a population left the biome.
    Migration,

    // Traffic
    /// A trader entered the sector.
    TraderSpawned,
    /// A pirate entered the sector.
    PirateSpawned,
    /// A civilian ship entered the sector.
    CivilianSpawned,
    /// A patrol ship started its route.
    PatrolSpawned,
    /// A non-patrol ship reached its destination and left.
    ShipArrived,
    /// Sector traffic is above the congestion threshold.
    TrafficCongestion,
    /// A patrol's sensors reached the observer.
    PatrolScan,

    // Law
    /// A crime was recorded.
    CrimeReported,
    /// A bounty was posted or raised.
    BountyPosted,
    /// A bounty decayed away.
    BountyExpired,
    /// A faction's suspicion returned to zero.
    SuspicionCleared,
    /// A faction opened an investigation.
    InvestigationStarted,
    /// An investigation closed without a pursuit.
    InvestigationConcluded,
    /// A faction began pursuing the player.
    PursuitInitiated,
    /// A pursuit moved up the escalation ladder.
    PursuitEscalated,
    /// A pursuing faction set up a blockade.
    BlockadeActivated,
    /// A pursuit ran out of time.
    PursuitAbandoned,
    /// A pursuit was resolved from outside the simulation.
    PursuitResolved,

    // Cross-system
    /// Someone in the sector is calling for help.
    DistressSignal,
}

impl WorldEventType {
    /// Every event type, in declaration order.
    pub const ALL: [Self; 27] = [
        Self::WeatherChanged,
        Self::WeatherHazardStarted,
        Self::WeatherHazardEnded,
        Self::CreatureSpawned,
        Self::PredatorStalking,
        Self::PredatorKill,
        Self::PreyEscape,
        Self::Migration,
        Self::TraderSpawned,
        Self::PirateSpawned,
        Self::CivilianSpawned,
        Self::PatrolSpawned,
        Self::ShipArrived,
        Self::TrafficCongestion,
        Self::PatrolScan,
        Self::CrimeReported,
        Self::BountyPosted,
        Self::BountyExpired,
        Self::SuspicionCleared,
        Self::InvestigationStarted,
        Self::InvestigationConcluded,
        Self::PursuitInitiated,
        Self::PursuitEscalated,
        Self::BlockadeActivated,
        Self::PursuitAbandoned,
        Self::PursuitResolved,
        Self::DistressSignal,
    ];

    /// The wire tag.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WeatherChanged => "weather_changed",
            Self::WeatherHazardStarted => "weather_hazard_started",
            Self::WeatherHazardEnded => "weather_hazard_ended",
            Self::CreatureSpawned => "creature_spawned",
            Self::PredatorStalking => "predator_stalking",
            Self::PredatorKill => "predator_kill",
            Self::PreyEscape => "prey_escape",
            Self::Migration => "migration",
            Self::TraderSpawned => "trader_spawned",
            Self::PirateSpawned => "pirate_spawned",
            Self::CivilianSpawned => "civilian_spawned",
            Self::PatrolSpawned => "patrol_spawned",
            Self::ShipArrived => "ship_arrived",
            Self::TrafficCongestion => "traffic_congestion",
            Self::PatrolScan => "patrol_scan",
            Self::CrimeReported => "crime_reported",
            Self::BountyPosted => "bounty_posted",
            Self::BountyExpired => "bounty_expired",
            Self::SuspicionCleared => "suspicion_cleared",
            Self::InvestigationStarted => "investigation_started",
            Self::InvestigationConcluded => "investigation_concluded",
            Self::PursuitInitiated => "pursuit_initiated",
            Self::PursuitEscalated => "pursuit_escalated",
            Self::BlockadeActivated => "blockade_activated",
            Self::PursuitAbandoned => "pursuit_abandoned",
            Self::PursuitResolved => "pursuit_resolved",
            Self::DistressSignal => "distress_signal",
        }
    }

    /// The subsystem that emits this event type.
    pub fn origin(self) -> EventOrigin {
        match self {
            Self::WeatherChanged | Self::WeatherHazardStarted | Self::WeatherHazardEnded => {
                EventOrigin::Weather
            }
            Self::CreatureSpawned
            | Self::PredatorStalking
            | Self::PredatorKill
            | Self::PreyEscape
            | Self::Migration => EventOrigin::Wildlife,
            Self::TraderSpawned
            | Self::PirateSpawned
            | Self::CivilianSpawned
            | Self::PatrolSpawned
            | Self::ShipArrived
            | Self::TrafficCongestion
            | Self::PatrolScan => EventOrigin::Traffic,
            Self::CrimeReported
            | Self::BountyPosted
            | Self::BountyExpired
            | Self::SuspicionCleared
            | Self::InvestigationStarted
            | Self::InvestigationConcluded
            | Self::PursuitInitiated
            | Self::PursuitEscalated
            | Self::BlockadeActivated
            | Self::PursuitAbandoned
            | Self::PursuitResolved => EventOrigin::Law,
            Self::DistressSignal => EventOrigin::CrossSystem,
        }
    }
}

/// Returned when parsing an unknown event tag.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown event type: {0}")]
pub struct UnknownEventType(pub String);

impl FromStr for WorldEventType {
    type Err = UnknownEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownEventType(s.to_string()))
    }
}

impl fmt::Display for WorldEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// An unpublished event produced by a subsystem.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    /// What happened.
    pub event_type: WorldEventType,
    /// Subsystem-specific payload.
    pub data: Map<String, Value>,
}

impl EventRecord {
    /// A record with an empty payload.
    pub fn new(event_type: WorldEventType) -> Self {
        Self {
            event_type,
            data: Map::new(),
        }
    }

    /// Add a payload field.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }
}

/// An event record whose type is still an unparsed string, as received from
/// outside the crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEventRecord {
    /// Wire tag of the event type.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Payload.
    #[serde(default, flatten)]
    pub data: Map<String, Value>,
}

/// A published event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldEvent {
    /// Monotonic id assigned by the bus.
    pub id: EventId,
    /// What happened.
    pub event_type: WorldEventType,
    /// Subsystem-specific payload.
    #[serde(default)]
    pub data: Map<String, Value>,
    /// Simulated hours at publication.
    pub timestamp: f64,
}

impl WorldEvent {
    /// Flatten into `{ "type", "id", "timestamp", ...data }` for external consumers.
    ///
    /// The three envelope keys win over payload keys of the same name.
    pub fn to_record(&self) -> Value {
        let mut record = self.data.clone();
        record.insert("type".into(), self.event_type.as_str().into());
        record.insert("id".into(), self.id.0.into());
        record.insert("timestamp".into(), self.timestamp.into());
        Value::Object(record)
    }

    /// A string payload field.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    /// A numeric payload field.
    pub fn f64_field(&self, key: &str) -> Option<f64> {
        self.data.get(key).and_then(Value::as_f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_tags_are_stable() {
        let tags: Vec<&str> = WorldEventType::ALL.iter().map(|t| t.as_str()).collect();
        insta::assert_snapshot!(tags.join(" "), @"weather_changed weather_hazard_started weather_hazard_ended creature_spawned predator_stalking predator_kill prey_escape migration trader_spawned pirate_spawned civilian_spawned patrol_spawned ship_arrived traffic_congestion patrol_scan crime_reported bounty_posted bounty_expired suspicion_cleared investigation_started investigation_concluded pursuit_initiated pursuit_escalated blockade_activated pursuit_abandoned pursuit_resolved distress_signal");
    }

    #[test]
    fn serde_tag_matches_as_str() {
        for event_type in WorldEventType::ALL {
            let json = serde_json::to_string(&event_type).unwrap();
            assert_eq!(json, format!("\"{}\"", event_type.as_str()));
            assert_eq!(event_type.as_str().parse::<WorldEventType>(), Ok(event_type));
        }
    }

    #[test]
    fn unknown_tag_rejected() {
        assert_eq!(
            "meteor_shower".parse::<WorldEventType>(),
            Err(UnknownEventType("meteor_shower".into()))
        );
        assert!(serde_json::from_str::<WorldEventType>("\"meteor_shower\"").is_err());
    }

    #[test]
    fn origin_groups() {
        assert_eq!(WorldEventType::WeatherHazardEnded.origin(), EventOrigin::Weather);
        assert_eq!(WorldEventType::PreyEscape.origin(), EventOrigin::Wildlife);
        assert_eq!(WorldEventType::PatrolScan.origin(), EventOrigin::Traffic);
        assert_eq!(WorldEventType::BlockadeActivated.origin(), EventOrigin::Law);
        assert_eq!(WorldEventType::DistressSignal.origin(), EventOrigin::CrossSystem);
    }

    #[test]
    fn to_record_flattens_payload() {
        let event = WorldEvent {
            id: EventId(7),
            event_type: WorldEventType::CrimeReported,
            data: EventRecord::new(WorldEventType::CrimeReported)
                .with("severity", 3u64)
                .with("type", "spoofed")
                .data,
            timestamp: 1.5,
        };
        let record = event.to_record();
        assert_eq!(record["type"], "crime_reported");
        assert_eq!(record["id"], 7);
        assert_eq!(record["timestamp"], 1.5);
        assert_eq!(record["severity"], 3);
    }

    #[test]
    fn raw_record_parses_flat_json() {
        let raw: RawEventRecord =
            serde_json::from_str(r#"{ "type": "migration", "departed": 4 }"#).unwrap();
        assert_eq!(raw.event_type, "migration");
        assert_eq!(raw.data["departed"], 4);
    }
}
