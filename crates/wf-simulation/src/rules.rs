//! Cross-system rules: co-occurring events within one sub-tick that together
//! mean something none of them means alone.

use std::collections::BTreeSet;

use wf_core::SectorId;

use crate::event::{EventRecord, WorldEvent, WorldEventType};

/// The part an event can play in a cross-system rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Trigger {
    Hazard,
    Congestion,
    Stalking,
    TraderSpawn,
}

/// Classify an event type. Every type is listed so that adding one forces a
/// decision here.
fn trigger_of(event_type: WorldEventType) -> Option<Trigger> {
    use WorldEventType::*;

    match event_type {
        WeatherHazardStarted => Some(Trigger::Hazard),
        TrafficCongestion => Some(Trigger::Congestion),
        PredatorStalking => Some(Trigger::Stalking),
        TraderSpawned => Some(Trigger::TraderSpawn),
        WeatherChanged
        | WeatherHazardEnded
        | CreatureSpawned
        | PredatorKill
        | PreyEscape
        | Migration
        | PirateSpawned
        | CivilianSpawned
        | PatrolSpawned
        | ShipArrived
        | PatrolScan
        | CrimeReported
        | BountyPosted
        | BountyExpired
        | SuspicionCleared
        | InvestigationStarted
        | InvestigationConcluded
        | PursuitInitiated
        | PursuitEscalated
        | BlockadeActivated
        | PursuitAbandoned
        | PursuitResolved
        | DistressSignal => None,
    }
}

struct Rule {
    requires: [Trigger; 2],
    emits: WorldEventType,
    reason: &'static str,
}

const RULES: [Rule; 2] = [
    Rule {
        requires: [Trigger::Hazard, Trigger::Congestion],
        emits: WorldEventType::DistressSignal,
        reason: "hazard_congestion",
    },
    Rule {
        requires: [Trigger::Stalking, Trigger::TraderSpawn],
        emits: WorldEventType::DistressSignal,
        reason: "predator_near_trader",
    },
];

/// Evaluate the rule table over one sub-tick's published events.
pub fn synthesize(events: &[WorldEvent], sector: &SectorId) -> Vec<EventRecord> {
    let present: BTreeSet<Trigger> = events
        .iter()
        .filter_map(|e| trigger_of(e.event_type))
        .collect();

    let mut records = Vec::new();
    for rule in &RULES {
        if !rule.requires.iter().all(|t| present.contains(t)) {
            continue;
        }
        let sources: Vec<u64> = events
            .iter()
            .filter(|e| trigger_of(e.event_type).is_some_and(|t| rule.requires.contains(&t)))
            .map(|e| e.id.0)
            .collect();
        records.push(
            EventRecord::new(rule.emits)
                .with("reason", rule.reason)
                .with("sector", sector.as_str())
                .with("sources", sources),
        );
    }
    records
}
