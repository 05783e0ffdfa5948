//! Versioned save format for a whole simulation.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wf_core::RegionId;

use crate::bus::EventBusSnapshot;
use crate::error::{SimError, SimResult};
use crate::law::LawSnapshot;
use crate::traffic::TrafficSnapshot;
use crate::weather::WeatherSnapshot;
use crate::wildlife::WildlifeSnapshot;

/// Format version written by this build.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Everything needed to resume a simulation.
///
/// Subsystem sections that are missing from a document fall back to empty
/// state. Unknown enumeration values anywhere are a decode error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSnapshot {
    /// Format version.
    pub version: u32,
    /// When the snapshot was taken.
    pub saved_at: DateTime<Utc>,
    /// Seed the RNG streams derive from.
    pub seed: u64,
    /// Sub-ticks run so far.
    #[serde(default)]
    pub tick: u64,
    /// Simulated hours so far.
    #[serde(default)]
    pub elapsed_hours: f64,
    /// Regions already seeded.
    #[serde(default)]
    pub initialized_regions: BTreeSet<RegionId>,
    /// Weather state.
    #[serde(default)]
    pub weather: WeatherSnapshot,
    /// Wildlife state.
    #[serde(default)]
    pub wildlife: WildlifeSnapshot,
    /// Traffic state.
    #[serde(default)]
    pub traffic: TrafficSnapshot,
    /// Law state.
    #[serde(default)]
    pub law: LawSnapshot,
    /// Event history.
    #[serde(default)]
    pub events: EventBusSnapshot,
}

impl SimulationSnapshot {
    /// Encode as pretty-printed JSON.
    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode and check the version tag.
    pub fn from_json(json: &str) -> SimResult<Self> {
        let snapshot: Self = serde_json::from_str(json)?;
        snapshot.check_version()?;
        Ok(snapshot)
    }

    pub(crate) fn check_version(&self) -> SimResult<()> {
        if self.version == SNAPSHOT_VERSION {
            Ok(())
        } else {
            Err(SimError::UnsupportedSnapshotVersion {
                found: self.version,
                expected: SNAPSHOT_VERSION,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> serde_json::Value {
        serde_json::json!({
            "version": SNAPSHOT_VERSION,
            "saved_at": "2026-03-01T12:00:00Z",
            "seed": 7,
        })
    }

    #[test]
    fn missing_sections_default_fill() {
        let snapshot = SimulationSnapshot::from_json(&minimal().to_string()).unwrap();
        assert_eq!(snapshot.seed, 7);
        assert_eq!(snapshot.tick, 0);
        assert!(snapshot.weather.conditions.is_empty());
        assert!(snapshot.events.history.is_empty());
    }

    #[test]
    fn wrong_version_rejected() {
        let mut doc = minimal();
        doc["version"] = serde_json::json!(99);
        let err = SimulationSnapshot::from_json(&doc.to_string()).unwrap_err();
        assert!(matches!(
            err,
            SimError::UnsupportedSnapshotVersion {
                found: 99,
                expected: SNAPSHOT_VERSION
            }
        ));
    }

    #[test]
    fn unknown_enum_value_is_fatal() {
        let mut doc = minimal();
        doc["weather"] = serde_json::json!({ "default_state": "acid_rain" });
        let err = SimulationSnapshot::from_json(&doc.to_string()).unwrap_err();
        assert!(matches!(err, SimError::Snapshot(_)));
    }

    #[test]
    fn malformed_json_is_snapshot_error() {
        assert!(matches!(
            SimulationSnapshot::from_json("{ not json"),
            Err(SimError::Snapshot(_))
        ));
    }
}
