//! Static per-area metadata used to seed the simulation.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::id::{BiomeId, FactionId, RegionId, SectorId, SpeciesId};
use crate::kind::WeatherState;

const BUILTIN_REGIONS: &str = include_str!("../data/regions.json");

/// A named area of space. Read at initialization, never mutated by the simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Unique region identifier.
    pub id: RegionId,
    /// Display name.
    pub name: String,
    /// Sector the region lies in.
    pub sector: SectorId,
    /// Biome wildlife is tracked under.
    pub biome: BiomeId,
    /// Faction that polices the region, if any.
    #[serde(default)]
    pub dominant_faction: Option<FactionId>,
    /// Weather the region starts in.
    pub default_weather: WeatherState,
    /// Species present in the region.
    #[serde(default)]
    pub wildlife: Vec<SpeciesId>,
    /// Multiplier on patrol spawning; zero disables the default patrol route.
    #[serde(default)]
    pub patrol_density: f64,
}

#[derive(Deserialize)]
struct RegionDocument {
    regions: Vec<Region>,
}

/// All known regions, keyed by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionCatalog {
    regions: BTreeMap<RegionId, Region>,
}

impl RegionCatalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `{ "regions": [...] }` document. Duplicate ids are rejected.
    pub fn from_json_str(json: &str) -> CoreResult<Self> {
        let doc: RegionDocument = serde_json::from_str(json)?;
        let mut catalog = Self::new();
        for region in doc.regions {
            if !region.patrol_density.is_finite() || region.patrol_density < 0.0 {
                return Err(CoreError::InvalidConfig(format!(
                    "region {} has invalid patrol_density {}",
                    region.id, region.patrol_density
                )));
            }
            if catalog.regions.contains_key(&region.id) {
                return Err(CoreError::InvalidConfig(format!(
                    "duplicate region id {}",
                    region.id
                )));
            }
            catalog.insert(region);
        }
        Ok(catalog)
    }

    /// Read and parse a region document.
    pub fn load(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| CoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json_str(&json)?;
        tracing::info!(path = %path.display(), regions = catalog.len(), "region catalog loaded");
        Ok(catalog)
    }

    /// The regions bundled with the crate.
    pub fn builtin() -> CoreResult<Self> {
        Self::from_json_str(BUILTIN_REGIONS)
    }

    /// Add or replace a region.
    pub fn insert(&mut self, region: Region) {
        self.regions.insert(region.id.clone(), region);
    }

    /// Look up a region.
    pub fn get(&self, id: &RegionId) -> Option<&Region> {
        self.regions.get(id)
    }

    /// Iterate regions in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.values()
    }

    /// Number of regions.
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_regions_parse() {
        let catalog = RegionCatalog::builtin().unwrap();
        assert!(!catalog.is_empty());
        let meridian = catalog
            .get(&RegionId::new("meridian_station").unwrap())
            .unwrap();
        assert_eq!(meridian.default_weather, WeatherState::Clear);
        assert_eq!(
            meridian.dominant_faction.as_ref().map(FactionId::as_str),
            Some("Keepers")
        );
    }

    #[test]
    fn optional_fields_default() {
        let json = r#"{ "regions": [
            { "id": "void", "name": "Void", "sector": "s", "biome": "b", "default_weather": "clear" }
        ] }"#;
        let catalog = RegionCatalog::from_json_str(json).unwrap();
        let region = catalog.get(&RegionId::new("void").unwrap()).unwrap();
        assert!(region.dominant_faction.is_none());
        assert!(region.wildlife.is_empty());
        assert_eq!(region.patrol_density, 0.0);
    }

    #[test]
    fn duplicate_region_rejected() {
        let json = r#"{ "regions": [
            { "id": "a", "name": "A", "sector": "s", "biome": "b", "default_weather": "clear" },
            { "id": "a", "name": "A2", "sector": "s", "biome": "b", "default_weather": "clear" }
        ] }"#;
        assert!(matches!(
            RegionCatalog::from_json_str(json),
            Err(CoreError::InvalidConfig(_))
        ));
    }

    #[test]
    fn unknown_weather_rejected() {
        let json = r#"{ "regions": [
            { "id": "a", "name": "A", "sector": "s", "biome": "b", "default_weather": "fog" }
        ] }"#;
        assert!(RegionCatalog::from_json_str(json).is_err());
    }
}
