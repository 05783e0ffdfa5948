//! Closed enumerations shared between configuration and simulation.
//!
//! Each one round-trips through a snake_case wire tag; unknown tags are
//! rejected rather than coerced.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Weather
// ---------------------------------------------------------------------------

/// The weather condition of a sector.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum WeatherState {
    /// Open space, nothing in the way.
    #[default]
    Clear,
    /// Thin gas cloud; mild sensor interference.
    LightNebula,
    /// Thick gas cloud; heavy sensor interference.
    DenseNebula,
    /// Drifting rock field.
    AsteroidField,
    /// Wreckage and scrap.
    DebrisField,
    /// Charged-particle storm.
    IonStorm,
    /// Stellar radiation burst.
    SolarFlare,
}

impl WeatherState {
    /// Every state, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Clear,
        Self::LightNebula,
        Self::DenseNebula,
        Self::AsteroidField,
        Self::DebrisField,
        Self::IonStorm,
        Self::SolarFlare,
    ];

    /// The wire tag.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::LightNebula => "light_nebula",
            Self::DenseNebula => "dense_nebula",
            Self::AsteroidField => "asteroid_field",
            Self::DebrisField => "debris_field",
            Self::IonStorm => "ion_storm",
            Self::SolarFlare => "solar_flare",
        }
    }
}

impl FromStr for WeatherState {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == tag)
            .ok_or_else(|| CoreError::UnknownWeatherState(s.to_string()))
    }
}

impl fmt::Display for WeatherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Law
// ---------------------------------------------------------------------------

/// The category of a reported crime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrimeType {
    /// Entering restricted space or property.
    Trespass,
    /// Stealing goods or credits.
    Theft,
    /// Moving contraband.
    Smuggling,
    /// Violence against a person or ship.
    Assault,
    /// Killing.
    Murder,
}

impl CrimeType {
    /// Every crime type, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Trespass,
        Self::Theft,
        Self::Smuggling,
        Self::Assault,
        Self::Murder,
    ];

    /// The wire tag.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trespass => "trespass",
            Self::Theft => "theft",
            Self::Smuggling => "smuggling",
            Self::Assault => "assault",
            Self::Murder => "murder",
        }
    }
}

impl FromStr for CrimeType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == tag)
            .ok_or_else(|| CoreError::UnknownCrimeType(s.to_string()))
    }
}

impl fmt::Display for CrimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Traffic
// ---------------------------------------------------------------------------

/// The role of a ship in sector traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipType {
    /// Merchant hauling cargo along a trade lane.
    Trader,
    /// Faction enforcement ship cycling a patrol route.
    Patrol,
    /// Private or passenger traffic.
    Civilian,
    /// Raider.
    Pirate,
}

impl ShipType {
    /// Every ship type, in declaration order.
    pub const ALL: [Self; 4] = [Self::Trader, Self::Patrol, Self::Civilian, Self::Pirate];

    /// The wire tag.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trader => "trader",
            Self::Patrol => "patrol",
            Self::Civilian => "civilian",
            Self::Pirate => "pirate",
        }
    }
}

impl FromStr for ShipType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == tag)
            .ok_or_else(|| CoreError::UnknownShipType(s.to_string()))
    }
}

impl fmt::Display for ShipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weather_state_parses_tags() {
        assert_eq!(
            "ion_storm".parse::<WeatherState>().unwrap(),
            WeatherState::IonStorm
        );
        assert_eq!(
            " Clear ".parse::<WeatherState>().unwrap(),
            WeatherState::Clear
        );
        assert!(matches!(
            "hail".parse::<WeatherState>(),
            Err(CoreError::UnknownWeatherState(s)) if s == "hail"
        ));
    }

    #[test]
    fn serde_tag_matches_as_str() {
        for state in WeatherState::ALL {
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(json, format!("\"{}\"", state.as_str()));
        }
        for kind in CrimeType::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn unknown_tag_rejected_on_deserialize() {
        assert!(serde_json::from_str::<ShipType>("\"freighter\"").is_err());
        assert!(serde_json::from_str::<CrimeType>("\"arson\"").is_err());
    }

    #[test]
    fn crime_and_ship_parse() {
        assert_eq!("assault".parse::<CrimeType>().unwrap(), CrimeType::Assault);
        assert_eq!("PIRATE".parse::<ShipType>().unwrap(), ShipType::Pirate);
    }
}
