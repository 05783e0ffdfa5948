use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Validate and wrap an identifier. Surrounding whitespace is trimmed;
            /// an empty result is rejected.
            pub fn new(value: impl Into<String>) -> CoreResult<Self> {
                let value = value.into();
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(CoreError::InvalidId {
                        kind: $kind,
                        value,
                    });
                }
                Ok(Self(trimmed.to_string()))
            }

            /// Wrap a literal known to be valid.
            #[allow(dead_code)]
            pub(crate) fn literal(value: &str) -> Self {
                Self(value.to_string())
            }

            /// The identifier text.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = CoreError;

            fn try_from(value: String) -> CoreResult<Self> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = CoreError;

            fn try_from(value: &str) -> CoreResult<Self> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> String {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identifier of a space sector (the unit traffic and weather are tracked in).
    SectorId,
    "sector"
);
string_id!(
    /// Identifier of a biome (the unit wildlife populations are tracked in).
    BiomeId,
    "biome"
);
string_id!(
    /// Identifier of a faction that witnesses crimes and enforces law.
    FactionId,
    "faction"
);
string_id!(
    /// Identifier of a wildlife species.
    SpeciesId,
    "species"
);
string_id!(
    /// Identifier of a static region definition.
    RegionId,
    "region"
);
string_id!(
    /// Identifier of a registered patrol or trade route.
    RouteId,
    "route"
);

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// The next identifier in sequence.
            pub fn next(self) -> Self {
                Self(self.0 + 1)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "-{}"), self.0)
            }
        }
    };
}

numeric_id!(
    /// Handle of a live creature.
    CreatureId,
    "creature"
);
numeric_id!(
    /// Handle of an active ship.
    ShipId,
    "ship"
);
numeric_id!(
    /// Identifier of a recorded crime.
    CrimeId,
    "crime"
);
numeric_id!(
    /// Identifier of an active weather hazard.
    HazardId,
    "hazard"
);
numeric_id!(
    /// Monotonic identifier of a published world event.
    EventId,
    "event"
);
