//! Wire names for the domain enums.
//!
//! This is the one place where categories, transport modes, route types and
//! time slots are mapped to and from strings. JSON payloads, database columns
//! and cache entries all go through these impls, so the domain code never
//! compares strings.

use crate::models::{PlaceCategory, RouteType, TimeSlot, TransportMode};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

macro_rules! wire_names {
    ($ty:ty, $what:literal, { $($variant:path => $name:literal $(| $alias:literal)*),+ $(,)? }) => {
        impl $ty {
            /// Canonical upper-case name used on the wire.
            pub fn wire_name(&self) -> &'static str {
                match self {
                    $($variant => $name,)+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.wire_name())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_uppercase().as_str() {
                    $($name $(| $alias)* => Ok($variant),)+
                    _ => Err(format!("Invalid {}: '{}'", $what, s)),
                }
            }
        }

        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.wire_name())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

wire_names!(PlaceCategory, "place category", {
    PlaceCategory::Restaurant => "RESTAURANT",
    PlaceCategory::Leisure => "LEISURE",
    PlaceCategory::Discovery => "DISCOVERY",
    PlaceCategory::Culture => "CULTURE",
});

wire_names!(TransportMode, "transportation mode", {
    TransportMode::Walking => "WALKING" | "WALK",
    TransportMode::Bicycle => "BICYCLE" | "BIKE" | "CYCLING",
    TransportMode::PublicTransport => "PUBLIC_TRANSPORT" | "TRANSIT",
    TransportMode::Car => "CAR" | "DRIVING",
    TransportMode::Mixed => "MIXED",
});

wire_names!(RouteType, "route type", {
    RouteType::Economic => "ECONOMIC",
    RouteType::Balanced => "BALANCED",
    RouteType::Comfort => "COMFORT",
});

wire_names!(TimeSlot, "time slot", {
    TimeSlot::Morning => "MORNING",
    TimeSlot::Afternoon => "AFTERNOON",
    TimeSlot::Evening => "EVENING",
});
