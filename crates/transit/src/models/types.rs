//! Core data types and enums for directory data.

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::identifiers::*;

// ============================================================================
// Enums
// ============================================================================

/// Fixed set of metro line colors.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Display, EnumIter, EnumString, IntoStaticStr,
)]
pub enum LineColor {
    Red,
    Blue,
    Green,
    Orange,
    Brown,
    Yellow,
    /// Wanda line
    LightGreen,
}

impl LineColor {
    pub fn hex(self) -> &'static str {
        match self {
            Self::Red => "#E3002C",
            Self::Blue => "#0070BD",
            Self::Green => "#008659",
            Self::Orange => "#F8B61C",
            Self::Brown => "#C48C31",
            Self::Yellow => "#FFD306",
            Self::LightGreen => "#A3D063",
        }
    }

    pub fn from_hex(value: &str) -> Option<Self> {
        use strum::IntoEnumIterator;

        Self::iter().find(|color| color.hex().eq_ignore_ascii_case(value))
    }
}

impl<'de> Deserialize<'de> for LineColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;

        LineColor::from_str(&raw)
            .ok()
            .or_else(|| LineColor::from_hex(&raw))
            .ok_or_else(|| serde::de::Error::custom(format!("unknown line color: {raw}")))
    }
}

// ============================================================================
// Data Structures
// ============================================================================

/// WGS84 position in degrees.
///
/// Entries in the directory may carry a missing or non-numeric component; those
/// deserialize to NaN and are rejected by [`Coordinates::is_valid`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    #[serde(default = "f64_nan", deserialize_with = "lenient_f64")]
    pub lat: f64,
    #[serde(default = "f64_nan", deserialize_with = "lenient_f64")]
    pub lng: f64,
}

impl Coordinates {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub const fn missing() -> Self {
        Self::new(f64::NAN, f64::NAN)
    }

    /// Both components are finite numbers.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    /// geo uses x = longitude, y = latitude
    pub fn to_point(self) -> geo::Point {
        geo::Point::new(self.lng, self.lat)
    }
}

impl Default for Coordinates {
    fn default() -> Self {
        Self::missing()
    }
}

fn f64_nan() -> f64 {
    f64::NAN
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<f64, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_f64().unwrap_or(f64::NAN))
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum TransitError {
    #[error("Duplicate station id in directory: {0}")]
    DuplicateStation(StationIdentifier),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for TransitError {
    fn from(error: serde_json::Error) -> Self {
        TransitError::SerializationError(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TransitError>;
