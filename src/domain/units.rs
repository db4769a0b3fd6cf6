//! Weight units and conversion.
//!
//! Weights are stored in grams. Display values are a pure post-multiplication
//! by [`UnitType::factor`]; squared quantities such as variance scale by the
//! square of the factor.

use super::error::TrackerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Grams per gram.
const GRAMS_FACTOR: f64 = 1.0;

/// Kilograms per gram.
const KILOGRAMS_FACTOR: f64 = 0.001;

/// Pounds per gram.
const POUNDS_FACTOR: f64 = 0.002_204_62;

/// Weight unit selected by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitType {
    /// Grams (canonical)
    #[default]
    Grams,
    /// Kilograms
    Kilograms,
    /// Avoirdupois pounds
    Pounds,
}

impl UnitType {
    /// All units, in the order a picker lists them.
    pub const ALL: [Self; 3] = [Self::Grams, Self::Kilograms, Self::Pounds];

    /// Multiplier converting grams into this unit.
    #[must_use]
    pub const fn factor(self) -> f64 {
        match self {
            Self::Grams => GRAMS_FACTOR,
            Self::Kilograms => KILOGRAMS_FACTOR,
            Self::Pounds => POUNDS_FACTOR,
        }
    }

    /// Short symbol shown next to values.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Grams => "g",
            Self::Kilograms => "kg",
            Self::Pounds => "lb",
        }
    }

    /// Stable key used when persisting the preference.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Grams => "grams",
            Self::Kilograms => "kilograms",
            Self::Pounds => "pounds",
        }
    }

    /// Converts a gram value into this unit.
    #[must_use]
    pub fn convert(self, grams: f64) -> f64 {
        grams * self.factor()
    }

    /// Parses a persisted value, falling back to grams on anything unknown.
    ///
    /// # Examples
    ///
    /// ```
    /// use material_tracker::domain::UnitType;
    ///
    /// assert_eq!(UnitType::parse_or_default("kg"), UnitType::Kilograms);
    /// assert_eq!(UnitType::parse_or_default("stone"), UnitType::Grams);
    /// ```
    #[must_use]
    pub fn parse_or_default(raw: &str) -> Self {
        raw.parse().unwrap_or_else(|e: TrackerError| {
            tracing::warn!(error = %e, "unrecognised unit, using grams");
            Self::Grams
        })
    }
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Grams => write!(f, "Grams"),
            Self::Kilograms => write!(f, "Kilograms"),
            Self::Pounds => write!(f, "Pounds"),
        }
    }
}

impl FromStr for UnitType {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "grams" | "gram" | "g" => Ok(Self::Grams),
            "kilograms" | "kilogram" | "kg" => Ok(Self::Kilograms),
            "pounds" | "pound" | "lb" | "lbs" => Ok(Self::Pounds),
            _ => Err(TrackerError::InvalidUnit(s.to_string())),
        }
    }
}
