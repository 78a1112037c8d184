//! Core values: the thematic tags shared by communities and modules.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A thematic tag categorizing communities and training modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoreValue {
    /// Air quality.
    CleanAir,
    /// Water stewardship.
    CleanWater,
    /// Urban safety and mobility.
    SafeCities,
    /// Waste reduction and recycling.
    ZeroWaste,
    /// Ethical supply chains.
    FairTrade,
    /// Ecosystems and species.
    Biodiversity,
}

impl CoreValue {
    /// Every core value, in display order.
    pub const ALL: [CoreValue; 6] = [
        CoreValue::CleanAir,
        CoreValue::CleanWater,
        CoreValue::SafeCities,
        CoreValue::ZeroWaste,
        CoreValue::FairTrade,
        CoreValue::Biodiversity,
    ];

    /// Wire/database representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CleanAir => "clean_air",
            Self::CleanWater => "clean_water",
            Self::SafeCities => "safe_cities",
            Self::ZeroWaste => "zero_waste",
            Self::FairTrade => "fair_trade",
            Self::Biodiversity => "biodiversity",
        }
    }

    /// Human-readable label used in reports and emails.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::CleanAir => "Aire limpio",
            Self::CleanWater => "Agua limpia",
            Self::SafeCities => "Ciudades seguras",
            Self::ZeroWaste => "Cero residuos",
            Self::FairTrade => "Comercio justo",
            Self::Biodiversity => "Biodiversidad",
        }
    }
}

impl fmt::Display for CoreValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CoreValue {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|value| value.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("Valor central desconocido: {s}")))
    }
}
