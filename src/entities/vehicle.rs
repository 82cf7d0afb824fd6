use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleClass {
    LuxurySuv,
    TransitVan,
}

impl VehicleClass {
    pub const ALL: [VehicleClass; 2] = [VehicleClass::LuxurySuv, VehicleClass::TransitVan];

    /// Canonical token stored in the database and used as the fleet row key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LuxurySuv => "LUXURY_SUV",
            Self::TransitVan => "TRANSIT_VAN",
        }
    }

    /// Customer-facing name, also used in checkout line items.
    pub fn label(&self) -> &'static str {
        match self {
            Self::LuxurySuv => "Luxury SUV (5 Passengers)",
            Self::TransitVan => "Transit Van (14 Passengers)",
        }
    }
}

impl fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
