use std::fmt;

use serde::{Deserialize, Serialize};

/// A directed airport corridor with a flat fare. The wire names are the
/// legacy route keys and must not change while old clients are live.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corridor {
    #[serde(rename = "YYC-Canmore")]
    YycToCanmore,
    #[serde(rename = "YYC-Banff")]
    YycToBanff,
    #[serde(rename = "Canmore-YYC")]
    CanmoreToYyc,
    #[serde(rename = "Banff-YYC")]
    BanffToYyc,
}

impl Corridor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::YycToCanmore => "YYC-Canmore",
            Self::YycToBanff => "YYC-Banff",
            Self::CanmoreToYyc => "Canmore-YYC",
            Self::BanffToYyc => "Banff-YYC",
        }
    }

    pub fn reverse(&self) -> Self {
        match self {
            Self::YycToCanmore => Self::CanmoreToYyc,
            Self::YycToBanff => Self::BanffToYyc,
            Self::CanmoreToYyc => Self::YycToCanmore,
            Self::BanffToYyc => Self::YycToBanff,
        }
    }
}

impl fmt::Display for Corridor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
