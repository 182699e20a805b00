// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use serde::{Deserialize, Serialize};

/// Model units as recorded in container settings.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    /// Millimetres.
    Mm,
    /// Centimetres.
    Cm,
    /// Decimetres.
    Dm,
    /// Metres.
    M,
    /// International feet.
    Ft,
    /// Inches.
    In,
    /// Unrecorded; treated as millimetres.
    #[default]
    #[serde(other)]
    Unknown,
}

impl Units {
    /// Multiplier converting a length in these units to millimetres.
    pub fn scale_to_mm(self) -> f64 {
        match self {
            Self::Mm | Self::Unknown => 1.0,
            Self::Cm => 10.0,
            Self::Dm => 100.0,
            Self::M => 1000.0,
            Self::Ft => 304.8,
            Self::In => 25.4,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn unknown_units_deserialize_as_millimetres() {
        let u: Units = serde_json::from_str("\"furlong\"").unwrap();
        assert_eq!(u, Units::Unknown);
        assert_eq!(u.scale_to_mm(), 1.0);
        let m: Units = serde_json::from_str("\"m\"").unwrap();
        assert_eq!(m.scale_to_mm(), 1000.0);
    }
}
