use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::common::error::CoreError;

pub type PlatformName = String;

/// Fixed mapping from a hardware platform to the unit its usage is accounted in.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(transparent)]
pub struct PlatformTable {
    units: BTreeMap<PlatformName, String>,
}

impl Default for PlatformTable {
    fn default() -> Self {
        [
            ("SpiNNaker", "core-hours"),
            ("BrainScaleS", "wafer-hours"),
            ("BrainScaleS-2", "chip-hours"),
            ("Spikey", "hours"),
            ("Demo", "hours"),
        ]
        .into_iter()
        .collect()
    }
}

impl<P: Into<String>, U: Into<String>> FromIterator<(P, U)> for PlatformTable {
    fn from_iter<I: IntoIterator<Item = (P, U)>>(iter: I) -> Self {
        Self {
            units: iter
                .into_iter()
                .map(|(platform, units)| (platform.into(), units.into()))
                .collect(),
        }
    }
}

impl PlatformTable {
    pub fn canonical_units(&self, platform: &str) -> Option<&str> {
        self.units.get(platform).map(|s| s.as_str())
    }

    pub fn platforms(&self) -> impl Iterator<Item = &str> {
        self.units.keys().map(|s| s.as_str())
    }

    /// Returns the canonical unit of a known platform.
    pub fn require(&self, platform: &str) -> crate::Result<&str> {
        self.canonical_units(platform).ok_or_else(|| {
            CoreError::Validation(format!(
                "Unknown hardware platform '{platform}' (known platforms: {})",
                self.units.keys().cloned().collect::<Vec<_>>().join(", ")
            ))
        })
    }

    /// Checks that `units` is the canonical unit of `platform`.
    pub fn check_units(&self, platform: &str, units: &str) -> crate::Result<()> {
        let expected = self.require(platform)?;
        if expected != units {
            return Err(CoreError::UnitMismatch {
                platform: platform.to_string(),
                expected: expected.to_string(),
                actual: units.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::PlatformTable;
    use crate::common::error::CoreError;

    #[test]
    fn test_default_units() {
        let table = PlatformTable::default();
        assert_eq!(table.canonical_units("SpiNNaker"), Some("core-hours"));
        assert_eq!(table.canonical_units("BrainScaleS"), Some("wafer-hours"));
        assert_eq!(table.canonical_units("BrainScaleS-2"), Some("chip-hours"));
        assert_eq!(table.canonical_units("Loihi"), None);
    }

    #[test]
    fn test_check_units() {
        let table = PlatformTable::default();
        assert!(table.check_units("SpiNNaker", "core-hours").is_ok());
        assert!(matches!(
            table.check_units("SpiNNaker", "chip-hours"),
            Err(CoreError::UnitMismatch { expected, .. }) if expected == "core-hours"
        ));
        assert!(matches!(
            table.check_units("Loihi", "core-hours"),
            Err(CoreError::Validation(_))
        ));
    }
}
