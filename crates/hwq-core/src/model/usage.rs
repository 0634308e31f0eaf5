use serde::{Deserialize, Serialize};

/// An amount of consumed hardware time, always tagged with its unit.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ResourceUsage {
    pub value: f64,
    pub units: String,
}

impl ResourceUsage {
    pub fn new<T: Into<String>>(value: f64, units: T) -> Self {
        Self {
            value,
            units: units.into(),
        }
    }

    pub fn zero<T: Into<String>>(units: T) -> Self {
        Self::new(0.0, units)
    }

    pub fn validate(&self) -> crate::Result<()> {
        if !self.value.is_finite() || self.value < 0.0 {
            return crate::common::error::validation_error(format!(
                "Resource usage must be a finite non-negative number, got {}",
                self.value
            ));
        }
        Ok(())
    }
}
