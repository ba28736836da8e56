use crate::store::{ParameterStore, StoreError};
use crate::types::DecisionError;

pub const CONFIDENCE_THRESHOLD: &str = "confidenceThreshold";
pub const MARGIN_ERROR: &str = "marginError";

// Key point:
// Explicit defaults
// Defaults are for seeding a new store only, never a fallback
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parameters {
    pub confidence_threshold: f64,
    pub margin_error: f64,
}

impl Parameters {
    pub fn seed_defaults() -> Self {
        Self {
            confidence_threshold: 0.88,
            margin_error: 0.05,
        }
    }

    /// Seed entries as (key, value) pairs, in store order.
    pub fn entries(&self) -> [(&'static str, f64); 2] {
        [
            (CONFIDENCE_THRESHOLD, self.confidence_threshold),
            (MARGIN_ERROR, self.margin_error),
        ]
    }

    /// Read both parameters. A missing key is `ConfigMissing`; a value
    /// outside its domain is `InvalidParameter`.
    pub fn load<P: ParameterStore + ?Sized>(store: &P) -> Result<Self, DecisionError> {
        let confidence_threshold = read(store, CONFIDENCE_THRESHOLD)?;
        if !(0.0..=1.0).contains(&confidence_threshold) {
            return Err(DecisionError::InvalidParameter {
                name: CONFIDENCE_THRESHOLD.to_string(),
                value: confidence_threshold,
            });
        }

        let margin_error = read(store, MARGIN_ERROR)?;
        if !margin_error.is_finite() || margin_error < 0.0 {
            return Err(DecisionError::InvalidParameter {
                name: MARGIN_ERROR.to_string(),
                value: margin_error,
            });
        }

        Ok(Self {
            confidence_threshold,
            margin_error,
        })
    }
}

fn read<P: ParameterStore + ?Sized>(store: &P, name: &str) -> Result<f64, DecisionError> {
    store.get(name).map_err(|err| match err {
        StoreError::ParameterNotFound(_) => DecisionError::ConfigMissing(name.to_string()),
        other => DecisionError::from(other),
    })
}
