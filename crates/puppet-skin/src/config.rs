//! Bind configuration

use puppet_core::COLLINEAR_THRESHOLD;
use serde::{Deserialize, Serialize};

/// Bind-time weighting configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindConfig {
    /// Bones farther than this from a point (asset units) do not influence it
    pub influence_range: f64,
    /// Distance floor for the `1/d²` weight
    pub min_distance: f64,
    /// Threshold for treating a handle pair as one tangent
    pub collinear_threshold: f64,
}

impl Default for BindConfig {
    fn default() -> Self {
        BindConfig {
            influence_range: 250.0,
            min_distance: 1e-3,
            collinear_threshold: COLLINEAR_THRESHOLD,
        }
    }
}

impl BindConfig {
    /// Every candidate bone influences every point
    pub fn unbounded() -> Self {
        BindConfig {
            influence_range: f64::MAX,
            ..Default::default()
        }
    }

    /// Only bones within `range` influence a point
    pub fn with_range(range: f64) -> Self {
        BindConfig {
            influence_range: range,
            ..Default::default()
        }
    }
}
