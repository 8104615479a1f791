//! Runtime configuration
//!
//! Every section has defaults, so a config file only needs the values it
//! changes.

use std::time::Duration;

use puppet_core::{PuppetError, PuppetResult};
use puppet_skeleton::SkeletonConfig;
use puppet_skin::BindConfig;
use serde::{Deserialize, Serialize};

/// Frame driver configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Time between estimation cycles
    pub frame_interval_ms: u64,
    /// Flip estimates horizontally (front camera)
    pub mirror_input: bool,
    /// Maximum queued outgoing peer messages
    pub max_outgoing: usize,
    /// Skeleton updates between keyframes (0 = first update only)
    pub keyframe_interval: u64,
    /// Part changes at or below this are not published
    pub diff_tolerance: f64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        DriverConfig {
            frame_interval_ms: 33,
            mirror_input: true,
            max_outgoing: 64,
            keyframe_interval: 30,
            diff_tolerance: 1e-3,
        }
    }
}

impl DriverConfig {
    /// Config for constrained peers: half rate, coarse diffs
    pub fn low_bandwidth() -> Self {
        DriverConfig {
            frame_interval_ms: 66,
            keyframe_interval: 120,
            diff_tolerance: 0.5,
            ..Default::default()
        }
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

/// Log output format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub format: LogFormat,
    /// Filter used when `RUST_LOG` is unset
    pub directive: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::Pretty,
            directive: "info".to_string(),
        }
    }
}

/// Everything a puppet process needs
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub skeleton: SkeletonConfig,
    pub bind: BindConfig,
    pub driver: DriverConfig,
    pub log: LogConfig,
}

impl RuntimeConfig {
    pub fn from_json_str(json: &str) -> PuppetResult<Self> {
        let config: RuntimeConfig =
            serde_json::from_str(json).map_err(|e| PuppetError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the rig cannot run with
    pub fn validate(&self) -> PuppetResult<()> {
        let unit = |name: &str, v: f64| {
            if (0.0..=1.0).contains(&v) {
                Ok(())
            } else {
                Err(PuppetError::Config(format!("{name} must be in [0, 1], got {v}")))
            }
        };
        unit("skeleton.min_pose_confidence", self.skeleton.min_pose_confidence)?;
        unit("skeleton.min_face_confidence", self.skeleton.min_face_confidence)?;
        unit("skeleton.inferred_face_confidence", self.skeleton.inferred_face_confidence)?;

        if !(self.bind.min_distance > 0.0) {
            return Err(PuppetError::Config("bind.min_distance must be positive".into()));
        }
        if !(self.bind.influence_range > 0.0) {
            return Err(PuppetError::Config("bind.influence_range must be positive".into()));
        }
        if self.driver.frame_interval_ms == 0 {
            return Err(PuppetError::Config("driver.frame_interval_ms must be non-zero".into()));
        }
        if self.driver.max_outgoing == 0 {
            return Err(PuppetError::Config("driver.max_outgoing must be non-zero".into()));
        }
        Ok(())
    }
}
