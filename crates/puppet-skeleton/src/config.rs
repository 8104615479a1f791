//! Skeleton configuration

use serde::{Deserialize, Serialize};

/// Skeleton update configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkeletonConfig {
    /// Poses below this overall confidence invalidate the frame
    pub min_pose_confidence: f64,
    /// Face estimates must exceed this to be used directly
    pub min_face_confidence: f64,
    /// Vertical distance from hip to synthesized knee
    pub knee_offset: f64,
    /// Vertical distance from hip to synthesized ankle
    pub ankle_offset: f64,
    /// Confidence given to face landmarks inferred from the ears
    pub inferred_face_confidence: f64,
}

impl Default for SkeletonConfig {
    fn default() -> Self {
        SkeletonConfig {
            min_pose_confidence: 0.1,
            min_face_confidence: 0.8,
            knee_offset: 100.0,
            ankle_offset: 200.0,
            inferred_face_confidence: 1.0,
        }
    }
}

impl SkeletonConfig {
    /// Never trust the face estimator; always infer the face from the pose
    pub fn pose_only() -> Self {
        SkeletonConfig {
            min_face_confidence: 1.0,
            ..Default::default()
        }
    }
}
