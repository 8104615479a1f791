//! Puppet Skeleton - the bone graph that follows a tracked subject
//!
//! A skeleton is built once from the rest positions of a character asset and
//! then updated once per estimation frame:
//! - Pose keypoints are fused with their previous state, weighted by confidence
//! - Leg keypoints are placed below the hips
//! - Face landmarks come straight from the face estimate when it is confident,
//!   otherwise they are inferred from the ears
//! - Bones, secondary bones and the body/face scale factors are refreshed
//!
//! Bones act as local coordinate frames for the skinner.

pub mod bone;
pub mod config;
#[cfg(any(test, feature = "test-support"))]
pub mod figure;
pub mod rig;
pub mod skeleton;

pub use bone::*;
pub use config::*;
#[cfg(any(test, feature = "test-support"))]
pub use figure::*;
pub use rig::*;
pub use skeleton::*;
