//! Pose and face estimators
//!
//! The estimators are external models. The driver only needs something it
//! can hand a frame to and await a ranked list of estimates from; the rig
//! uses the first entry of each list.

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use puppet_core::{gaussian, FaceEstimate, PoseEstimate, PuppetError, PuppetResult, Vec2};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// One captured camera frame. Pixels stay with the estimators.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoFrame {
    /// Capture order, starting at 0
    pub index: u64,
    pub width: u32,
    pub height: u32,
    /// Capture time since the stream started
    pub timestamp: Duration,
}

impl VideoFrame {
    pub fn new(index: u64, width: u32, height: u32) -> Self {
        VideoFrame {
            index,
            width,
            height,
            timestamp: Duration::ZERO,
        }
    }
}

/// Body pose estimator
pub trait PoseOracle {
    /// Pose estimates for `frame`, best first
    fn estimate_poses(
        &mut self,
        frame: &VideoFrame,
    ) -> impl Future<Output = PuppetResult<Vec<PoseEstimate>>> + Send;
}

/// Face landmark estimator
pub trait FaceOracle {
    /// Face estimates for `frame`, best first
    fn estimate_faces(
        &mut self,
        frame: &VideoFrame,
    ) -> impl Future<Output = PuppetResult<Vec<FaceEstimate>>> + Send;
}

/// Replays scripted poses, one per frame, with Gaussian jitter on every
/// keypoint
#[derive(Debug, Clone)]
pub struct SyntheticPoseOracle {
    keyframes: Vec<PoseEstimate>,
    jitter: f64,
    failing: HashSet<u64>,
    rng: StdRng,
}

impl SyntheticPoseOracle {
    /// Frame `i` replays `keyframes[i % len]`; no keyframes means no pose
    pub fn new(keyframes: Vec<PoseEstimate>, jitter: f64, seed: u64) -> Self {
        SyntheticPoseOracle {
            keyframes,
            jitter,
            failing: HashSet::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Fail on the frame with this index
    pub fn fail_on(mut self, frame_index: u64) -> Self {
        self.failing.insert(frame_index);
        self
    }
}

impl PoseOracle for SyntheticPoseOracle {
    async fn estimate_poses(&mut self, frame: &VideoFrame) -> PuppetResult<Vec<PoseEstimate>> {
        if self.failing.contains(&frame.index) {
            return Err(PuppetError::Oracle(format!("pose model failed on frame {}", frame.index)));
        }
        if self.keyframes.is_empty() {
            return Ok(Vec::new());
        }
        let mut pose = self.keyframes[(frame.index % self.keyframes.len() as u64) as usize].clone();
        if self.jitter > 0.0 {
            for keypoint in &mut pose.keypoints {
                keypoint.position = keypoint.position
                    + Vec2::new(
                        gaussian(&mut self.rng, 0.0, self.jitter),
                        gaussian(&mut self.rng, 0.0, self.jitter),
                    );
            }
        }
        Ok(vec![pose])
    }
}

/// Replays scripted face meshes, one per frame, with Gaussian jitter
#[derive(Debug, Clone)]
pub struct SyntheticFaceOracle {
    keyframes: Vec<FaceEstimate>,
    jitter: f64,
    failing: HashSet<u64>,
    rng: StdRng,
}

impl SyntheticFaceOracle {
    /// Frame `i` replays `keyframes[i % len]`; no keyframes means no face
    pub fn new(keyframes: Vec<FaceEstimate>, jitter: f64, seed: u64) -> Self {
        SyntheticFaceOracle {
            keyframes,
            jitter,
            failing: HashSet::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// An oracle that never sees a face
    pub fn absent() -> Self {
        Self::new(Vec::new(), 0.0, 0)
    }

    pub fn fail_on(mut self, frame_index: u64) -> Self {
        self.failing.insert(frame_index);
        self
    }
}

impl FaceOracle for SyntheticFaceOracle {
    async fn estimate_faces(&mut self, frame: &VideoFrame) -> PuppetResult<Vec<FaceEstimate>> {
        if self.failing.contains(&frame.index) {
            return Err(PuppetError::Oracle(format!("face model failed on frame {}", frame.index)));
        }
        if self.keyframes.is_empty() {
            return Ok(Vec::new());
        }
        let mut face = self.keyframes[(frame.index % self.keyframes.len() as u64) as usize].clone();
        if self.jitter > 0.0 {
            for vertex in &mut face.mesh {
                *vertex = *vertex
                    + Vec2::new(
                        gaussian(&mut self.rng, 0.0, self.jitter),
                        gaussian(&mut self.rng, 0.0, self.jitter),
                    );
            }
        }
        Ok(vec![face])
    }
}
