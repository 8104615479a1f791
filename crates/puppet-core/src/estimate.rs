//! Estimator output - what the pose and face oracles hand to the rig
//!
//! These are plain data. The estimators themselves are external; the rig
//! only ever consumes their top-ranked result.

use serde::{Deserialize, Serialize};

use crate::{face_mesh_index, Vec2};

/// One named keypoint of a body pose estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseKeypoint {
    pub name: String,
    pub position: Vec2,
    /// Per-keypoint confidence [0.0 - 1.0]
    pub score: f64,
}

impl PoseKeypoint {
    pub fn new(name: impl Into<String>, position: Vec2, score: f64) -> Self {
        Self {
            name: name.into(),
            position,
            score,
        }
    }
}

/// Body pose estimate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseEstimate {
    pub keypoints: Vec<PoseKeypoint>,
    /// Overall pose confidence [0.0 - 1.0]
    pub score: f64,
}

impl PoseEstimate {
    pub fn new(keypoints: Vec<PoseKeypoint>, score: f64) -> Self {
        Self { keypoints, score }
    }

    /// Look up a keypoint by name
    pub fn keypoint(&self, name: &str) -> Option<&PoseKeypoint> {
        self.keypoints.iter().find(|k| k.name == name)
    }

    /// Flip horizontally about a frame of the given width
    pub fn mirror(&mut self, width: f64) {
        for keypoint in &mut self.keypoints {
            keypoint.position.x = width - keypoint.position.x;
        }
    }
}

/// Face landmark estimate (one face)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FaceEstimate {
    /// Face mesh vertices, indexed per [`crate::FACE_PARTS`]
    pub mesh: Vec<Vec2>,
    /// Face-in-view confidence [0.0 - 1.0]
    pub confidence: f64,
}

impl FaceEstimate {
    pub fn new(mesh: Vec<Vec2>, confidence: f64) -> Self {
        Self { mesh, confidence }
    }

    /// Position of a named face landmark, if the mesh covers it
    pub fn landmark(&self, name: &str) -> Option<Vec2> {
        face_mesh_index(name).and_then(|i| self.mesh.get(i).copied())
    }

    /// Flip horizontally about a frame of the given width
    pub fn mirror(&mut self, width: f64) {
        for vertex in &mut self.mesh {
            vertex.x = width - vertex.x;
        }
    }
}

/// Current fused state of one skeleton part
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PartState {
    pub position: Vec2,
    pub confidence: f64,
}

impl PartState {
    pub fn new(position: Vec2, confidence: f64) -> Self {
        Self {
            position,
            confidence,
        }
    }

    /// Confidence-weighted blend of a prior state with a new observation.
    ///
    /// Position and confidence are both averaged with the confidences as
    /// weights. When both weights are zero the observation wins.
    pub fn fuse(&self, observed: PartState) -> PartState {
        let c_old = self.confidence.max(0.0);
        let c_new = observed.confidence.max(0.0);
        let total = c_old + c_new;
        if total <= f64::EPSILON {
            return observed;
        }
        PartState {
            position: (self.position * c_old + observed.position * c_new) * (1.0 / total),
            confidence: (c_old * c_old + c_new * c_new) / total,
        }
    }
}
