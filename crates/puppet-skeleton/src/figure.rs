//! Reference figure - rest positions of an upright character
//!
//! Compiled into tests, and into other crates with the `test-support`
//! feature, for code that needs a complete skeleton without loading an asset.
//! The head is centred at (0, -200) and the hips sit at y = 100, in asset
//! units.

use std::collections::HashMap;
use std::f64::consts::TAU;

use puppet_core::{FaceEstimate, PoseEstimate, PoseKeypoint, Vec2, BODY_PARTS, FACE_MESH_SIZE, FACE_PARTS};

const BODY: [(&str, (f64, f64)); 17] = [
    ("nose", (0.0, -195.0)),
    ("leftEye", (-15.0, -210.0)),
    ("rightEye", (15.0, -210.0)),
    ("leftEar", (-40.0, -200.0)),
    ("rightEar", (40.0, -200.0)),
    ("leftShoulder", (-80.0, -100.0)),
    ("rightShoulder", (80.0, -100.0)),
    ("leftElbow", (-140.0, -20.0)),
    ("rightElbow", (140.0, -20.0)),
    ("leftWrist", (-170.0, 60.0)),
    ("rightWrist", (170.0, 60.0)),
    ("leftHip", (-50.0, 100.0)),
    ("rightHip", (50.0, 100.0)),
    ("leftKnee", (-50.0, 200.0)),
    ("rightKnee", (50.0, 200.0)),
    ("leftAnkle", (-50.0, 300.0)),
    ("rightAnkle", (50.0, 300.0)),
];

/// Head centre of the reference figure
pub const FIGURE_HEAD: Vec2 = Vec2::new(0.0, -200.0);

/// Rest positions for every body and face keypoint
pub fn upright_figure() -> HashMap<String, Vec2> {
    let mut rest: HashMap<String, Vec2> = BODY
        .iter()
        .map(|(name, (x, y))| (name.to_string(), Vec2::new(*x, *y)))
        .collect();

    // Face landmarks on a ring with staggered radii so none coincide
    for (i, (name, _)) in FACE_PARTS.iter().enumerate() {
        let angle = i as f64 / FACE_PARTS.len() as f64 * TAU;
        let radius = 20.0 + (i % 5) as f64 * 5.0;
        rest.insert(
            name.to_string(),
            FIGURE_HEAD + Vec2::new(angle.cos() * radius, angle.sin() * radius),
        );
    }
    rest
}

/// A pose estimate placing every body keypoint at its rest position plus
/// `offset`, all with the same score
pub fn pose_from(rest: &HashMap<String, Vec2>, offset: Vec2, score: f64) -> PoseEstimate {
    let keypoints = BODY_PARTS
        .iter()
        .filter_map(|name| {
            rest.get(*name)
                .map(|p| PoseKeypoint::new(*name, *p + offset, score))
        })
        .collect();
    PoseEstimate::new(keypoints, score)
}

/// A full face mesh with the named landmarks at rest plus `offset`
pub fn face_from(rest: &HashMap<String, Vec2>, offset: Vec2, confidence: f64) -> FaceEstimate {
    let mut mesh = vec![Vec2::ZERO; FACE_MESH_SIZE];
    for (name, index) in FACE_PARTS {
        if let Some(p) = rest.get(name) {
            mesh[index] = *p + offset;
        }
    }
    FaceEstimate::new(mesh, confidence)
}
