//! Bone - a rigid segment between two keypoints
//!
//! A bone remembers where its endpoints were at bind time (rest) and where
//! they are now (current). Points near a bone are captured against the rest
//! segment and reconstructed against the current one.

use std::fmt;

use puppet_core::{segment_parameter, Color, Vec2, EPSILON};
use serde::{Deserialize, Serialize};

/// Index of a bone within its skeleton
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BoneId(pub usize);

impl fmt::Debug for BoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bone({})", self.0)
    }
}

/// Which tracker drives a bone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoneKind {
    Body,
    Face,
}

/// How a point relates to a bone, captured at bind time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoneTransform {
    /// Displacement from the anchor as (along bone, perpendicular)
    pub offset: Vec2,
    /// Normalized position of the anchor along the bone [0.0 - 1.0]
    pub anchor_fraction: f64,
}

/// A rigid segment `kp0 → kp1`
#[derive(Debug, Clone)]
pub struct Bone {
    pub name: String,
    pub kind: BoneKind,
    /// Keypoint names of the two endpoints
    pub kp0: String,
    pub kp1: String,
    /// Diagnostic color derived from the name
    pub color: Color,
    /// Parent bone for secondary bones
    pub parent: Option<BoneId>,
    rest: [Vec2; 2],
    current: [Vec2; 2],
    confidence: f64,
    midpoint: Vec2,
}

impl Bone {
    /// Create a bone at rest
    pub fn new(
        name: impl Into<String>,
        kind: BoneKind,
        kp0: impl Into<String>,
        kp1: impl Into<String>,
        rest0: Vec2,
        rest1: Vec2,
    ) -> Self {
        let name = name.into();
        Bone {
            color: Color::from_name(&name),
            name,
            kind,
            kp0: kp0.into(),
            kp1: kp1.into(),
            parent: None,
            rest: [rest0, rest1],
            current: [rest0, rest1],
            confidence: 0.0,
            midpoint: rest0.lerp(rest1, 0.5),
        }
    }

    pub fn with_parent(mut self, parent: BoneId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Rest endpoints
    pub fn rest(&self) -> [Vec2; 2] {
        self.rest
    }

    /// Current endpoints
    pub fn current(&self) -> [Vec2; 2] {
        self.current
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn midpoint(&self) -> Vec2 {
        self.midpoint
    }

    pub fn rest_length(&self) -> f64 {
        self.rest[0].distance(self.rest[1])
    }

    pub fn length(&self) -> f64 {
        self.current[0].distance(self.current[1])
    }

    /// Move the endpoints; confidence and midpoint follow
    pub fn set_current(&mut self, p0: Vec2, p1: Vec2, confidence: f64) {
        self.current = [p0, p1];
        self.confidence = confidence;
        self.midpoint = p0.lerp(p1, 0.5);
    }

    /// Distance from `p` to the rest segment
    pub fn rest_distance(&self, p: Vec2) -> f64 {
        puppet_core::distance_to_segment(self.rest[0], self.rest[1], p)
    }

    /// Capture `p` against the rest segment
    pub fn point_transform(&self, p: Vec2) -> BoneTransform {
        let [r0, r1] = self.rest;
        let anchor_fraction = segment_parameter(r0, r1, p);
        let anchor = r0.lerp(r1, anchor_fraction);
        let d = p - anchor;
        // A zero-length rest bone has no direction; fall back to world axes
        let (dir, normal) = basis(r0, r1).unwrap_or((Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)));
        BoneTransform {
            offset: Vec2::new(d.dot(dir), d.dot(normal)),
            anchor_fraction,
        }
    }

    /// Reconstruct a captured point against the current segment, with the
    /// offset scaled by `scale`. A zero-length bone yields the anchor.
    pub fn apply_transform(&self, transform: &BoneTransform, scale: f64) -> Vec2 {
        let [c0, c1] = self.current;
        let anchor = c0.lerp(c1, transform.anchor_fraction);
        let Some((dir, normal)) = basis(c0, c1) else {
            return anchor;
        };
        anchor + dir * (transform.offset.x * scale) + normal * (transform.offset.y * scale)
    }
}

/// Unit direction and normal of `a → b`, `None` if degenerate
fn basis(a: Vec2, b: Vec2) -> Option<(Vec2, Vec2)> {
    let ab = b - a;
    let len = ab.length();
    if len < EPSILON {
        return None;
    }
    let dir = ab * (1.0 / len);
    Some((dir, dir.perp()))
}
