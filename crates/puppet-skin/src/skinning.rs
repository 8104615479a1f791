//! Skinning - bone influences of a single control point
//!
//! At bind time every candidate bone within range gets a weight of `1/d²`
//! (with `d` floored at `min_distance`), normalized to sum to 1. Each frame
//! the point is the weighted sum of what every influencing bone proposes.

use std::collections::{BTreeMap, BTreeSet};

use puppet_core::Vec2;
use puppet_skeleton::{BoneId, BoneTransform, Skeleton};

use crate::BindConfig;

/// One bone's pull on a point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Influence {
    pub weight: f64,
    pub transform: BoneTransform,
}

/// Bind-time influences of one control point.
///
/// An empty skinning is a point no bone reached; it stays at its rest
/// position forever.
#[derive(Debug, Clone, PartialEq)]
pub struct Skinning {
    rest: Vec2,
    influences: BTreeMap<BoneId, Influence>,
}

impl Skinning {
    /// Weight `point` against `candidates`
    pub fn bind(
        point: Vec2,
        candidates: &[BoneId],
        skeleton: &Skeleton,
        config: &BindConfig,
    ) -> Self {
        let unique: BTreeSet<BoneId> = candidates.iter().copied().collect();
        let raw: Vec<(BoneId, f64)> = unique
            .into_iter()
            .filter_map(|id| {
                let d = skeleton.bone(id).rest_distance(point);
                if d > config.influence_range {
                    return None;
                }
                let d = d.max(config.min_distance);
                Some((id, 1.0 / (d * d)))
            })
            .collect();

        let total: f64 = raw.iter().map(|(_, w)| w).sum();
        if raw.is_empty() || total <= 0.0 || !total.is_finite() {
            return Skinning::fixed(point);
        }

        let influences = raw
            .into_iter()
            .map(|(id, w)| {
                let influence = Influence {
                    weight: w / total,
                    transform: skeleton.bone(id).point_transform(point),
                };
                (id, influence)
            })
            .collect();
        Skinning {
            rest: point,
            influences,
        }
    }

    /// Reuse another point's weights, capturing `point` against the same bones
    pub fn with_weights(point: Vec2, other: &Skinning, skeleton: &Skeleton) -> Self {
        let influences = other
            .influences
            .iter()
            .map(|(id, influence)| {
                let shared = Influence {
                    weight: influence.weight,
                    transform: skeleton.bone(*id).point_transform(point),
                };
                (*id, shared)
            })
            .collect();
        Skinning {
            rest: point,
            influences,
        }
    }

    /// A point no bone influences
    pub fn fixed(point: Vec2) -> Self {
        Skinning {
            rest: point,
            influences: BTreeMap::new(),
        }
    }

    pub fn rest(&self) -> Vec2 {
        self.rest
    }

    pub fn is_empty(&self) -> bool {
        self.influences.is_empty()
    }

    pub fn influences(&self) -> &BTreeMap<BoneId, Influence> {
        &self.influences
    }

    /// Bone → weight
    pub fn weights(&self) -> BTreeMap<BoneId, f64> {
        self.influences
            .iter()
            .map(|(id, influence)| (*id, influence.weight))
            .collect()
    }

    /// Current position under the skeleton's current bones
    pub fn position(&self, skeleton: &Skeleton) -> Vec2 {
        if self.influences.is_empty() {
            return self.rest;
        }
        self.influences
            .iter()
            .fold(Vec2::ZERO, |acc, (id, influence)| {
                let bone = skeleton.bone(*id);
                let scale = skeleton.scale_for(bone.kind);
                let proposed = bone.apply_transform(&influence.transform, scale);
                acc + proposed * influence.weight
            })
    }

    /// Weighted bone confidence
    pub fn confidence(&self, skeleton: &Skeleton) -> f64 {
        self.influences
            .iter()
            .map(|(id, influence)| influence.weight * skeleton.bone(*id).confidence())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use puppet_skeleton::{upright_figure, BoneGroup, SkeletonConfig};

    fn skeleton() -> Skeleton {
        Skeleton::new(&upright_figure(), SkeletonConfig::default()).unwrap()
    }

    #[test]
    fn test_weights_normalized() {
        let skeleton = skeleton();
        let candidates = skeleton.group(BoneGroup::LeftArm);
        let skinning = Skinning::bind(
            Vec2::new(-130.0, -40.0),
            candidates,
            &skeleton,
            &BindConfig::default(),
        );
        let weights = skinning.weights();
        assert_eq!(weights.len(), 2);
        assert!(weights.values().all(|w| *w >= 0.0));
        assert!((weights.values().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_nearer_bone_weighs_more() {
        let skeleton = skeleton();
        let upper = skeleton.bone_id("leftShoulder-leftElbow").unwrap();
        let lower = skeleton.bone_id("leftElbow-leftWrist").unwrap();
        // Close to the upper arm's midpoint
        let skinning = Skinning::bind(
            Vec2::new(-112.0, -58.0),
            &[upper, lower],
            &skeleton,
            &BindConfig::default(),
        );
        let weights = skinning.weights();
        assert!(weights[&upper] > weights[&lower]);
    }

    #[test]
    fn test_out_of_range_point_is_fixed() {
        let mut skeleton = skeleton();
        let skinning = Skinning::bind(
            Vec2::new(5000.0, 5000.0),
            skeleton.group(BoneGroup::Torso),
            &skeleton,
            &BindConfig::default(),
        );
        assert!(skinning.is_empty());

        let rest = upright_figure();
        skeleton.update(
            &puppet_skeleton::pose_from(&rest, Vec2::new(30.0, 0.0), 0.9),
            None,
        );
        assert_eq!(skinning.position(&skeleton), Vec2::new(5000.0, 5000.0));
        assert_eq!(skinning.confidence(&skeleton), 0.0);
    }

    #[test]
    fn test_point_on_bone_gets_full_weight() {
        let skeleton = skeleton();
        let upper = skeleton.bone_id("leftShoulder-leftElbow").unwrap();
        let midpoint = skeleton.bone(upper).midpoint();
        let skinning = Skinning::bind(
            midpoint,
            skeleton.group(BoneGroup::LeftArm),
            &skeleton,
            &BindConfig::with_range(10.0),
        );
        let weights = skinning.weights();
        assert_eq!(weights.len(), 1);
        assert!((weights[&upper] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_with_weights_copies_anchor_weights() {
        let skeleton = skeleton();
        let anchor = Skinning::bind(
            Vec2::new(-130.0, -40.0),
            skeleton.group(BoneGroup::LeftArm),
            &skeleton,
            &BindConfig::default(),
        );
        let handle = Skinning::with_weights(Vec2::new(-120.0, -45.0), &anchor, &skeleton);
        assert_eq!(handle.weights(), anchor.weights());
        assert!(handle.position(&skeleton).distance(Vec2::new(-120.0, -45.0)) < 1e-9);
    }

    #[test]
    fn test_rest_pose_reproduces_point() {
        let skeleton = skeleton();
        let p = Vec2::new(-100.0, 20.0);
        let skinning = Skinning::bind(
            p,
            skeleton.group(BoneGroup::Torso),
            &skeleton,
            &BindConfig::default(),
        );
        assert!(skinning.position(&skeleton).distance(p) < 1e-9);
    }
}
