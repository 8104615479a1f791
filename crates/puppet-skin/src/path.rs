//! Skinned paths and their rendered form

use puppet_core::{is_collinear, Vec2};
use puppet_skeleton::{BoneId, Skeleton};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{BindConfig, PathData, PathStyle, Skinning};

/// Where a point's candidate bones come from
#[derive(Debug, Clone, Copy)]
pub enum Candidates<'a> {
    /// The nearest bone group(s) of the point itself
    Nearest,
    /// A fixed set, used for auxiliary groups
    Explicit(&'a [BoneId]),
}

impl Candidates<'_> {
    fn resolve(&self, point: Vec2, skeleton: &Skeleton) -> Vec<BoneId> {
        match self {
            Candidates::Nearest => skeleton.find_bone_group(point),
            Candidates::Explicit(ids) => ids.to_vec(),
        }
    }
}

/// Anchor and handle bindings of one segment. Handles are bound in
/// absolute coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct SkinnedSegment {
    pub point: Skinning,
    pub handle_in: Option<Skinning>,
    pub handle_out: Option<Skinning>,
}

/// A bound path: segment bindings plus the style captured at bind time
#[derive(Debug, Clone, PartialEq)]
pub struct SkinnedPath {
    pub name: String,
    segments: Vec<SkinnedSegment>,
    closed: bool,
    style: PathStyle,
}

impl SkinnedPath {
    pub fn bind(
        name: impl Into<String>,
        data: &PathData,
        candidates: Candidates<'_>,
        skeleton: &Skeleton,
        config: &BindConfig,
    ) -> Self {
        let bind_point = |p: Vec2| Skinning::bind(p, &candidates.resolve(p, skeleton), skeleton, config);

        let segments = data
            .segments
            .iter()
            .map(|segment| {
                let anchor = segment.point;
                let point = bind_point(anchor);

                // A straight tangent through the anchor keeps the anchor's weights
                let smooth = match (segment.handle_in, segment.handle_out) {
                    (Some(h_in), Some(h_out)) => is_collinear(h_in, h_out, config.collinear_threshold),
                    _ => false,
                };
                let bind_handle = |handle: Option<Vec2>| {
                    handle.map(|h| {
                        let at = anchor + h;
                        if smooth {
                            Skinning::with_weights(at, &point, skeleton)
                        } else {
                            bind_point(at)
                        }
                    })
                };
                let handle_in = bind_handle(segment.handle_in);
                let handle_out = bind_handle(segment.handle_out);

                SkinnedSegment {
                    point,
                    handle_in,
                    handle_out,
                }
            })
            .collect();

        SkinnedPath {
            name: name.into(),
            segments,
            closed: data.closed,
            style: data.style.clone(),
        }
    }

    pub fn segments(&self) -> &[SkinnedSegment] {
        &self.segments
    }

    pub fn closed(&self) -> bool {
        self.closed
    }

    pub fn style(&self) -> &PathStyle {
        &self.style
    }

    /// Control points (anchors and handles) bound to this path
    pub fn skinnings(&self) -> impl Iterator<Item = &Skinning> {
        self.segments.iter().flat_map(|s| {
            std::iter::once(&s.point)
                .chain(s.handle_in.as_ref())
                .chain(s.handle_out.as_ref())
        })
    }

    /// Mean anchor confidence over the segments
    pub fn confidence(&self, skeleton: &Skeleton) -> f64 {
        if self.segments.is_empty() {
            return 0.0;
        }
        let total: f64 = self
            .segments
            .iter()
            .map(|s| s.point.confidence(skeleton))
            .sum();
        total / self.segments.len() as f64
    }

    /// Recompute every control point against the current skeleton
    pub fn render(&self, skeleton: &Skeleton) -> RenderPath {
        let segments = self
            .segments
            .iter()
            .map(|segment| {
                let point = segment.point.position(skeleton);
                let relative = |handle: &Option<Skinning>| {
                    handle.as_ref().map(|h| h.position(skeleton) - point)
                };
                RenderSegment {
                    point,
                    handle_in: relative(&segment.handle_in),
                    handle_out: relative(&segment.handle_out),
                }
            })
            .collect();
        let confidence = self.confidence(skeleton);
        trace!(path = %self.name, confidence, "path rendered");

        RenderPath {
            name: self.name.clone(),
            segments,
            closed: self.closed,
            style: self.style.clone(),
            confidence,
        }
    }
}

/// A deformed segment, handles relative to the point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderSegment {
    pub point: Vec2,
    pub handle_in: Option<Vec2>,
    pub handle_out: Option<Vec2>,
}

/// A deformed path ready for a drawing backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderPath {
    pub name: String,
    pub segments: Vec<RenderSegment>,
    pub closed: bool,
    pub style: PathStyle,
    /// Diagnostic quality signal; never alters geometry
    pub confidence: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PathSegment;
    use puppet_skeleton::{pose_from, upright_figure, SkeletonConfig};

    fn skeleton() -> Skeleton {
        Skeleton::new(&upright_figure(), SkeletonConfig::default()).unwrap()
    }

    #[test]
    fn test_collinear_handles_share_anchor_weights() {
        let skeleton = skeleton();
        let data = PathData {
            segments: vec![PathSegment::smooth(
                Vec2::new(-130.0, -40.0),
                Vec2::new(-20.0, 5.0),
                Vec2::new(40.0, -10.0),
            )],
            closed: false,
            style: PathStyle::default(),
        };
        let path = SkinnedPath::bind("sleeve", &data, Candidates::Nearest, &skeleton, &BindConfig::default());
        let segment = &path.segments()[0];
        let anchor = segment.point.weights();
        assert_eq!(segment.handle_in.as_ref().unwrap().weights(), anchor);
        assert_eq!(segment.handle_out.as_ref().unwrap().weights(), anchor);
    }

    #[test]
    fn test_corner_handles_bound_independently() {
        let skeleton = skeleton();
        let data = PathData {
            segments: vec![PathSegment::smooth(
                Vec2::new(-130.0, -40.0),
                Vec2::new(0.0, -30.0),
                Vec2::new(-20.0, 90.0),
            )],
            closed: false,
            style: PathStyle::default(),
        };
        let path = SkinnedPath::bind("cuff", &data, Candidates::Nearest, &skeleton, &BindConfig::default());
        let segment = &path.segments()[0];
        assert_ne!(segment.handle_out.as_ref().unwrap().weights(), segment.point.weights());
    }

    #[test]
    fn test_render_at_rest_reproduces_asset() {
        let skeleton = skeleton();
        let data = PathData {
            segments: vec![
                PathSegment::corner(Vec2::new(-60.0, -90.0)),
                PathSegment::smooth(Vec2::new(0.0, 0.0), Vec2::new(-10.0, 0.0), Vec2::new(10.0, 0.0)),
                PathSegment::corner(Vec2::new(60.0, 90.0)),
            ],
            closed: true,
            style: PathStyle {
                fill: Some("#336699".into()),
                stroke: None,
                stroke_width: 2.0,
            },
        };
        let path = SkinnedPath::bind("shirt", &data, Candidates::Nearest, &skeleton, &BindConfig::default());
        let rendered = path.render(&skeleton);

        assert!(rendered.closed);
        assert_eq!(rendered.style, data.style);
        for (out, original) in rendered.segments.iter().zip(&data.segments) {
            assert!(out.point.distance(original.point) < 1e-9);
        }
        let handle = rendered.segments[1].handle_out.unwrap();
        assert!(handle.distance(Vec2::new(10.0, 0.0)) < 1e-9);
    }

    #[test]
    fn test_render_follows_translation() {
        let rest = upright_figure();
        let mut skeleton = Skeleton::new(&rest, SkeletonConfig::default()).unwrap();
        let data = PathData::polyline([Vec2::new(-100.0, -70.0), Vec2::new(-150.0, 10.0)], false);
        let path = SkinnedPath::bind("arm", &data, Candidates::Nearest, &skeleton, &BindConfig::default());

        let offset = Vec2::new(25.0, -15.0);
        assert!(skeleton.update(&pose_from(&rest, offset, 0.9), None));
        let rendered = path.render(&skeleton);
        for (out, original) in rendered.segments.iter().zip(&data.segments) {
            assert!(out.point.distance(original.point + offset) < 1e-6);
        }
        assert!((rendered.confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_explicit_candidates() {
        let skeleton = skeleton();
        let torso = skeleton.bone_id("leftShoulder-rightShoulder").unwrap();
        let data = PathData::polyline([Vec2::new(-150.0, 50.0)], false);
        let path = SkinnedPath::bind(
            "badge",
            &data,
            Candidates::Explicit(&[torso]),
            &skeleton,
            &BindConfig::default(),
        );
        let weights = path.segments()[0].point.weights();
        assert_eq!(weights.keys().copied().collect::<Vec<_>>(), vec![torso]);
    }
}
