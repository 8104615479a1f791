//! Vector asset model
//!
//! A character asset is a tree of named items. The rig needs two top-level
//! groups:
//! - `skeleton`: one item per keypoint, positioned where the keypoint sits
//!   in the drawing
//! - `illustration`: the drawable paths, optionally split into `aux` groups
//!   that follow their own secondary bones
//!
//! Assets are read from JSON with [`VectorAsset::from_json`].

use std::collections::HashMap;

use puppet_core::{face_part_names, PuppetError, PuppetResult, Vec2, BODY_PARTS};
use serde::{Deserialize, Serialize};

/// Name prefix of the keypoint group
pub const SKELETON_GROUP: &str = "skeleton";
/// Name prefix of the drawable group
pub const ILLUSTRATION_GROUP: &str = "illustration";
/// Name prefix of auxiliary sub-groups
pub const AUX_PREFIX: &str = "aux";
/// Name prefix of secondary bone declarations inside an aux group
pub const BONE_PREFIX: &str = "bone:";

/// True when `name` is `key`, or `key` followed by a non-alphanumeric
/// separator (`leftEye` matches `leftEye-pupil` but not `leftEye0`)
pub fn name_matches(name: &str, key: &str) -> bool {
    match name.strip_prefix(key) {
        Some(rest) => rest
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric()),
        None => false,
    }
}

/// Paint attributes of a path, carried through unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathStyle {
    pub fill: Option<String>,
    pub stroke: Option<String>,
    pub stroke_width: f64,
}

/// One anchor with optional handles, handles relative to the anchor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathSegment {
    pub point: Vec2,
    #[serde(default)]
    pub handle_in: Option<Vec2>,
    #[serde(default)]
    pub handle_out: Option<Vec2>,
}

impl PathSegment {
    pub fn corner(point: Vec2) -> Self {
        PathSegment {
            point,
            handle_in: None,
            handle_out: None,
        }
    }

    pub fn smooth(point: Vec2, handle_in: Vec2, handle_out: Vec2) -> Self {
        PathSegment {
            point,
            handle_in: Some(handle_in),
            handle_out: Some(handle_out),
        }
    }
}

/// Geometry and style of a path
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathData {
    pub segments: Vec<PathSegment>,
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub style: PathStyle,
}

impl PathData {
    /// Straight-edged path through `points`
    pub fn polyline(points: impl IntoIterator<Item = Vec2>, closed: bool) -> Self {
        PathData {
            segments: points.into_iter().map(PathSegment::corner).collect(),
            closed,
            style: PathStyle::default(),
        }
    }
}

/// Item payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AssetNode {
    Group {
        #[serde(default)]
        children: Vec<AssetItem>,
    },
    Path(PathData),
    Marker {
        position: Vec2,
    },
}

/// A named node of the asset tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetItem {
    pub name: String,
    #[serde(flatten)]
    pub node: AssetNode,
}

impl AssetItem {
    pub fn group(name: impl Into<String>, children: Vec<AssetItem>) -> Self {
        AssetItem {
            name: name.into(),
            node: AssetNode::Group { children },
        }
    }

    pub fn path(name: impl Into<String>, data: PathData) -> Self {
        AssetItem {
            name: name.into(),
            node: AssetNode::Path(data),
        }
    }

    pub fn marker(name: impl Into<String>, position: Vec2) -> Self {
        AssetItem {
            name: name.into(),
            node: AssetNode::Marker { position },
        }
    }

    /// Children of a group; empty for paths and markers
    pub fn children(&self) -> &[AssetItem] {
        match &self.node {
            AssetNode::Group { children } => children,
            _ => &[],
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self.node, AssetNode::Group { .. })
    }

    pub fn as_path(&self) -> Option<&PathData> {
        match &self.node {
            AssetNode::Path(data) => Some(data),
            _ => None,
        }
    }

    /// Axis-aligned bounds `(min, max)` over anchors and markers below
    pub fn bounds(&self) -> Option<(Vec2, Vec2)> {
        let mut points = Vec::new();
        self.collect_points(&mut points);
        let first = *points.first()?;
        Some(points.iter().fold((first, first), |(lo, hi), p| {
            (
                Vec2::new(lo.x.min(p.x), lo.y.min(p.y)),
                Vec2::new(hi.x.max(p.x), hi.y.max(p.y)),
            )
        }))
    }

    /// Marker position, or the centre of the bounds
    pub fn position(&self) -> Option<Vec2> {
        if let AssetNode::Marker { position } = self.node {
            return Some(position);
        }
        self.bounds().map(|(lo, hi)| lo.lerp(hi, 0.5))
    }

    /// Depth-first search for the first item matching `key`
    pub fn find(&self, key: &str) -> Option<&AssetItem> {
        self.children().iter().find_map(|child| {
            if name_matches(&child.name, key) {
                Some(child)
            } else {
                child.find(key)
            }
        })
    }

    fn collect_points(&self, out: &mut Vec<Vec2>) {
        match &self.node {
            AssetNode::Group { children } => {
                for child in children {
                    child.collect_points(out);
                }
            }
            AssetNode::Path(data) => out.extend(data.segments.iter().map(|s| s.point)),
            AssetNode::Marker { position } => out.push(*position),
        }
    }
}

/// A parsed character asset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VectorAsset {
    pub items: Vec<AssetItem>,
}

impl VectorAsset {
    pub fn new(items: Vec<AssetItem>) -> Self {
        VectorAsset { items }
    }

    pub fn from_json(json: &str) -> PuppetResult<Self> {
        serde_json::from_str(json).map_err(|e| PuppetError::Json(e.to_string()))
    }

    pub fn to_json(&self) -> PuppetResult<String> {
        serde_json::to_string(self).map_err(|e| PuppetError::Json(e.to_string()))
    }

    /// Top-level group whose name matches `prefix`
    pub fn find_group(&self, prefix: &str) -> PuppetResult<&AssetItem> {
        self.items
            .iter()
            .find(|item| item.is_group() && name_matches(&item.name, prefix))
            .ok_or_else(|| PuppetError::MissingGroup(prefix.to_string()))
    }
}

/// Rest position of every body and face keypoint found under `group`.
/// Keypoints the group lacks are simply absent; the skeleton decides
/// which of them are required.
pub fn skeleton_rest_positions(group: &AssetItem) -> HashMap<String, Vec2> {
    BODY_PARTS
        .iter()
        .copied()
        .chain(face_part_names())
        .filter_map(|name| {
            let position = group.find(name)?.position()?;
            Some((name.to_string(), position))
        })
        .collect()
}

/// A keypoint group with one marker per rest position, sorted by name
pub fn skeleton_group(rest: &HashMap<String, Vec2>) -> AssetItem {
    let mut markers: Vec<AssetItem> = rest
        .iter()
        .map(|(name, p)| AssetItem::marker(name.clone(), *p))
        .collect();
    markers.sort_by(|a, b| a.name.cmp(&b.name));
    AssetItem::group(SKELETON_GROUP, markers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_matches() {
        assert!(name_matches("leftEye", "leftEye"));
        assert!(name_matches("leftEye-pupil", "leftEye"));
        assert!(name_matches("skeleton_v2", "skeleton"));
        assert!(!name_matches("leftEye0", "leftEye"));
        assert!(!name_matches("nose0", "nose"));
        assert!(!name_matches("eye", "leftEye"));
    }

    #[test]
    fn test_from_json() {
        let json = r##"{
            "items": [
                { "name": "skeleton", "type": "group", "children": [
                    { "name": "nose", "type": "marker", "position": { "x": 1.0, "y": 2.0 } }
                ]},
                { "name": "illustration", "type": "group", "children": [
                    { "name": "arm", "type": "path", "closed": true,
                      "style": { "fill": "#ff0000" },
                      "segments": [
                        { "point": { "x": 0.0, "y": 0.0 } },
                        { "point": { "x": 4.0, "y": 2.0 }, "handle_in": { "x": -1.0, "y": 0.0 } }
                      ] }
                ]}
            ]
        }"##;
        let asset = VectorAsset::from_json(json).unwrap();
        let illustration = asset.find_group("illustration").unwrap();
        let arm = illustration.children()[0].as_path().unwrap();
        assert!(arm.closed);
        assert_eq!(arm.style.fill.as_deref(), Some("#ff0000"));
        assert_eq!(arm.segments[1].handle_in, Some(Vec2::new(-1.0, 0.0)));
        assert_eq!(arm.segments[0].handle_out, None);

        let skeleton = asset.find_group("skeleton").unwrap();
        let rest = skeleton_rest_positions(skeleton);
        assert_eq!(rest.get("nose"), Some(&Vec2::new(1.0, 2.0)));
    }

    #[test]
    fn test_missing_group() {
        let asset = VectorAsset::new(vec![AssetItem::group("skeleton", Vec::new())]);
        assert!(matches!(
            asset.find_group("illustration"),
            Err(PuppetError::MissingGroup(_))
        ));
    }

    #[test]
    fn test_path_position_is_bounds_centre() {
        let item = AssetItem::path(
            "leftEar",
            PathData::polyline([Vec2::new(0.0, 0.0), Vec2::new(10.0, 4.0)], false),
        );
        assert_eq!(item.position(), Some(Vec2::new(5.0, 2.0)));
    }

    #[test]
    fn test_find_prefers_exact_keypoint() {
        let group = AssetItem::group(
            "skeleton",
            vec![
                AssetItem::marker("nose0", Vec2::new(9.0, 9.0)),
                AssetItem::group(
                    "head",
                    vec![AssetItem::marker("nose-tip", Vec2::new(1.0, 1.0))],
                ),
            ],
        );
        let rest = skeleton_rest_positions(&group);
        assert_eq!(rest.get("nose"), Some(&Vec2::new(1.0, 1.0)));
        assert_eq!(rest.get("nose0"), Some(&Vec2::new(9.0, 9.0)));
    }
}
