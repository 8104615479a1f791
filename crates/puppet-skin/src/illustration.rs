//! Illustration - a bound character asset
//!
//! Binding happens once per asset. The result is a skeleton plus the bound
//! paths; the bindings are immutable and shared between every instance made
//! with [`Illustration::instantiate`], while each instance owns its own
//! skeleton state and rendered frame.

use std::sync::Arc;

use puppet_core::{FaceEstimate, PartState, PoseEstimate, PuppetError, PuppetResult};
use puppet_skeleton::{BoneId, Skeleton, SkeletonConfig};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    skeleton_rest_positions, AssetItem, AssetNode, BindConfig, Candidates, RenderPath,
    SkinnedPath, VectorAsset, AUX_PREFIX, BONE_PREFIX, ILLUSTRATION_GROUP, SKELETON_GROUP,
};

/// Summary of a bind pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindStats {
    /// Paths bound
    pub paths: usize,
    /// Control points bound (anchors and handles)
    pub points: usize,
    /// Control points no bone reached
    pub empty_points: usize,
    /// Secondary bones declared by aux groups
    pub secondary_bones: usize,
}

/// A character bound to its skeleton
#[derive(Debug, Clone)]
pub struct Illustration {
    template: Arc<Skeleton>,
    paths: Arc<[SkinnedPath]>,
    stats: BindStats,
    skeleton: Skeleton,
    frame: Vec<RenderPath>,
}

impl Illustration {
    /// Bind every drawable path of `asset` to a skeleton built from its
    /// keypoint group
    pub fn bind(
        asset: &VectorAsset,
        skeleton_config: SkeletonConfig,
        bind_config: &BindConfig,
    ) -> PuppetResult<Self> {
        let rest = skeleton_rest_positions(asset.find_group(SKELETON_GROUP)?);
        let mut skeleton = Skeleton::new(&rest, skeleton_config)?;
        let illustration = asset.find_group(ILLUSTRATION_GROUP)?;

        let mut paths = Vec::new();
        let mut stats = BindStats::default();

        bind_items(
            illustration.children(),
            Candidates::Nearest,
            false,
            &mut skeleton,
            bind_config,
            &mut paths,
            &mut stats,
        )?;

        stats.paths = paths.len();
        for skinning in paths.iter().flat_map(|p| p.skinnings()) {
            stats.points += 1;
            if skinning.is_empty() {
                stats.empty_points += 1;
            }
        }
        info!(
            paths = stats.paths,
            points = stats.points,
            empty_points = stats.empty_points,
            secondary_bones = stats.secondary_bones,
            "illustration bound"
        );

        let frame = paths.iter().map(|p| p.render(&skeleton)).collect();
        Ok(Illustration {
            template: Arc::new(skeleton.clone()),
            paths: paths.into(),
            stats,
            skeleton,
            frame,
        })
    }

    /// A fresh instance at rest sharing this illustration's bindings
    pub fn instantiate(&self) -> Illustration {
        let skeleton = (*self.template).clone();
        let frame = self.paths.iter().map(|p| p.render(&skeleton)).collect();
        Illustration {
            template: Arc::clone(&self.template),
            paths: Arc::clone(&self.paths),
            stats: self.stats.clone(),
            skeleton,
            frame,
        }
    }

    /// Feed one frame of estimates. On an invalid frame the previous
    /// rendered frame is kept and `false` is returned.
    pub fn update(&mut self, pose: &PoseEstimate, face: Option<&FaceEstimate>) -> bool {
        if !self.skeleton.update(pose, face) {
            return false;
        }
        self.rerender();
        true
    }

    /// Install a peer's parts snapshot
    pub fn apply_remote(
        &mut self,
        parts: impl IntoIterator<Item = (String, PartState)>,
        body_scale: Option<f64>,
        face_scale: Option<f64>,
    ) -> bool {
        if !self.skeleton.apply_remote(parts, body_scale, face_scale) {
            return false;
        }
        self.rerender();
        true
    }

    /// Last valid rendered frame
    pub fn frame(&self) -> &[RenderPath] {
        &self.frame
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    pub fn paths(&self) -> &[SkinnedPath] {
        &self.paths
    }

    pub fn stats(&self) -> &BindStats {
        &self.stats
    }

    /// Whether two illustrations share the same bindings
    pub fn shares_bindings(&self, other: &Illustration) -> bool {
        Arc::ptr_eq(&self.paths, &other.paths)
    }

    fn rerender(&mut self) {
        self.frame.clear();
        self.frame
            .extend(self.paths.iter().map(|p| p.render(&self.skeleton)));
    }
}

/// Register the `bone:<parent>` items of an aux group as secondary bones
fn declare_secondary_bones(group: &AssetItem, skeleton: &mut Skeleton) -> PuppetResult<Vec<BoneId>> {
    let mut bones = Vec::new();
    for item in group.children() {
        let Some(parent) = item.name.strip_prefix(BONE_PREFIX) else {
            continue;
        };
        let (rest0, rest1) = match item.as_path().map(|p| p.segments.as_slice()) {
            Some([first, second]) => (first.point, second.point),
            _ => {
                return Err(PuppetError::InvalidAsset(format!(
                    "{}/{} must be a two-point path",
                    group.name, item.name
                )))
            }
        };
        let name = format!("{}/{}#{}", group.name, parent, bones.len());
        bones.push(skeleton.add_secondary_bone(&name, parent, rest0, rest1)?);
    }
    if bones.is_empty() {
        return Err(PuppetError::InvalidAsset(format!(
            "aux group {} declares no bones",
            group.name
        )));
    }
    debug!(group = %group.name, bones = bones.len(), "aux group bones declared");
    Ok(bones)
}

/// Bind every path below `items`, skipping markers and bone declarations.
///
/// An `aux` group at any depth declares its secondary bones first and binds
/// its paths to them alone. `bone:` items are only legal as direct children
/// of an aux group (`declares_bones`).
fn bind_items(
    items: &[AssetItem],
    candidates: Candidates<'_>,
    declares_bones: bool,
    skeleton: &mut Skeleton,
    config: &BindConfig,
    out: &mut Vec<SkinnedPath>,
    stats: &mut BindStats,
) -> PuppetResult<()> {
    for item in items {
        match &item.node {
            AssetNode::Group { children } if item.name.starts_with(AUX_PREFIX) => {
                let bones = declare_secondary_bones(item, skeleton)?;
                stats.secondary_bones += bones.len();
                bind_items(children, Candidates::Explicit(&bones), true, skeleton, config, out, stats)?;
            }
            AssetNode::Group { children } => {
                bind_items(children, candidates, false, skeleton, config, out, stats)?
            }
            AssetNode::Path(_) if item.name.starts_with(BONE_PREFIX) => {
                if !declares_bones {
                    return Err(PuppetError::InvalidAsset(format!(
                        "{} must sit directly inside an aux group",
                        item.name
                    )));
                }
            }
            AssetNode::Path(data) => {
                out.push(SkinnedPath::bind(&item.name, data, candidates, skeleton, config))
            }
            AssetNode::Marker { .. } => {}
        }
    }
    Ok(())
}
