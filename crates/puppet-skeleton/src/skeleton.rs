//! Skeleton - the bone graph and its per-frame update
//!
//! Update state machine: `invalid → parts-updated → valid | invalid`.
//! A frame that fails any gate leaves the skeleton invalid and the caller
//! keeps showing the last valid frame.

use std::collections::HashMap;
use std::fmt;

use puppet_core::{
    face_part_names, is_tracked_body_part, Color, FaceEstimate, LegJoint, LocalFrame, PartState,
    PoseEstimate, PuppetError, PuppetResult, Vec2, EPSILON, LEFT_EAR, LEFT_JAW_CORNER, NOSE_TIP,
    RIGHT_EAR, RIGHT_JAW_CORNER, SYNTHESIZED_LEG_PARTS,
};
use tracing::{debug, info, trace};

use crate::{bone_name, face_bones, Bone, BoneGroup, BoneId, BoneKind, SkeletonConfig, BODY_BONES};

/// Why the last update left the skeleton invalid
#[derive(Debug, Clone, PartialEq)]
pub enum InvalidReason {
    /// No update has happened yet
    NotUpdated,
    /// Overall pose confidence below the gate
    LowPoseConfidence(f64),
    /// A reference part (the ears) has never been observed
    MissingPart(String),
    /// A bone endpoint did not resolve to a part
    UnresolvedBone { bone: String, part: String },
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidReason::NotUpdated => write!(f, "not updated yet"),
            InvalidReason::LowPoseConfidence(score) => {
                write!(f, "pose confidence {score:.3} below threshold")
            }
            InvalidReason::MissingPart(part) => write!(f, "missing part {part}"),
            InvalidReason::UnresolvedBone { bone, part } => {
                write!(f, "bone {bone} has no part {part}")
            }
        }
    }
}

/// Which reference pair a secondary bone endpoint was captured against
#[derive(Debug, Clone, Copy, PartialEq)]
enum SecondaryReference {
    /// (parent endpoint i, nose tip)
    ParentEndpoint(usize),
    /// (parent kp0, parent kp1), used when the endpoint sits on the nose tip
    ParentBone,
}

#[derive(Debug, Clone)]
struct SecondaryBone {
    id: BoneId,
    parent: BoneId,
    endpoints: [(SecondaryReference, LocalFrame); 2],
}

/// Per-bone diagnostic record
#[derive(Debug, Clone, PartialEq)]
pub struct BoneDiagnostic {
    pub name: String,
    pub kind: BoneKind,
    pub color: Color,
    pub endpoints: [Vec2; 2],
    pub confidence: f64,
}

/// Parts and scales held by a skeleton, as published to peers
#[derive(Debug, Clone, PartialEq)]
pub struct SkeletonSnapshot {
    pub parts: HashMap<String, PartState>,
    pub body_scale: f64,
    pub face_scale: f64,
    pub valid: bool,
}

/// The full bone graph of one character
#[derive(Debug, Clone)]
pub struct Skeleton {
    config: SkeletonConfig,
    bones: Vec<Bone>,
    by_name: HashMap<String, BoneId>,
    body_bones: Vec<BoneId>,
    face_bones: Vec<BoneId>,
    secondary: Vec<SecondaryBone>,
    groups: Vec<(BoneGroup, Vec<BoneId>)>,
    rest: HashMap<String, Vec2>,
    parts: HashMap<String, PartState>,
    /// Face landmark frames relative to the jaw corners, captured at rest
    face_inference: Vec<(&'static str, LocalFrame)>,
    left_ear_to_face: LocalFrame,
    right_ear_to_face: LocalFrame,
    body_len0: f64,
    face_len0: f64,
    current_body_scale: f64,
    current_face_scale: f64,
    valid: bool,
    invalid_reason: Option<InvalidReason>,
}

impl Skeleton {
    /// Build the skeleton from rest positions keyed by keypoint name
    pub fn new(rest: &HashMap<String, Vec2>, config: SkeletonConfig) -> PuppetResult<Self> {
        let lookup = |bone: &str, part: &str| -> PuppetResult<Vec2> {
            rest.get(part).copied().ok_or_else(|| PuppetError::MissingKeypoint {
                bone: bone.to_string(),
                part: part.to_string(),
            })
        };

        let mut bones = Vec::new();
        let mut by_name = HashMap::new();
        let mut body_bones = Vec::new();
        let mut face_ids = Vec::new();
        let mut groups: Vec<(BoneGroup, Vec<BoneId>)> =
            BoneGroup::all().iter().map(|g| (*g, Vec::new())).collect();

        for (kp0, kp1, group) in BODY_BONES {
            let name = bone_name(kp0, kp1);
            let bone = Bone::new(
                name.clone(),
                BoneKind::Body,
                kp0,
                kp1,
                lookup(&name, kp0)?,
                lookup(&name, kp1)?,
            );
            let id = BoneId(bones.len());
            bones.push(bone);
            by_name.insert(name, id);
            body_bones.push(id);
            if let Some((_, members)) = groups.iter_mut().find(|(g, _)| *g == group) {
                members.push(id);
            }
        }

        for (kp0, kp1) in face_bones() {
            let name = bone_name(kp0, kp1);
            let bone = Bone::new(
                name.clone(),
                BoneKind::Face,
                kp0,
                kp1,
                lookup(&name, kp0)?,
                lookup(&name, kp1)?,
            );
            let id = BoneId(bones.len());
            bones.push(bone);
            by_name.insert(name, id);
            face_ids.push(id);
            if let Some((_, members)) = groups.iter_mut().find(|(g, _)| *g == BoneGroup::Face) {
                members.push(id);
            }
        }

        let left_ear = lookup("ear reference", LEFT_EAR)?;
        let right_ear = lookup("ear reference", RIGHT_EAR)?;
        let left_jaw = lookup("face inference", LEFT_JAW_CORNER)?;
        let right_jaw = lookup("face inference", RIGHT_JAW_CORNER)?;

        let mut face_inference = Vec::new();
        for name in face_part_names() {
            let p = lookup("face inference", name)?;
            face_inference.push((name, LocalFrame::capture(left_jaw, right_jaw, p)));
        }

        let body_len0: f64 = body_bones.iter().map(|id| bones[id.0].rest_length()).sum();
        let face_len0: f64 = face_ids.iter().map(|id| bones[id.0].rest_length()).sum();

        info!(
            body_bones = body_bones.len(),
            face_bones = face_ids.len(),
            body_len0,
            face_len0,
            "skeleton bound"
        );

        Ok(Skeleton {
            config,
            bones,
            by_name,
            body_bones,
            face_bones: face_ids,
            secondary: Vec::new(),
            groups,
            rest: rest.clone(),
            parts: HashMap::new(),
            face_inference,
            left_ear_to_face: LocalFrame::capture(left_ear, right_ear, left_jaw),
            right_ear_to_face: LocalFrame::capture(left_ear, right_ear, right_jaw),
            body_len0,
            face_len0,
            current_body_scale: 1.0,
            current_face_scale: 1.0,
            valid: false,
            invalid_reason: Some(InvalidReason::NotUpdated),
        })
    }

    /// Register an auxiliary bone that follows `parent` and the nose tip
    pub fn add_secondary_bone(
        &mut self,
        name: &str,
        parent: &str,
        rest0: Vec2,
        rest1: Vec2,
    ) -> PuppetResult<BoneId> {
        if self.by_name.contains_key(name) {
            return Err(PuppetError::DuplicateBone(name.to_string()));
        }
        let parent_id = self
            .bone_id(parent)
            .ok_or_else(|| PuppetError::UnknownBone(parent.to_string()))?;
        let nose = self
            .rest
            .get(NOSE_TIP)
            .copied()
            .ok_or_else(|| PuppetError::MissingKeypoint {
                bone: name.to_string(),
                part: NOSE_TIP.to_string(),
            })?;

        let parent_bone = &self.bones[parent_id.0];
        let parent_rest = parent_bone.rest();
        let kind = parent_bone.kind;

        let capture = |i: usize, p: Vec2| {
            if parent_rest[i].distance(nose) < EPSILON {
                (
                    SecondaryReference::ParentBone,
                    LocalFrame::capture(parent_rest[0], parent_rest[1], p),
                )
            } else {
                (
                    SecondaryReference::ParentEndpoint(i),
                    LocalFrame::capture(parent_rest[i], nose, p),
                )
            }
        };
        let endpoints = [capture(0, rest0), capture(1, rest1)];

        let id = BoneId(self.bones.len());
        let bone = Bone::new(name, kind, format!("{name}.0"), format!("{name}.1"), rest0, rest1)
            .with_parent(parent_id);
        self.bones.push(bone);
        self.by_name.insert(name.to_string(), id);
        self.secondary.push(SecondaryBone {
            id,
            parent: parent_id,
            endpoints,
        });

        debug!(bone = name, parent, "secondary bone added");
        Ok(id)
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn config(&self) -> &SkeletonConfig {
        &self.config
    }

    /// Bone by id.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not handed out by this skeleton. Use
    /// [`Skeleton::get_bone`] for ids of unknown origin.
    pub fn bone(&self, id: BoneId) -> &Bone {
        &self.bones[id.0]
    }

    pub fn get_bone(&self, id: BoneId) -> Option<&Bone> {
        self.bones.get(id.0)
    }

    pub fn bone_id(&self, name: &str) -> Option<BoneId> {
        self.by_name.get(name).copied()
    }

    pub fn bone_by_name(&self, name: &str) -> Option<&Bone> {
        self.bone_id(name).and_then(|id| self.get_bone(id))
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn body_bones(&self) -> &[BoneId] {
        &self.body_bones
    }

    pub fn face_bones(&self) -> &[BoneId] {
        &self.face_bones
    }

    pub fn secondary_bones(&self) -> impl Iterator<Item = BoneId> + '_ {
        self.secondary.iter().map(|s| s.id)
    }

    pub fn group(&self, group: BoneGroup) -> &[BoneId] {
        self.groups
            .iter()
            .find(|(g, _)| *g == group)
            .map(|(_, members)| members.as_slice())
            .unwrap_or(&[])
    }

    pub fn parts(&self) -> &HashMap<String, PartState> {
        &self.parts
    }

    pub fn part(&self, name: &str) -> Option<&PartState> {
        self.parts.get(name)
    }

    pub fn rest_position(&self, name: &str) -> Option<Vec2> {
        self.rest.get(name).copied()
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn invalid_reason(&self) -> Option<&InvalidReason> {
        self.invalid_reason.as_ref()
    }

    pub fn current_body_scale(&self) -> f64 {
        self.current_body_scale
    }

    pub fn current_face_scale(&self) -> f64 {
        self.current_face_scale
    }

    /// Offset scale applied to points skinned to a bone of this kind
    pub fn scale_for(&self, kind: BoneKind) -> f64 {
        match kind {
            BoneKind::Body => self.current_body_scale,
            BoneKind::Face => self.current_face_scale,
        }
    }

    // ========================================================================
    // BIND-TIME LOOKUP
    // ========================================================================

    /// Bones of the group(s) nearest to `point` at rest. Groups tied for
    /// nearest are all returned.
    pub fn find_bone_group(&self, point: Vec2) -> Vec<BoneId> {
        let distances: Vec<(f64, &[BoneId])> = self
            .groups
            .iter()
            .filter(|(_, members)| !members.is_empty())
            .map(|(_, members)| {
                let d = members
                    .iter()
                    .map(|id| self.bones[id.0].rest_distance(point))
                    .fold(f64::INFINITY, f64::min);
                (d, members.as_slice())
            })
            .collect();

        let best = distances
            .iter()
            .map(|(d, _)| *d)
            .fold(f64::INFINITY, f64::min);
        let tolerance = EPSILON * best.max(1.0);

        distances
            .into_iter()
            .filter(|(d, _)| *d <= best + tolerance)
            .flat_map(|(_, members)| members.iter().copied())
            .collect()
    }

    // ========================================================================
    // PER-FRAME UPDATE
    // ========================================================================

    /// Fold one pose estimate (and optionally a face estimate) into the
    /// skeleton. Both inputs are expected to be mirrored already. Returns
    /// whether the skeleton is valid afterwards.
    pub fn update(&mut self, pose: &PoseEstimate, face: Option<&FaceEstimate>) -> bool {
        // Stage 1: Gate on overall pose confidence, before touching any part.
        // NaN never passes.
        if !(pose.score >= self.config.min_pose_confidence) {
            return self.invalidate(InvalidReason::LowPoseConfidence(pose.score));
        }

        // Stage 2: Confidence-weighted fusion of tracked body parts
        for keypoint in &pose.keypoints {
            if !is_tracked_body_part(&keypoint.name) {
                continue;
            }
            let observed = PartState::new(keypoint.position, keypoint.score);
            match self.parts.get_mut(&keypoint.name) {
                Some(prior) => *prior = prior.fuse(observed),
                None => {
                    self.parts.insert(keypoint.name.clone(), observed);
                }
            }
        }

        // Stage 3: Legs hang at fixed offsets below the hips
        for (part, hip, joint) in SYNTHESIZED_LEG_PARTS {
            let Some(hip_state) = self.parts.get(hip).copied() else {
                continue;
            };
            let drop = match joint {
                LegJoint::Knee => self.config.knee_offset,
                LegJoint::Ankle => self.config.ankle_offset,
            };
            self.parts.insert(
                part.to_string(),
                PartState::new(hip_state.position + Vec2::new(0.0, drop), hip_state.confidence),
            );
        }

        // Stage 4: Ears anchor the face
        let (Some(left_ear), Some(right_ear)) = (
            self.parts.get(LEFT_EAR).map(|p| p.position),
            self.parts.get(RIGHT_EAR).map(|p| p.position),
        ) else {
            let missing = if self.parts.contains_key(LEFT_EAR) {
                RIGHT_EAR
            } else {
                LEFT_EAR
            };
            return self.invalidate(InvalidReason::MissingPart(missing.to_string()));
        };

        // Stage 5: Face landmarks, tracked or inferred
        match face.filter(|f| self.face_usable(f)) {
            Some(face) => self.apply_tracked_face(face, left_ear, right_ear),
            None => self.infer_face(left_ear, right_ear),
        }

        // Stages 6-8: Bones, secondary bones, scales
        if let Err(reason) = self.refresh_bones() {
            return self.invalidate(reason);
        }
        self.refresh_secondary_bones();
        self.refresh_scales();

        // Stage 9
        self.mark_valid()
    }

    /// Install a parts snapshot received from a peer
    pub fn apply_remote(
        &mut self,
        parts: impl IntoIterator<Item = (String, PartState)>,
        body_scale: Option<f64>,
        face_scale: Option<f64>,
    ) -> bool {
        self.parts.extend(parts);
        if let Err(reason) = self.refresh_bones() {
            return self.invalidate(reason);
        }
        self.refresh_secondary_bones();
        self.refresh_scales();
        if let Some(scale) = body_scale.filter(|s| s.is_finite() && *s > 0.0) {
            self.current_body_scale = scale;
        }
        if let Some(scale) = face_scale.filter(|s| s.is_finite() && *s > 0.0) {
            self.current_face_scale = scale;
        }
        self.mark_valid()
    }

    /// Current parts and scales
    pub fn snapshot(&self) -> SkeletonSnapshot {
        SkeletonSnapshot {
            parts: self.parts.clone(),
            body_scale: self.current_body_scale,
            face_scale: self.current_face_scale,
            valid: self.valid,
        }
    }

    /// Per-bone diagnostic list
    pub fn diagnostics(&self) -> Vec<BoneDiagnostic> {
        self.bones
            .iter()
            .map(|bone| BoneDiagnostic {
                name: bone.name.clone(),
                kind: bone.kind,
                color: bone.color,
                endpoints: bone.current(),
                confidence: bone.confidence(),
            })
            .collect()
    }

    fn face_usable(&self, face: &FaceEstimate) -> bool {
        if !(face.confidence > self.config.min_face_confidence) {
            return false;
        }
        if face.mesh.len() < puppet_core::FACE_MESH_SIZE {
            debug!(vertices = face.mesh.len(), "face mesh too short, inferring face");
            return false;
        }
        true
    }

    fn apply_tracked_face(&mut self, face: &FaceEstimate, left_ear: Vec2, right_ear: Vec2) {
        for name in face_part_names() {
            if let Some(position) = face.landmark(name) {
                self.parts
                    .insert(name.to_string(), PartState::new(position, face.confidence));
            }
        }
        // Remember how the jaw sits relative to the ears for later fallback
        if let Some(jaw) = self.parts.get(LEFT_JAW_CORNER) {
            self.left_ear_to_face = LocalFrame::capture(left_ear, right_ear, jaw.position);
        }
        if let Some(jaw) = self.parts.get(RIGHT_JAW_CORNER) {
            self.right_ear_to_face = LocalFrame::capture(left_ear, right_ear, jaw.position);
        }
        trace!(confidence = face.confidence, "face tracked");
    }

    fn infer_face(&mut self, left_ear: Vec2, right_ear: Vec2) {
        let left_jaw = self.left_ear_to_face.reconstruct(left_ear, right_ear);
        let right_jaw = self.right_ear_to_face.reconstruct(left_ear, right_ear);
        self.current_face_scale = self.current_body_scale;

        // Inferred landmarks carry a flat confidence; see SkeletonConfig
        let confidence = self.config.inferred_face_confidence;
        for (name, frame) in &self.face_inference {
            let position = frame.reconstruct(left_jaw, right_jaw);
            self.parts
                .insert(name.to_string(), PartState::new(position, confidence));
        }
        trace!("face inferred from ears");
    }

    fn refresh_bones(&mut self) -> Result<(), InvalidReason> {
        let ids = self.body_bones.iter().chain(self.face_bones.iter());
        for id in ids {
            let bone = &mut self.bones[id.0];
            let resolve = |part: &str| {
                self.parts
                    .get(part)
                    .copied()
                    .ok_or_else(|| InvalidReason::UnresolvedBone {
                        bone: bone.name.clone(),
                        part: part.to_string(),
                    })
            };
            let p0 = resolve(&bone.kp0)?;
            let p1 = resolve(&bone.kp1)?;
            bone.set_current(
                p0.position,
                p1.position,
                (p0.confidence + p1.confidence) / 2.0,
            );
        }
        Ok(())
    }

    fn refresh_secondary_bones(&mut self) {
        let Some(nose) = self.parts.get(NOSE_TIP).map(|p| p.position) else {
            return;
        };
        for secondary in &self.secondary {
            let parent = &self.bones[secondary.parent.0];
            let parent_current = parent.current();
            let confidence = parent.confidence();

            let place = |(reference, frame): &(SecondaryReference, LocalFrame)| match reference {
                SecondaryReference::ParentEndpoint(i) => frame.reconstruct(parent_current[*i], nose),
                SecondaryReference::ParentBone => {
                    frame.reconstruct(parent_current[0], parent_current[1])
                }
            };
            let p0 = place(&secondary.endpoints[0]);
            let p1 = place(&secondary.endpoints[1]);
            self.bones[secondary.id.0].set_current(p0, p1, confidence);
        }
    }

    fn refresh_scales(&mut self) {
        let total = |ids: &[BoneId]| -> f64 { ids.iter().map(|id| self.bones[id.0].length()).sum() };
        if self.face_len0 > EPSILON {
            self.current_face_scale = total(&self.face_bones) / self.face_len0;
        }
        if self.body_len0 > EPSILON {
            self.current_body_scale = total(&self.body_bones) / self.body_len0;
        }
    }

    fn invalidate(&mut self, reason: InvalidReason) -> bool {
        debug!(%reason, "skeleton invalid");
        self.valid = false;
        self.invalid_reason = Some(reason);
        false
    }

    fn mark_valid(&mut self) -> bool {
        self.valid = true;
        self.invalid_reason = None;
        true
    }
}
