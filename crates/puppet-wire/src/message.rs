//! Peer messages
//!
//! A sender publishes its skeleton as a stream of [`SkeletonDiff`]s. A
//! keyframe carries every part; other updates carry only the parts that
//! moved. Receivers merge diffs into the parts they already hold.

use std::collections::{BTreeMap, HashMap};

use puppet_core::{PartState, PuppetError, PuppetResult};
use serde::{Deserialize, Serialize};

use crate::WirePoint;

/// Current peer protocol version
pub const PROTOCOL_VERSION: u8 = 1;

/// One part as sent to peers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WirePart {
    pub position: WirePoint,
    pub confidence: f64,
}

impl From<PartState> for WirePart {
    fn from(state: PartState) -> Self {
        WirePart {
            position: WirePoint(state.position),
            confidence: state.confidence,
        }
    }
}

impl From<WirePart> for PartState {
    fn from(part: WirePart) -> Self {
        PartState::new(part.position.0, part.confidence)
    }
}

/// Parts and scales that changed since the sender's previous update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkeletonDiff {
    #[serde(default)]
    pub parts: BTreeMap<String, WirePart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_scale: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face_scale: Option<f64>,
    /// Carries every part; receivers may start from it
    #[serde(default)]
    pub keyframe: bool,
}

impl SkeletonDiff {
    /// Parts as skeleton state
    pub fn part_states(&self) -> impl Iterator<Item = (String, PartState)> + '_ {
        self.parts
            .iter()
            .map(|(name, part)| (name.clone(), PartState::from(*part)))
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty() && self.body_scale.is_none() && self.face_scale.is_none()
    }
}

/// Message payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Payload {
    /// New skeleton state
    SkeletonUpdate(SkeletonDiff),
    /// The sender's frame was invalid; keep showing the last one
    Frozen { reason: String },
    /// The sender is leaving
    Goodbye,
}

/// A versioned, sequenced peer message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerMessage {
    pub version: u8,
    /// Monotonic per sender
    pub sequence: u64,
    pub payload: Payload,
}

impl PeerMessage {
    pub fn new(sequence: u64, payload: Payload) -> Self {
        PeerMessage {
            version: PROTOCOL_VERSION,
            sequence,
            payload,
        }
    }

    pub fn is_keyframe(&self) -> bool {
        matches!(&self.payload, Payload::SkeletonUpdate(diff) if diff.keyframe)
    }

    pub fn to_json(&self) -> PuppetResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| PuppetError::Json(e.to_string()))
    }

    pub fn from_json(body: &[u8]) -> PuppetResult<Self> {
        let message: PeerMessage =
            serde_json::from_slice(body).map_err(|e| PuppetError::Json(e.to_string()))?;
        if message.version != PROTOCOL_VERSION {
            return Err(PuppetError::UnsupportedVersion(message.version));
        }
        Ok(message)
    }
}

/// Turns successive skeleton states into diffs
#[derive(Debug, Clone)]
pub struct DiffEncoder {
    last_parts: HashMap<String, PartState>,
    last_body_scale: Option<f64>,
    last_face_scale: Option<f64>,
    keyframe_interval: u64,
    since_keyframe: u64,
    tolerance: f64,
}

impl DiffEncoder {
    /// Emit a keyframe every `keyframe_interval` updates (0 = first only).
    /// Changes at or below `tolerance` are not sent.
    pub fn new(keyframe_interval: u64, tolerance: f64) -> Self {
        DiffEncoder {
            last_parts: HashMap::new(),
            last_body_scale: None,
            last_face_scale: None,
            keyframe_interval,
            since_keyframe: 0,
            tolerance,
        }
    }

    /// Make the next diff a keyframe
    pub fn force_keyframe(&mut self) {
        self.last_parts.clear();
        self.last_body_scale = None;
        self.last_face_scale = None;
    }

    pub fn encode(
        &mut self,
        parts: &HashMap<String, PartState>,
        body_scale: f64,
        face_scale: f64,
    ) -> SkeletonDiff {
        let due = self.keyframe_interval > 0 && self.since_keyframe >= self.keyframe_interval;
        if due || self.last_parts.is_empty() {
            self.force_keyframe();
            self.since_keyframe = 0;
        }
        self.since_keyframe += 1;
        let keyframe = self.last_parts.is_empty();

        let tolerance = self.tolerance;
        let changed = |old: Option<&PartState>, new: &PartState| match old {
            None => true,
            Some(old) => {
                old.position.distance(new.position) > tolerance
                    || (old.confidence - new.confidence).abs() > tolerance
            }
        };

        let mut diff = SkeletonDiff {
            keyframe,
            ..Default::default()
        };
        for (name, state) in parts {
            if changed(self.last_parts.get(name), state) {
                diff.parts.insert(name.clone(), WirePart::from(*state));
                self.last_parts.insert(name.clone(), *state);
            }
        }

        let scale_changed = |old: Option<f64>, new: f64| old.map_or(true, |o| (o - new).abs() > tolerance);
        if scale_changed(self.last_body_scale, body_scale) {
            diff.body_scale = Some(body_scale);
            self.last_body_scale = Some(body_scale);
        }
        if scale_changed(self.last_face_scale, face_scale) {
            diff.face_scale = Some(face_scale);
            self.last_face_scale = Some(face_scale);
        }
        diff
    }
}
