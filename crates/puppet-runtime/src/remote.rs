//! Remote puppet - a peer's character driven by its skeleton updates
//!
//! The receiver owns its own illustration instance and only ever applies
//! parts; it never runs the estimators. Updates arrive in order per sender,
//! so anything at or below the last applied sequence is dropped.

use puppet_skin::{Illustration, RenderPath};
use puppet_wire::{FrameReader, Payload, PeerMessage};
use tracing::{debug, info, warn};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RemoteStats {
    pub applied: u64,
    pub stale: u64,
    /// Diffs seen before the first keyframe
    pub unsynced: u64,
    /// Updates the skeleton could not use
    pub invalid: u64,
    /// Frames that failed to decode
    pub rejected: u64,
}

pub struct RemotePuppet {
    illustration: Illustration,
    reader: FrameReader,
    last_sequence: Option<u64>,
    synced: bool,
    peer_frozen: Option<String>,
    departed: bool,
    stats: RemoteStats,
}

impl RemotePuppet {
    /// `illustration` is usually an [`Illustration::instantiate`] of the
    /// local character
    pub fn new(illustration: Illustration) -> Self {
        RemotePuppet {
            illustration,
            reader: FrameReader::new(),
            last_sequence: None,
            synced: false,
            peer_frozen: None,
            departed: false,
            stats: RemoteStats::default(),
        }
    }

    /// Apply one message. Returns whether the rendered frame changed.
    pub fn receive(&mut self, message: PeerMessage) -> bool {
        if let Some(last) = self.last_sequence {
            if message.sequence <= last {
                self.stats.stale += 1;
                return false;
            }
            if message.sequence > last + 1 {
                debug!(last, sequence = message.sequence, "peer sequence gap");
            }
        }
        self.last_sequence = Some(message.sequence);

        match message.payload {
            Payload::SkeletonUpdate(diff) => {
                if !diff.keyframe && !self.synced {
                    self.stats.unsynced += 1;
                    return false;
                }
                self.synced = true;
                self.peer_frozen = None;
                let applied = self.illustration.apply_remote(
                    diff.part_states(),
                    diff.body_scale,
                    diff.face_scale,
                );
                if applied {
                    self.stats.applied += 1;
                } else {
                    self.stats.invalid += 1;
                }
                applied
            }
            Payload::Frozen { reason } => {
                debug!(%reason, "peer frozen");
                self.peer_frozen = Some(reason);
                false
            }
            Payload::Goodbye => {
                info!(sequence = message.sequence, "peer departed");
                self.departed = true;
                false
            }
        }
    }

    /// Feed raw bytes from the transport; returns how many messages
    /// changed the rendered frame
    pub fn ingest(&mut self, data: &[u8]) -> usize {
        self.reader.extend(data);
        let mut changed = 0;
        loop {
            match self.reader.next_message() {
                Ok(Some(message)) => {
                    if self.receive(message) {
                        changed += 1;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "dropping bad peer frame");
                    self.stats.rejected += 1;
                }
            }
        }
        changed
    }

    pub fn frame(&self) -> &[RenderPath] {
        self.illustration.frame()
    }

    pub fn illustration(&self) -> &Illustration {
        &self.illustration
    }

    pub fn stats(&self) -> &RemoteStats {
        &self.stats
    }

    pub fn last_sequence(&self) -> Option<u64> {
        self.last_sequence
    }

    /// Reason the peer gave for its last frozen frame, until it renders again
    pub fn peer_frozen(&self) -> Option<&str> {
        self.peer_frozen.as_deref()
    }

    pub fn departed(&self) -> bool {
        self.departed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use puppet_core::{PartState, Vec2};
    use puppet_skeleton::{pose_from, upright_figure, SkeletonConfig};
    use puppet_skin::{skeleton_group, AssetItem, BindConfig, PathData, VectorAsset};
    use puppet_wire::{encode_frame, DiffEncoder};
    use std::collections::HashMap;

    fn local() -> Illustration {
        let asset = VectorAsset::new(vec![
            skeleton_group(&upright_figure()),
            AssetItem::group(
                "illustration",
                vec![AssetItem::path(
                    "belt",
                    PathData::polyline([Vec2::new(-60.0, 100.0), Vec2::new(60.0, 100.0)], false),
                )],
            ),
        ]);
        Illustration::bind(&asset, SkeletonConfig::default(), &BindConfig::default()).unwrap()
    }

    fn moved_parts(offset: Vec2) -> HashMap<String, PartState> {
        let mut sender = local();
        let pose = pose_from(&upright_figure(), offset, 0.9);
        assert!(sender.update(&pose, None));
        sender.skeleton().snapshot().parts
    }

    fn update(sequence: u64, encoder: &mut DiffEncoder, offset: Vec2) -> PeerMessage {
        let diff = encoder.encode(&moved_parts(offset), 1.0, 1.0);
        PeerMessage::new(sequence, Payload::SkeletonUpdate(diff))
    }

    #[test]
    fn test_keyframe_then_diff_moves_puppet() {
        let mut remote = RemotePuppet::new(local());
        let mut encoder = DiffEncoder::new(30, 1e-3);

        assert!(remote.receive(update(1, &mut encoder, Vec2::new(10.0, 0.0))));
        assert!(remote.receive(update(2, &mut encoder, Vec2::new(20.0, 5.0))));

        let belt = &remote.frame()[0];
        assert!(belt.segments[0].point.distance(Vec2::new(-40.0, 105.0)) < 1e-6);
        assert_eq!(remote.stats().applied, 2);
    }

    #[test]
    fn test_stale_and_unsynced_messages_ignored() {
        let mut remote = RemotePuppet::new(local());
        let mut encoder = DiffEncoder::new(30, 1e-3);
        let keyframe = update(5, &mut encoder, Vec2::ZERO);
        let diff = update(6, &mut encoder, Vec2::new(3.0, 0.0));

        // A diff without a prior keyframe has nothing to merge into
        assert!(!remote.receive(diff.clone()));
        assert_eq!(remote.stats().unsynced, 1);

        assert!(!remote.receive(keyframe));
        assert_eq!(remote.stats().stale, 1);
        assert_eq!(remote.last_sequence(), Some(6));
    }

    #[test]
    fn test_frozen_and_goodbye() {
        let mut remote = RemotePuppet::new(local());
        let mut encoder = DiffEncoder::new(30, 1e-3);
        remote.receive(update(1, &mut encoder, Vec2::ZERO));
        let before = remote.frame().to_vec();

        remote.receive(PeerMessage::new(2, Payload::Frozen { reason: "no pose detected".into() }));
        assert_eq!(remote.peer_frozen(), Some("no pose detected"));
        assert_eq!(remote.frame(), before.as_slice());

        remote.receive(update(3, &mut encoder, Vec2::new(1.0, 0.0)));
        assert_eq!(remote.peer_frozen(), None);

        remote.receive(PeerMessage::new(4, Payload::Goodbye));
        assert!(remote.departed());
    }

    #[test]
    fn test_ingest_split_frames_and_garbage() {
        let mut remote = RemotePuppet::new(local());
        let mut encoder = DiffEncoder::new(30, 1e-3);
        let mut bytes = encode_frame(&update(1, &mut encoder, Vec2::ZERO)).unwrap().to_vec();
        bytes.extend_from_slice(&encode_frame(&update(2, &mut encoder, Vec2::new(7.0, 0.0))).unwrap());

        let (head, tail) = bytes.split_at(9);
        assert_eq!(remote.ingest(head), 0);
        assert_eq!(remote.ingest(tail), 2);

        assert_eq!(remote.ingest(&[0xff; 8]), 0);
        assert_eq!(remote.stats().rejected, 1);
    }
}
