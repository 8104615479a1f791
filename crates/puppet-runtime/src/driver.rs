//! Frame driver - one estimation → update → render cycle per frame
//!
//! The oracles are the only await points. Everything after them runs to
//! completion, and `run` never starts a cycle before the previous one has
//! been presented.

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use puppet_skeleton::InvalidReason;
use puppet_skin::{Illustration, RenderPath};
use puppet_wire::{DiffEncoder, Payload, PeerMessage};
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use crate::{DriverConfig, FaceOracle, PoseOracle, Session, VideoFrame};

/// Why a frame was not rendered
#[derive(Debug, Clone, PartialEq)]
pub enum FreezeReason {
    /// An estimator returned an error
    Oracle(String),
    /// The pose estimator found nobody
    NoPose,
    /// The skeleton rejected the estimates
    Invalid(InvalidReason),
}

impl fmt::Display for FreezeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FreezeReason::Oracle(e) => write!(f, "estimator error: {e}"),
            FreezeReason::NoPose => write!(f, "no pose detected"),
            FreezeReason::Invalid(reason) => write!(f, "invalid frame: {reason}"),
        }
    }
}

/// Result of one cycle
#[derive(Debug, PartialEq)]
pub enum FrameOutcome<'a> {
    /// The illustration was updated
    Rendered(&'a [RenderPath]),
    /// The last rendered frame stays on screen
    Frozen(FreezeReason),
}

impl FrameOutcome<'_> {
    pub fn is_rendered(&self) -> bool {
        matches!(self, FrameOutcome::Rendered(_))
    }
}

#[derive(Clone, Debug, Default)]
pub struct DriverStats {
    pub frames: u64,
    pub rendered: u64,
    pub frozen: u64,
    pub oracle_errors: u64,
    pub outgoing_queued: u64,
    pub outgoing_dropped: u64,
    pub outgoing_popped: u64,
    pub last_cycle: Duration,
}

/// Where `run` delivers its results
pub trait FrameSink {
    /// A newly rendered frame
    fn present(&mut self, frame: &VideoFrame, paths: &[RenderPath]);

    /// A frame that was not rendered
    fn frozen(&mut self, _frame: &VideoFrame, _reason: &FreezeReason) {}

    /// An outgoing peer message
    fn publish(&mut self, _message: PeerMessage) {}
}

/// A sink that keeps everything it is given
#[derive(Debug, Default)]
pub struct FrameRecorder {
    pub rendered: Vec<(u64, Vec<RenderPath>)>,
    pub frozen: Vec<(u64, FreezeReason)>,
    pub published: Vec<PeerMessage>,
}

impl FrameSink for FrameRecorder {
    fn present(&mut self, frame: &VideoFrame, paths: &[RenderPath]) {
        self.rendered.push((frame.index, paths.to_vec()));
    }

    fn frozen(&mut self, frame: &VideoFrame, reason: &FreezeReason) {
        self.frozen.push((frame.index, reason.clone()));
    }

    fn publish(&mut self, message: PeerMessage) {
        self.published.push(message);
    }
}

/// Drives one local illustration from the session's estimators
pub struct FrameDriver {
    illustration: Illustration,
    config: DriverConfig,
    encoder: DiffEncoder,
    outgoing: VecDeque<PeerMessage>,
    sequence: u64,
    frozen: bool,
    stats: DriverStats,
}

impl FrameDriver {
    pub fn new(illustration: Illustration, config: DriverConfig) -> Self {
        FrameDriver {
            encoder: DiffEncoder::new(config.keyframe_interval, config.diff_tolerance),
            illustration,
            config,
            outgoing: VecDeque::new(),
            sequence: 0,
            frozen: false,
            stats: DriverStats::default(),
        }
    }

    pub fn illustration(&self) -> &Illustration {
        &self.illustration
    }

    pub fn stats(&self) -> &DriverStats {
        &self.stats
    }

    /// Next outgoing peer message (if any)
    pub fn pop_outgoing(&mut self) -> Option<PeerMessage> {
        let message = self.outgoing.pop_front();
        if message.is_some() {
            self.stats.outgoing_popped += 1;
        }
        message
    }

    /// Execute one cycle
    pub async fn step<P: PoseOracle, F: FaceOracle>(
        &mut self,
        session: &mut Session<P, F>,
        frame: &VideoFrame,
    ) -> FrameOutcome<'_> {
        let start = Instant::now();
        self.stats.frames += 1;

        // Stage 1: Estimate pose
        let poses = match session.pose.estimate_poses(frame).await {
            Ok(poses) => poses,
            Err(e) => return self.oracle_failed(frame, e.to_string(), start),
        };

        // Stage 2: Estimate face
        let faces = match session.face.estimate_faces(frame).await {
            Ok(faces) => faces,
            Err(e) => return self.oracle_failed(frame, e.to_string(), start),
        };

        // Stage 3: Keep the top-ranked estimates
        let Some(mut pose) = poses.into_iter().next() else {
            return self.freeze(FreezeReason::NoPose, start);
        };
        let mut face = faces.into_iter().next();

        // Stage 4: Undo the camera mirror
        if self.config.mirror_input {
            let width = f64::from(frame.width);
            pose.mirror(width);
            if let Some(face) = face.as_mut() {
                face.mirror(width);
            }
        }

        // Stage 5: Update skeleton and skin
        if !self.illustration.update(&pose, face.as_ref()) {
            let reason = self
                .illustration
                .skeleton()
                .invalid_reason()
                .cloned()
                .unwrap_or(InvalidReason::NotUpdated);
            return self.freeze(FreezeReason::Invalid(reason), start);
        }

        // Stage 6: Publish the new skeleton state
        let snapshot = self.illustration.skeleton().snapshot();
        let diff = self
            .encoder
            .encode(&snapshot.parts, snapshot.body_scale, snapshot.face_scale);
        if diff.keyframe || !diff.is_empty() {
            self.enqueue(Payload::SkeletonUpdate(diff));
        }

        self.frozen = false;
        self.stats.rendered += 1;
        self.stats.last_cycle = start.elapsed();
        trace!(frame = frame.index, elapsed = ?self.stats.last_cycle, "frame rendered");
        FrameOutcome::Rendered(self.illustration.frame())
    }

    /// Run cycles on the frame interval until `source` runs dry or
    /// `shutdown` turns true. Peers get a goodbye at the end.
    pub async fn run<P, F, I, K>(
        &mut self,
        session: &mut Session<P, F>,
        source: I,
        sink: &mut K,
        mut shutdown: watch::Receiver<bool>,
    ) -> DriverStats
    where
        P: PoseOracle,
        F: FaceOracle,
        I: IntoIterator<Item = VideoFrame>,
        K: FrameSink,
    {
        let mut ticker = time::interval(self.config.frame_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut frames = source.into_iter();
        let mut watching = true;

        info!(interval = ?self.config.frame_interval(), "frame driver started");
        loop {
            if *shutdown.borrow() {
                info!("shutdown requested");
                break;
            }
            tokio::select! {
                biased;
                changed = shutdown.changed(), if watching => {
                    // A dropped sender can never ask for shutdown
                    if changed.is_err() {
                        watching = false;
                    }
                    continue;
                }
                _ = ticker.tick() => {}
            }

            let Some(frame) = frames.next() else {
                debug!("frame source exhausted");
                break;
            };
            match self.step(session, &frame).await {
                FrameOutcome::Rendered(paths) => sink.present(&frame, paths),
                FrameOutcome::Frozen(reason) => sink.frozen(&frame, &reason),
            }
            while let Some(message) = self.pop_outgoing() {
                sink.publish(message);
            }
        }

        self.enqueue(Payload::Goodbye);
        while let Some(message) = self.pop_outgoing() {
            sink.publish(message);
        }
        info!(
            frames = self.stats.frames,
            rendered = self.stats.rendered,
            frozen = self.stats.frozen,
            "frame driver stopped"
        );
        self.stats.clone()
    }

    fn oracle_failed(&mut self, frame: &VideoFrame, error: String, start: Instant) -> FrameOutcome<'static> {
        warn!(frame = frame.index, %error, "estimator failed");
        self.stats.oracle_errors += 1;
        self.freeze(FreezeReason::Oracle(error), start)
    }

    fn freeze(&mut self, reason: FreezeReason, start: Instant) -> FrameOutcome<'static> {
        debug!(%reason, "frame frozen");
        self.stats.frozen += 1;
        self.stats.last_cycle = start.elapsed();
        // Peers hear about the first frozen frame of a run only
        if !self.frozen {
            self.frozen = true;
            self.enqueue(Payload::Frozen {
                reason: reason.to_string(),
            });
        }
        FrameOutcome::Frozen(reason)
    }

    fn enqueue(&mut self, payload: Payload) {
        if self.outgoing.len() >= self.config.max_outgoing {
            self.stats.outgoing_dropped += 1;
            // Receivers lost a diff; resynchronise them with a keyframe
            self.encoder.force_keyframe();
            return;
        }
        self.sequence += 1;
        self.outgoing.push_back(PeerMessage::new(self.sequence, payload));
        self.stats.outgoing_queued += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RuntimeConfig, SyntheticFaceOracle, SyntheticPoseOracle};
    use puppet_core::{PoseEstimate, Vec2};
    use puppet_skeleton::{face_from, pose_from, upright_figure};
    use puppet_skin::{skeleton_group, AssetItem, PathData, VectorAsset};

    fn asset() -> VectorAsset {
        VectorAsset::new(vec![
            skeleton_group(&upright_figure()),
            AssetItem::group(
                "illustration",
                vec![AssetItem::path(
                    "leftSleeve",
                    PathData::polyline([Vec2::new(-100.0, -70.0), Vec2::new(-150.0, 10.0)], false),
                )],
            ),
        ])
    }

    /// Poses as a mirrored camera would report them
    fn camera_pose(offset: Vec2, score: f64) -> PoseEstimate {
        let mut pose = pose_from(&upright_figure(), offset, score);
        pose.mirror(640.0);
        pose
    }

    fn session(poses: Vec<PoseEstimate>) -> Session<SyntheticPoseOracle, SyntheticFaceOracle> {
        let mut config = RuntimeConfig::default();
        config.driver.frame_interval_ms = 1;
        Session::new(
            SyntheticPoseOracle::new(poses, 0.0, 1),
            SyntheticFaceOracle::absent(),
            config,
        )
    }

    fn driver(session: &Session<SyntheticPoseOracle, SyntheticFaceOracle>) -> FrameDriver {
        let illustration = session.bind(&asset()).unwrap();
        FrameDriver::new(illustration, session.config.driver.clone())
    }

    #[tokio::test]
    async fn test_step_renders_and_publishes() {
        let mut session = session(vec![camera_pose(Vec2::new(5.0, 0.0), 0.9)]);
        let mut driver = driver(&session);

        let outcome = driver.step(&mut session, &VideoFrame::new(0, 640, 480)).await;
        let FrameOutcome::Rendered(paths) = outcome else {
            panic!("expected a rendered frame");
        };
        let expected = Vec2::new(-100.0, -70.0) + Vec2::new(5.0, 0.0);
        assert!(paths[0].segments[0].point.distance(expected) < 1e-6);

        let message = driver.pop_outgoing().unwrap();
        assert_eq!(message.sequence, 1);
        assert!(message.is_keyframe());
        assert!(driver.pop_outgoing().is_none());
        assert_eq!(driver.stats().rendered, 1);
    }

    #[tokio::test]
    async fn test_low_confidence_freezes_last_frame() {
        let mut session = session(vec![
            camera_pose(Vec2::new(5.0, 0.0), 0.9),
            camera_pose(Vec2::new(90.0, 0.0), 0.05),
        ]);
        let mut driver = driver(&session);

        assert!(driver.step(&mut session, &VideoFrame::new(0, 640, 480)).await.is_rendered());
        let before = driver.illustration().frame().to_vec();

        let outcome = driver.step(&mut session, &VideoFrame::new(1, 640, 480)).await;
        assert!(matches!(
            outcome,
            FrameOutcome::Frozen(FreezeReason::Invalid(InvalidReason::LowPoseConfidence(_)))
        ));
        assert_eq!(driver.illustration().frame(), before.as_slice());
        assert_eq!(driver.stats().frozen, 1);
    }

    #[tokio::test]
    async fn test_oracle_error_is_frozen_frame() {
        let mut session = Session::new(
            SyntheticPoseOracle::new(vec![camera_pose(Vec2::ZERO, 0.9)], 0.0, 1).fail_on(0),
            SyntheticFaceOracle::absent(),
            RuntimeConfig::default(),
        );
        let mut driver = driver(&session);

        let outcome = driver.step(&mut session, &VideoFrame::new(0, 640, 480)).await;
        assert!(matches!(outcome, FrameOutcome::Frozen(FreezeReason::Oracle(_))));
        assert_eq!(driver.stats().oracle_errors, 1);
        let message = driver.pop_outgoing().unwrap();
        assert!(matches!(message.payload, Payload::Frozen { .. }));
    }

    #[tokio::test]
    async fn test_no_pose() {
        let mut session = session(Vec::new());
        let mut driver = driver(&session);
        let outcome = driver.step(&mut session, &VideoFrame::new(0, 640, 480)).await;
        assert_eq!(outcome, FrameOutcome::Frozen(FreezeReason::NoPose));
    }

    #[tokio::test]
    async fn test_confident_face_is_used() {
        let rest = upright_figure();
        let mut face = face_from(&rest, Vec2::new(0.0, 3.0), 0.95);
        face.mirror(640.0);
        let mut session = Session::new(
            SyntheticPoseOracle::new(vec![camera_pose(Vec2::ZERO, 0.9)], 0.0, 1),
            SyntheticFaceOracle::new(vec![face], 0.0, 1),
            RuntimeConfig::default(),
        );
        let mut driver = driver(&session);
        assert!(driver.step(&mut session, &VideoFrame::new(0, 640, 480)).await.is_rendered());

        let jaw = driver.illustration().skeleton().part("jawMid").unwrap();
        assert!(jaw.position.distance(rest["jawMid"] + Vec2::new(0.0, 3.0)) < 1e-6);
        assert_eq!(jaw.confidence, 0.95);
    }

    #[tokio::test]
    async fn test_outgoing_queue_is_bounded() {
        let mut session = session(vec![camera_pose(Vec2::ZERO, 0.9), camera_pose(Vec2::new(9.0, 0.0), 0.9)]);
        let illustration = session.bind(&asset()).unwrap();
        let config = DriverConfig {
            max_outgoing: 2,
            ..Default::default()
        };
        let mut driver = FrameDriver::new(illustration, config);
        for index in 0..4 {
            driver.step(&mut session, &VideoFrame::new(index, 640, 480)).await;
        }
        assert_eq!(driver.stats().outgoing_queued, 2);
        assert_eq!(driver.stats().outgoing_dropped, 2);
    }

    #[tokio::test]
    async fn test_run_until_source_exhausted() {
        let mut session = session(vec![camera_pose(Vec2::ZERO, 0.9), camera_pose(Vec2::new(4.0, 0.0), 0.9)]);
        let mut driver = driver(&session);
        let (_tx, rx) = watch::channel(false);
        let mut sink = FrameRecorder::default();

        let frames = (0..5).map(|i| VideoFrame::new(i, 640, 480));
        let stats = driver.run(&mut session, frames, &mut sink, rx).await;

        assert_eq!(stats.frames, 5);
        assert_eq!(sink.rendered.len(), 5);
        assert_eq!(sink.published.first().map(|m| m.sequence), Some(1));
        assert!(matches!(sink.published.last().map(|m| &m.payload), Some(Payload::Goodbye)));
        let sequences: Vec<u64> = sink.published.iter().map(|m| m.sequence).collect();
        assert!(sequences.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let mut session = session(vec![camera_pose(Vec2::ZERO, 0.9)]);
        let mut driver = driver(&session);
        let (tx, rx) = watch::channel(false);
        let mut sink = FrameRecorder::default();
        tx.send(true).unwrap();

        let stats = driver.run(&mut session, (0..).map(|i| VideoFrame::new(i, 640, 480)), &mut sink, rx).await;
        assert_eq!(stats.frames, 0);
        assert_eq!(sink.published.len(), 1);
    }
}
