//! Character and pose fixtures

use std::collections::HashMap;
use std::f64::consts::TAU;

use puppet_core::{PoseEstimate, Vec2};
use puppet_skeleton::upright_figure;
use puppet_skin::{skeleton_group, AssetItem, PathData, PathSegment, PathStyle, VectorAsset};

pub use puppet_skeleton::{face_from, pose_from};

/// Width of the simulated camera image
pub const CAMERA_WIDTH: u32 = 640;
pub const CAMERA_HEIGHT: u32 = 480;

/// Rest positions of the reference figure
pub fn rest_positions() -> HashMap<String, Vec2> {
    upright_figure()
}

fn styled(name: &str, mut data: PathData, fill: Option<&str>) -> AssetItem {
    data.style = PathStyle {
        fill: fill.map(str::to_string),
        stroke: Some("#222222".to_string()),
        stroke_width: 2.0,
    };
    AssetItem::path(name, data)
}

/// Reference character: torso, sleeves, legs, a face outline and a hat
/// riding on a secondary bone
pub fn character_asset() -> VectorAsset {
    let rest = rest_positions();
    let at = |name: &str, dx: f64, dy: f64| rest[name] + Vec2::new(dx, dy);

    let torso = PathData {
        segments: vec![
            PathSegment::corner(at("leftShoulder", 0.0, 5.0)),
            PathSegment::smooth(
                at("rightShoulder", 0.0, 5.0),
                Vec2::new(-20.0, 0.0),
                Vec2::new(0.0, 20.0),
            ),
            PathSegment::corner(at("rightHip", 5.0, 0.0)),
            PathSegment::corner(at("leftHip", -5.0, 0.0)),
        ],
        closed: true,
        style: PathStyle::default(),
    };

    let illustration = vec![
        styled("torso", torso, Some("#3366cc")),
        styled(
            "leftSleeve",
            PathData::polyline([at("leftShoulder", -10.0, 10.0), at("leftElbow", -5.0, 5.0), at("leftWrist", 0.0, -5.0)], false),
            None,
        ),
        styled(
            "rightSleeve",
            PathData::polyline([at("rightShoulder", 10.0, 10.0), at("rightElbow", 5.0, 5.0), at("rightWrist", 0.0, -5.0)], false),
            None,
        ),
        styled(
            "legs",
            PathData::polyline([at("leftAnkle", 0.0, 0.0), at("leftHip", 0.0, 10.0), at("rightHip", 0.0, 10.0), at("rightAnkle", 0.0, 0.0)], false),
            None,
        ),
        styled(
            "jawline",
            PathData::polyline([at("leftJaw0", 0.0, 0.0), at("jawMid", 0.0, 2.0), at("rightJaw0", 0.0, 0.0)], false),
            None,
        ),
        AssetItem::group(
            "aux-hat",
            vec![
                AssetItem::path(
                    "bone:topMid-rightTop0",
                    PathData::polyline([at("topMid", 0.0, 0.0), at("rightTop0", 0.0, -30.0)], false),
                ),
                styled(
                    "crown",
                    PathData::polyline(
                        [at("topMid", -30.0, -10.0), at("topMid", 0.0, -45.0), at("topMid", 30.0, -10.0)],
                        true,
                    ),
                    Some("#aa3322"),
                ),
            ],
        ),
    ];

    VectorAsset::new(vec![
        skeleton_group(&rest),
        AssetItem::group("illustration", illustration),
    ])
}

/// Flip a pose the way a front camera `width` pixels wide reports it
pub fn as_camera_sees(mut pose: PoseEstimate, width: u32) -> PoseEstimate {
    pose.mirror(f64::from(width));
    pose
}

/// `frames` poses of the figure swaying side to side, as the camera sees
/// them. Every pose has the given score.
pub fn sway(frames: usize, amplitude: f64, score: f64) -> Vec<PoseEstimate> {
    let rest = rest_positions();
    (0..frames)
        .map(|i| {
            let phase = i as f64 / frames.max(1) as f64 * TAU;
            let offset = Vec2::new(phase.sin() * amplitude, (phase * 2.0).cos() * amplitude * 0.2);
            as_camera_sees(pose_from(&rest, offset, score), CAMERA_WIDTH)
        })
        .collect()
}
