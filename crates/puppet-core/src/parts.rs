//! Keypoint name tables
//!
//! Body part names follow the pose estimator's 17-keypoint output. Face part
//! names are the rig's own landmark names, each mapped to a vertex of the
//! 468-vertex face mesh returned by the face estimator.

pub const NOSE: &str = "nose";
pub const LEFT_EYE: &str = "leftEye";
pub const RIGHT_EYE: &str = "rightEye";
pub const LEFT_EAR: &str = "leftEar";
pub const RIGHT_EAR: &str = "rightEar";
pub const LEFT_SHOULDER: &str = "leftShoulder";
pub const RIGHT_SHOULDER: &str = "rightShoulder";
pub const LEFT_ELBOW: &str = "leftElbow";
pub const RIGHT_ELBOW: &str = "rightElbow";
pub const LEFT_WRIST: &str = "leftWrist";
pub const RIGHT_WRIST: &str = "rightWrist";
pub const LEFT_HIP: &str = "leftHip";
pub const RIGHT_HIP: &str = "rightHip";
pub const LEFT_KNEE: &str = "leftKnee";
pub const RIGHT_KNEE: &str = "rightKnee";
pub const LEFT_ANKLE: &str = "leftAnkle";
pub const RIGHT_ANKLE: &str = "rightAnkle";

/// All pose keypoint names, in estimator order
pub const BODY_PARTS: [&str; 17] = [
    NOSE,
    LEFT_EYE,
    RIGHT_EYE,
    LEFT_EAR,
    RIGHT_EAR,
    LEFT_SHOULDER,
    RIGHT_SHOULDER,
    LEFT_ELBOW,
    RIGHT_ELBOW,
    LEFT_WRIST,
    RIGHT_WRIST,
    LEFT_HIP,
    RIGHT_HIP,
    LEFT_KNEE,
    RIGHT_KNEE,
    LEFT_ANKLE,
    RIGHT_ANKLE,
];

/// Leg keypoints the skeleton places itself instead of tracking:
/// `(part, hip it hangs from, which of the two vertical offsets)`
pub const SYNTHESIZED_LEG_PARTS: [(&str, &str, LegJoint); 4] = [
    (LEFT_KNEE, LEFT_HIP, LegJoint::Knee),
    (RIGHT_KNEE, RIGHT_HIP, LegJoint::Knee),
    (LEFT_ANKLE, LEFT_HIP, LegJoint::Ankle),
    (RIGHT_ANKLE, RIGHT_HIP, LegJoint::Ankle),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegJoint {
    Knee,
    Ankle,
}

/// True for pose keypoints fused from estimator output every frame
pub fn is_tracked_body_part(name: &str) -> bool {
    BODY_PARTS.contains(&name) && !SYNTHESIZED_LEG_PARTS.iter().any(|(p, _, _)| *p == name)
}

/// Number of vertices in the face estimator's mesh
pub const FACE_MESH_SIZE: usize = 468;

/// Jaw corner landmarks next to the ears; reference pair for face inference
pub const LEFT_JAW_CORNER: &str = "leftJaw0";
pub const RIGHT_JAW_CORNER: &str = "rightJaw0";

/// Face landmark at the tip of the nose
pub const NOSE_TIP: &str = "nose4";

/// Face landmark name → face mesh vertex index
pub const FACE_PARTS: [(&str, usize); 71] = [
    // Outline, top of the forehead then down the right side
    ("topMid", 10),
    ("rightTop0", 67),
    ("rightTop1", 54),
    ("rightJaw0", 21),
    ("rightJaw1", 162),
    ("rightJaw2", 127),
    ("rightJaw3", 234),
    ("rightJaw4", 132),
    ("rightJaw5", 58),
    ("rightJaw6", 172),
    ("rightJaw7", 150),
    ("jawMid", 152),
    // Left side back up
    ("leftJaw7", 379),
    ("leftJaw6", 397),
    ("leftJaw5", 288),
    ("leftJaw4", 361),
    ("leftJaw3", 454),
    ("leftJaw2", 356),
    ("leftJaw1", 389),
    ("leftJaw0", 251),
    ("leftTop1", 284),
    ("leftTop0", 297),
    // Brows
    ("rightBrow0", 46),
    ("rightBrow1", 53),
    ("rightBrow2", 52),
    ("rightBrow3", 65),
    ("rightBrow4", 55),
    ("leftBrow0", 276),
    ("leftBrow1", 283),
    ("leftBrow2", 282),
    ("leftBrow3", 295),
    ("leftBrow4", 285),
    // Nose bridge to tip, then the nostril line
    ("nose0", 168),
    ("nose1", 6),
    ("nose2", 197),
    ("nose3", 195),
    ("nose4", 1),
    ("rightNose0", 98),
    ("rightNose1", 97),
    ("nose5", 2),
    ("leftNose1", 326),
    ("leftNose0", 327),
    // Eyes
    ("rightEye0", 33),
    ("rightEye1", 160),
    ("rightEye2", 158),
    ("rightEye3", 133),
    ("rightEye4", 153),
    ("rightEye5", 144),
    ("leftEye0", 263),
    ("leftEye1", 387),
    ("leftEye2", 385),
    ("leftEye3", 362),
    ("leftEye4", 380),
    ("leftEye5", 373),
    // Outer lips
    ("rightMouthCorner", 61),
    ("rightUpperLipTop0", 40),
    ("upperLipTopMid", 0),
    ("leftUpperLipTop0", 270),
    ("leftMouthCorner", 291),
    ("leftLowerLipBottom0", 321),
    ("lowerLipBottomMid", 17),
    ("rightLowerLipBottom0", 91),
    // Inner lips
    ("rightUpperLipBottom0", 81),
    ("upperLipBottomMid", 13),
    ("leftUpperLipBottom0", 311),
    ("leftLowerLipTop0", 402),
    ("lowerLipTopMid", 14),
    ("rightLowerLipTop0", 178),
    // Cheeks
    ("rightCheek", 205),
    ("leftCheek", 425),
    ("chin", 199),
];

/// Face mesh vertex index for a face landmark name
pub fn face_mesh_index(name: &str) -> Option<usize> {
    FACE_PARTS
        .iter()
        .find(|(part, _)| *part == name)
        .map(|(_, index)| *index)
}

/// Iterate face landmark names in table order
pub fn face_part_names() -> impl Iterator<Item = &'static str> {
    FACE_PARTS.iter().map(|(name, _)| *name)
}
