//! Rig tables - which keypoints are joined by bones
//!
//! Body bones are listed per anatomical group. Face bones are listed as
//! landmark chains; closed chains (outline, eyes, lips) also join their last
//! landmark back to the first.

use std::fmt;

use puppet_core::{
    LEFT_ANKLE, LEFT_ELBOW, LEFT_HIP, LEFT_KNEE, LEFT_SHOULDER, LEFT_WRIST, RIGHT_ANKLE,
    RIGHT_ELBOW, RIGHT_HIP, RIGHT_KNEE, RIGHT_SHOULDER, RIGHT_WRIST,
};
use serde::{Deserialize, Serialize};

/// Anatomical region used for nearest-group lookup at bind time
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BoneGroup {
    Torso,
    LeftArm,
    RightArm,
    LeftLeg,
    RightLeg,
    Face,
}

impl BoneGroup {
    pub fn all() -> &'static [BoneGroup] {
        &[
            BoneGroup::Torso,
            BoneGroup::LeftArm,
            BoneGroup::RightArm,
            BoneGroup::LeftLeg,
            BoneGroup::RightLeg,
            BoneGroup::Face,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            BoneGroup::Torso => "torso",
            BoneGroup::LeftArm => "leftArm",
            BoneGroup::RightArm => "rightArm",
            BoneGroup::LeftLeg => "leftLeg",
            BoneGroup::RightLeg => "rightLeg",
            BoneGroup::Face => "face",
        }
    }
}

impl fmt::Display for BoneGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Body bones: `(kp0, kp1, group)`
pub const BODY_BONES: [(&str, &str, BoneGroup); 12] = [
    (LEFT_SHOULDER, RIGHT_SHOULDER, BoneGroup::Torso),
    (LEFT_SHOULDER, LEFT_HIP, BoneGroup::Torso),
    (RIGHT_SHOULDER, RIGHT_HIP, BoneGroup::Torso),
    (LEFT_HIP, RIGHT_HIP, BoneGroup::Torso),
    (LEFT_SHOULDER, LEFT_ELBOW, BoneGroup::LeftArm),
    (LEFT_ELBOW, LEFT_WRIST, BoneGroup::LeftArm),
    (RIGHT_SHOULDER, RIGHT_ELBOW, BoneGroup::RightArm),
    (RIGHT_ELBOW, RIGHT_WRIST, BoneGroup::RightArm),
    (LEFT_HIP, LEFT_KNEE, BoneGroup::LeftLeg),
    (LEFT_KNEE, LEFT_ANKLE, BoneGroup::LeftLeg),
    (RIGHT_HIP, RIGHT_KNEE, BoneGroup::RightLeg),
    (RIGHT_KNEE, RIGHT_ANKLE, BoneGroup::RightLeg),
];

struct FaceChain {
    parts: &'static [&'static str],
    closed: bool,
}

const FACE_CHAINS: &[FaceChain] = &[
    FaceChain {
        parts: &[
            "topMid", "rightTop0", "rightTop1", "rightJaw0", "rightJaw1", "rightJaw2",
            "rightJaw3", "rightJaw4", "rightJaw5", "rightJaw6", "rightJaw7", "jawMid",
            "leftJaw7", "leftJaw6", "leftJaw5", "leftJaw4", "leftJaw3", "leftJaw2", "leftJaw1",
            "leftJaw0", "leftTop1", "leftTop0",
        ],
        closed: true,
    },
    FaceChain {
        parts: &["rightBrow0", "rightBrow1", "rightBrow2", "rightBrow3", "rightBrow4"],
        closed: false,
    },
    FaceChain {
        parts: &["leftBrow0", "leftBrow1", "leftBrow2", "leftBrow3", "leftBrow4"],
        closed: false,
    },
    FaceChain {
        parts: &["nose0", "nose1", "nose2", "nose3", "nose4", "nose5"],
        closed: false,
    },
    FaceChain {
        parts: &["rightNose0", "rightNose1", "nose5", "leftNose1", "leftNose0"],
        closed: false,
    },
    FaceChain {
        parts: &["rightEye0", "rightEye1", "rightEye2", "rightEye3", "rightEye4", "rightEye5"],
        closed: true,
    },
    FaceChain {
        parts: &["leftEye0", "leftEye1", "leftEye2", "leftEye3", "leftEye4", "leftEye5"],
        closed: true,
    },
    FaceChain {
        parts: &[
            "rightMouthCorner", "rightUpperLipTop0", "upperLipTopMid", "leftUpperLipTop0",
            "leftMouthCorner", "leftLowerLipBottom0", "lowerLipBottomMid", "rightLowerLipBottom0",
        ],
        closed: true,
    },
    FaceChain {
        parts: &[
            "rightMouthCorner", "rightUpperLipBottom0", "upperLipBottomMid",
            "leftUpperLipBottom0", "leftMouthCorner", "leftLowerLipTop0", "lowerLipTopMid",
            "rightLowerLipTop0",
        ],
        closed: true,
    },
    FaceChain {
        parts: &["rightCheek", "rightMouthCorner"],
        closed: false,
    },
    FaceChain {
        parts: &["leftCheek", "leftMouthCorner"],
        closed: false,
    },
    FaceChain {
        parts: &["lowerLipBottomMid", "chin", "jawMid"],
        closed: false,
    },
];

/// Face bones as `(kp0, kp1)` pairs, chains expanded
pub fn face_bones() -> Vec<(&'static str, &'static str)> {
    let mut pairs = Vec::new();
    for chain in FACE_CHAINS {
        for window in chain.parts.windows(2) {
            pairs.push((window[0], window[1]));
        }
        if chain.closed && chain.parts.len() > 2 {
            pairs.push((chain.parts[chain.parts.len() - 1], chain.parts[0]));
        }
    }
    pairs
}

/// Conventional name of the bone joining two keypoints
pub fn bone_name(kp0: &str, kp1: &str) -> String {
    format!("{kp0}-{kp1}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use puppet_core::face_part_names;
    use std::collections::HashSet;

    #[test]
    fn test_face_bones_cover_every_landmark() {
        let covered: HashSet<&str> = face_bones()
            .into_iter()
            .flat_map(|(a, b)| [a, b])
            .collect();
        for name in face_part_names() {
            assert!(covered.contains(name), "{name} has no bone");
        }
    }

    #[test]
    fn test_face_bone_names_unique() {
        let names: HashSet<String> = face_bones()
            .into_iter()
            .map(|(a, b)| bone_name(a, b))
            .collect();
        assert_eq!(names.len(), face_bones().len());
    }

    #[test]
    fn test_closed_chain_wraps() {
        let bones = face_bones();
        assert!(bones.contains(&("rightEye5", "rightEye0")));
        assert!(!bones.contains(&("rightBrow4", "rightBrow0")));
    }
}
