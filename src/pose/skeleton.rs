use serde::{Deserialize, Serialize};

/// Pose models whose keypoint layout the pipeline knows how to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SkeletonModel {
    BlazePose,
    MoveNet,
}

impl Default for SkeletonModel {
    fn default() -> Self {
        SkeletonModel::BlazePose
    }
}

impl SkeletonModel {
    pub fn keypoint_names(&self) -> &'static [&'static str] {
        match self {
            SkeletonModel::BlazePose => &BLAZEPOSE_KEYPOINTS,
            SkeletonModel::MoveNet => &COCO_KEYPOINTS,
        }
    }

    /// Skeletal links as (from, to) keypoint indices.
    pub fn adjacent_pairs(&self) -> &'static [(usize, usize)] {
        match self {
            SkeletonModel::BlazePose => &BLAZEPOSE_CONNECTIONS,
            SkeletonModel::MoveNet => &COCO_CONNECTIONS,
        }
    }

    pub fn keypoint_count(&self) -> usize {
        self.keypoint_names().len()
    }
}

pub const BLAZEPOSE_KEYPOINTS: [&str; 33] = [
    "nose",
    "left_eye_inner",
    "left_eye",
    "left_eye_outer",
    "right_eye_inner",
    "right_eye",
    "right_eye_outer",
    "left_ear",
    "right_ear",
    "mouth_left",
    "mouth_right",
    "left_shoulder",
    "right_shoulder",
    "left_elbow",
    "right_elbow",
    "left_wrist",
    "right_wrist",
    "left_pinky",
    "right_pinky",
    "left_index",
    "right_index",
    "left_thumb",
    "right_thumb",
    "left_hip",
    "right_hip",
    "left_knee",
    "right_knee",
    "left_ankle",
    "right_ankle",
    "left_heel",
    "right_heel",
    "left_foot_index",
    "right_foot_index",
];

pub const BLAZEPOSE_CONNECTIONS: [(usize, usize); 35] = [
    // face
    (0, 1),
    (0, 4),
    (1, 2),
    (2, 3),
    (3, 7),
    (4, 5),
    (5, 6),
    (6, 8),
    (9, 10),
    // arms and hands
    (11, 12),
    (11, 13),
    (11, 23),
    (12, 14),
    (14, 16),
    (12, 24),
    (13, 15),
    (15, 17),
    (16, 18),
    (16, 20),
    (15, 19),
    (15, 21),
    (16, 22),
    (17, 19),
    (18, 20),
    // hips and legs
    (23, 25),
    (23, 24),
    (24, 26),
    (25, 27),
    (26, 28),
    (27, 29),
    (28, 30),
    (27, 31),
    (28, 32),
    (29, 31),
    (30, 32),
];

pub const COCO_KEYPOINTS: [&str; 17] = [
    "nose",
    "left_eye",
    "right_eye",
    "left_ear",
    "right_ear",
    "left_shoulder",
    "right_shoulder",
    "left_elbow",
    "right_elbow",
    "left_wrist",
    "right_wrist",
    "left_hip",
    "right_hip",
    "left_knee",
    "right_knee",
    "left_ankle",
    "right_ankle",
];

pub const COCO_CONNECTIONS: [(usize, usize); 16] = [
    (0, 1),
    (0, 2),
    (1, 3),
    (2, 4),
    (5, 6),
    (5, 7),
    (5, 11),
    (6, 8),
    (6, 12),
    (7, 9),
    (8, 10),
    (11, 12),
    (11, 13),
    (12, 14),
    (13, 15),
    (14, 16),
];
