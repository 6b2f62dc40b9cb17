use serde::{Deserialize, Serialize};

/// A named body landmark produced by the pose estimator.
///
/// `x`/`y` are in output tensor pixels for 2D keypoints and metres for the
/// 3D (world) keypoints. `score` is absent for some models; it is then
/// treated as 0 by every consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    #[serde(default)]
    pub name: String,
    pub x: f32,
    pub y: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl Keypoint {
    pub fn new(name: impl Into<String>, x: f32, y: f32, score: Option<f32>) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            z: None,
            score,
        }
    }

    pub fn with_z(mut self, z: f32) -> Self {
        self.z = Some(z);
        self
    }

    /// Confidence with a missing score mapped to 0.
    pub fn confidence(&self) -> f32 {
        self.score.unwrap_or(0.0)
    }

    /// Strictly above the threshold, as the overlay has always drawn it.
    pub fn passes(&self, min_score: f32) -> bool {
        self.confidence() > min_score
    }
}

/// One candidate body detected in a frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoseHypothesis {
    pub keypoints: Vec<Keypoint>,
    #[serde(default, rename = "keypoints3D", skip_serializing_if = "Option::is_none")]
    pub keypoints_3d: Option<Vec<Keypoint>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl PoseHypothesis {
    pub fn new(keypoints: Vec<Keypoint>) -> Self {
        Self {
            keypoints,
            keypoints_3d: None,
            score: None,
        }
    }

    pub fn with_world_keypoints(mut self, keypoints_3d: Vec<Keypoint>) -> Self {
        self.keypoints_3d = Some(keypoints_3d);
        self
    }

    /// Mean keypoint confidence, 0 for an empty hypothesis.
    pub fn average_confidence(&self) -> f32 {
        if self.keypoints.is_empty() {
            return 0.0;
        }
        let sum: f32 = self.keypoints.iter().map(Keypoint::confidence).sum();
        sum / self.keypoints.len() as f32
    }
}
