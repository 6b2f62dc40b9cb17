use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::pose::{Keypoint, PoseHypothesis};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum BufferStatus {
    Idle,
    Warmup,
    Collecting,
    Ready,
}

impl Default for BufferStatus {
    fn default() -> Self {
        BufferStatus::Idle
    }
}

impl BufferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BufferStatus::Idle => "Idle",
            BufferStatus::Warmup => "Warmup",
            BufferStatus::Collecting => "Collecting",
            BufferStatus::Ready => "Ready",
        }
    }
}

/// Which keypoint set of a hypothesis goes into the training sample.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SampleSource {
    /// 3D world keypoints, falling back to the 2D set when the model has none.
    World3d,
    Image2d,
}

impl Default for SampleSource {
    fn default() -> Self {
        SampleSource::World3d
    }
}

impl SampleSource {
    pub fn select<'a>(&self, pose: &'a PoseHypothesis) -> &'a [Keypoint] {
        match (self, pose.keypoints_3d.as_deref()) {
            (SampleSource::World3d, Some(world)) => world,
            _ => &pose.keypoints,
        }
    }
}

/// A full, labeled window of frames taken out of the buffer for submission.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    pub label: String,
    pub frames: Vec<Vec<Keypoint>>,
    pub capacity: usize,
    pub completed_at: DateTime<Utc>,
}

impl Sample {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_source_prefers_3d_keypoints() {
        let pose = PoseHypothesis::new(vec![Keypoint::new("nose", 1.0, 2.0, Some(0.9))])
            .with_world_keypoints(vec![Keypoint::new("nose", 0.1, 0.2, Some(0.9)).with_z(0.3)]);
        assert_eq!(SampleSource::World3d.select(&pose)[0].z, Some(0.3));
        assert_eq!(SampleSource::Image2d.select(&pose)[0].x, 1.0);
    }

    #[test]
    fn test_world_source_falls_back_to_2d() {
        let pose = PoseHypothesis::new(vec![Keypoint::new("nose", 1.0, 2.0, None)]);
        assert_eq!(SampleSource::World3d.select(&pose)[0].x, 1.0);
    }

    #[test]
    fn test_status_serializes_camel_case() {
        assert_eq!(serde_json::to_string(&BufferStatus::Collecting).unwrap(), "\"collecting\"");
        assert_eq!(BufferStatus::Collecting.as_str(), "Collecting");
    }
}
