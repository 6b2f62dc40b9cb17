//! Recorded pose streams as a stand-in for the camera + estimator pair.
//!
//! A recording is JSON lines, one frame per line, each line an array of pose
//! hypotheses in the estimator's output shape:
//! ```text
//! [{"keypoints": [{"name": "nose", "x": 91.2, "y": 40.5, "score": 0.98}, ...], "keypoints3D": [...]}]
//! ```
//! Blank lines are skipped; `[]` is a frame where nobody was detected.

use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tokio::time::{Duration, Interval, MissedTickBehavior};

use super::source::{EstimationConfig, EstimationFailure, FrameSource, PoseEstimator, RenderSink};
use crate::pipeline::PoseOverlay;
use crate::pose::{PoseHypothesis, SkeletonModel};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

#[derive(Debug, Clone)]
pub struct ReplayFrame {
    pub index: usize,
    pub poses: Vec<PoseHypothesis>,
}

/// Camera rate recordings are assumed to have been captured at.
pub const DEFAULT_REPLAY_FPS: u32 = 30;

/// Hands recorded frames out at the rate they were captured, so the settle
/// delay and sample window cover the same stretch of footage as live.
pub struct ReplaySource {
    frames: VecDeque<ReplayFrame>,
    released: usize,
    frame_interval: Option<Duration>,
    pacer: Option<Interval>,
}

impl ReplaySource {
    pub fn new(frames: Vec<Vec<PoseHypothesis>>) -> Self {
        Self {
            frames: frames
                .into_iter()
                .enumerate()
                .map(|(index, poses)| ReplayFrame { index, poses })
                .collect(),
            released: 0,
            frame_interval: frame_interval_for(DEFAULT_REPLAY_FPS),
            pacer: None,
        }
    }

    /// Replay at `fps` frames per second; 0 hands frames out as fast as the
    /// loop asks for them.
    pub fn with_frame_rate(mut self, fps: u32) -> Self {
        self.frame_interval = frame_interval_for(fps);
        self.pacer = None;
        self
    }

    pub fn frame_interval(&self) -> Option<Duration> {
        self.frame_interval
    }

    pub fn load<P: AsRef<Path>>(path: P, skeleton: SkeletonModel) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read recording {}", path.display()))?;
        let frames = parse_recording(&contents, skeleton)
            .with_context(|| format!("Failed to parse recording {}", path.display()))?;
        log_info!("loaded {} recorded frames from {}", frames.len(), path.display());
        Ok(Self::new(frames))
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }

    pub fn released(&self) -> usize {
        self.released
    }
}

fn frame_interval_for(fps: u32) -> Option<Duration> {
    (fps > 0).then(|| Duration::from_secs_f64(1.0 / fps as f64))
}

/// Parse JSON lines into frames, filling unnamed keypoints from the
/// skeleton's name table.
pub fn parse_recording(contents: &str, skeleton: SkeletonModel) -> Result<Vec<Vec<PoseHypothesis>>> {
    let names = skeleton.keypoint_names();
    let mut frames = Vec::new();

    for (line_no, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut poses: Vec<PoseHypothesis> = serde_json::from_str(line)
            .with_context(|| format!("line {}: not a list of pose hypotheses", line_no + 1))?;

        for pose in &mut poses {
            let sets = std::iter::once(&mut pose.keypoints).chain(pose.keypoints_3d.as_mut());
            for set in sets {
                for (i, kp) in set.iter_mut().enumerate() {
                    if kp.name.is_empty() {
                        if let Some(name) = names.get(i) {
                            kp.name = (*name).to_string();
                        }
                    }
                }
            }
        }
        frames.push(poses);
    }

    Ok(frames)
}

impl FrameSource for ReplaySource {
    type Frame = ReplayFrame;

    async fn next_frame(&mut self) -> Option<ReplayFrame> {
        if self.frames.is_empty() {
            return None;
        }
        if let Some(period) = self.frame_interval {
            let pacer = self.pacer.get_or_insert_with(|| {
                let mut ticker = tokio::time::interval(period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                ticker
            });
            pacer.tick().await;
        }
        self.frames.pop_front()
    }

    fn release(&mut self, frame: ReplayFrame) {
        self.released += 1;
        log_debug!("released frame {}", frame.index);
    }
}

/// Hands the recorded hypotheses back unchanged; recordings are already
/// oriented the way they were captured, so `flip_horizontal` is ignored.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughEstimator;

impl PoseEstimator<ReplayFrame> for PassthroughEstimator {
    async fn estimate(
        &mut self,
        frame: &ReplayFrame,
        _config: &EstimationConfig,
    ) -> Result<Vec<PoseHypothesis>, EstimationFailure> {
        Ok(frame.poses.clone())
    }
}

/// Render sink for headless runs: logs the overlay size at debug level.
#[derive(Debug, Default)]
pub struct LogRenderSink {
    pub frames_rendered: u64,
}

impl RenderSink for LogRenderSink {
    fn render(&mut self, overlay: &PoseOverlay) {
        self.frames_rendered += 1;
        log_debug!(
            "frame {}: drawing {} keypoints, {} links",
            self.frames_rendered,
            overlay.points.len(),
            overlay.links.len()
        );
    }
}
