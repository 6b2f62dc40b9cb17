use std::fmt;
use std::future::Future;

use crate::pipeline::PoseOverlay;
use crate::pose::PoseHypothesis;

/// Options forwarded to the estimator with every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EstimationConfig {
    pub flip_horizontal: bool,
}

impl Default for EstimationConfig {
    fn default() -> Self {
        Self { flip_horizontal: true }
    }
}

/// The estimator rejected or failed on a frame. Never fatal to the loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EstimationFailure {
    pub message: String,
}

impl EstimationFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for EstimationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pose estimation failed: {}", self.message)
    }
}

impl std::error::Error for EstimationFailure {}

/// Pull-based camera feed. Every frame handed out must come back through
/// [`FrameSource::release`].
pub trait FrameSource: Send + 'static {
    type Frame: Send + Sync + 'static;

    /// Next frame, or `None` once the feed has ended.
    fn next_frame(&mut self) -> impl Future<Output = Option<Self::Frame>> + Send;

    fn release(&mut self, frame: Self::Frame);
}

pub trait PoseEstimator<F>: Send + 'static {
    fn estimate(
        &mut self,
        frame: &F,
        config: &EstimationConfig,
    ) -> impl Future<Output = Result<Vec<PoseHypothesis>, EstimationFailure>> + Send;
}

/// Where the per-frame skeleton overlay goes.
pub trait RenderSink: Send + 'static {
    fn render(&mut self, overlay: &PoseOverlay);
}
