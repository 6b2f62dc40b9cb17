pub mod controller;
pub mod loop_worker;
pub mod replay;
pub mod snapshot;
pub mod source;

pub use controller::{CaptureController, SendOutcome};
pub use loop_worker::{capture_loop, fps_from_latency, LoopContext, LoopOptions, LoopStats};
pub use replay::{LogRenderSink, DEFAULT_REPLAY_FPS, PassthroughEstimator, ReplayFrame, ReplaySource};
pub use snapshot::{CaptureSnapshot, CaptureStatus};
pub use source::{EstimationConfig, EstimationFailure, FrameSource, PoseEstimator, RenderSink};
