use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tokio::time::{Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::snapshot::CaptureSnapshot;
use super::source::{EstimationConfig, FrameSource, PoseEstimator, RenderSink};
use crate::pipeline::{build_overlay, OrientationContext};
use crate::pose::{PoseHypothesis, SkeletonModel};
use crate::sample::{FrameOutcome, SampleBuffer};

// Set to false to silence per-frame logging from this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

/// Per-session knobs for the capture loop.
#[derive(Debug, Clone, Copy)]
pub struct LoopOptions {
    pub min_keypoint_score: f32,
    pub skeleton: SkeletonModel,
    pub estimation: EstimationConfig,
    /// Lower bound on tick spacing; `None` runs as fast as frames arrive.
    pub min_tick_interval: Option<Duration>,
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self {
            min_keypoint_score: 0.3,
            skeleton: SkeletonModel::default(),
            estimation: EstimationConfig::default(),
            min_tick_interval: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub frames_processed: u64,
    pub frames_released: u64,
    pub estimation_failures: u64,
    pub empty_frames: u64,
    pub samples_completed: u64,
}

/// Shared state the loop reads and writes on every tick.
pub struct LoopContext {
    pub buffer: Arc<Mutex<SampleBuffer>>,
    pub orientation: watch::Receiver<OrientationContext>,
    pub status: Arc<watch::Sender<CaptureSnapshot>>,
}

/// Drive frames through estimator, overlay and buffer until cancelled or the
/// source runs dry.
///
/// One tick at a time: the next frame is not requested before the previous
/// one has been estimated and released, so the buffer sees a strictly ordered
/// stream of frames.
pub async fn capture_loop<S, E, R>(
    mut source: S,
    mut estimator: E,
    mut render: R,
    ctx: LoopContext,
    options: LoopOptions,
    cancel_token: CancellationToken,
) -> LoopStats
where
    S: FrameSource,
    E: PoseEstimator<S::Frame>,
    R: RenderSink,
{
    let mut stats = LoopStats::default();
    let mut pacer = options.min_tick_interval.map(|period| {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    });

    log_info!("capture loop started");

    loop {
        if let Some(ticker) = pacer.as_mut() {
            tokio::select! {
                biased;
                _ = cancel_token.cancelled() => break,
                _ = ticker.tick() => {}
            }
        }

        let frame = tokio::select! {
            biased;
            _ = cancel_token.cancelled() => break,
            frame = source.next_frame() => frame,
        };
        let Some(frame) = frame else {
            log_info!("frame source ended");
            break;
        };

        let started = Instant::now();
        let estimated = tokio::select! {
            biased;
            _ = cancel_token.cancelled() => None,
            result = estimator.estimate(&frame, &options.estimation) => Some(result),
        };
        let latency = started.elapsed();

        source.release(frame);
        stats.frames_released += 1;

        let Some(result) = estimated else {
            break;
        };

        match result {
            Ok(hypotheses) => {
                stats.frames_processed += 1;
                if hypotheses.is_empty() {
                    stats.empty_frames += 1;
                }
                let outcome = process_frame(&hypotheses, &mut render, &ctx, &options, latency).await;
                if outcome == FrameOutcome::BecameReady {
                    stats.samples_completed += 1;
                }
            }
            Err(err) => {
                stats.estimation_failures += 1;
                log_warn!("skipping frame: {err}");
                let fps = fps_from_latency(latency);
                ctx.status.send_modify(|snap| snap.fps = fps);
            }
        }

        if pacer.is_none() {
            tokio::task::yield_now().await;
        }
    }

    ctx.status.send_modify(|snap| snap.running = false);
    log_info!(
        "capture loop shutting down ({} frames, {} estimation failures)",
        stats.frames_released,
        stats.estimation_failures
    );
    stats
}

async fn process_frame<R: RenderSink>(
    hypotheses: &[PoseHypothesis],
    render: &mut R,
    ctx: &LoopContext,
    options: &LoopOptions,
    latency: Duration,
) -> FrameOutcome {
    let orientation = *ctx.orientation.borrow();

    if let Some(pose) = hypotheses.first() {
        let overlay = build_overlay(
            pose,
            options.skeleton.adjacent_pairs(),
            options.min_keypoint_score,
            &orientation,
        );
        log_debug!(
            "overlay: {} points, {} links, mean confidence {:.2}",
            overlay.points.len(),
            overlay.links.len(),
            pose.average_confidence()
        );
        render.render(&overlay);
    }

    let (outcome, status, collected, capacity) = {
        let mut buffer = ctx.buffer.lock().await;
        let outcome = buffer.on_frame(hypotheses);
        (outcome, buffer.status(), buffer.len(), buffer.capacity())
    };

    let fps = fps_from_latency(latency);
    ctx.status.send_modify(|snap| {
        snap.apply_buffer(status, collected, capacity);
        snap.fps = fps;
    });

    outcome
}

/// Instantaneous frame rate from one estimate's latency, 0 when unmeasurable.
pub fn fps_from_latency(latency: Duration) -> u32 {
    let ms = latency.as_secs_f64() * 1000.0;
    if ms <= 0.0 {
        return 0;
    }
    (1000.0 / ms).floor().min(u32::MAX as f64) as u32
}
