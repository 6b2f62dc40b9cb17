use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;

use super::clock::Clock;
use super::state::{BufferStatus, Sample, SampleSource};
use crate::pose::{Keypoint, PoseHypothesis};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

pub const DEFAULT_CAPACITY: usize = 300;
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(5000);

/// What a single `on_frame` call did to the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// No hypothesis in the frame, or the sample is already full.
    Ignored,
    /// Still inside the settle delay.
    Warming,
    Appended { collected: usize },
    BecameReady,
}

/// Accumulates one labeled training sample, frame by frame.
///
/// Idle → Warmup (settle delay) → Collecting → Ready → Idle once the ready
/// sample is taken. Transitions cascade inside one `on_frame` call, so with a
/// zero settle delay the very first frame is already collected.
///
/// Not synchronized; the capture loop is the only writer.
pub struct SampleBuffer {
    status: BufferStatus,
    frames: Vec<Vec<Keypoint>>,
    capacity: usize,
    settle_delay: Duration,
    source: SampleSource,
    warmup_started: Option<Instant>,
    clock: Arc<dyn Clock>,
}

impl SampleBuffer {
    pub fn new(capacity: usize, settle_delay: Duration, clock: Arc<dyn Clock>) -> Self {
        let capacity = capacity.max(1);
        Self {
            status: BufferStatus::Idle,
            frames: Vec::with_capacity(capacity),
            capacity,
            settle_delay,
            source: SampleSource::default(),
            warmup_started: None,
            clock,
        }
    }

    pub fn with_source(mut self, source: SampleSource) -> Self {
        self.source = source;
        self
    }

    pub fn status(&self) -> BufferStatus {
        self.status
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn frames(&self) -> &[Vec<Keypoint>] {
        &self.frames
    }

    /// Time left in the settle delay; zero outside Warmup.
    pub fn warmup_remaining(&self) -> Duration {
        match (self.status, self.warmup_started) {
            (BufferStatus::Warmup, Some(started)) => self
                .settle_delay
                .saturating_sub(self.clock.now().saturating_duration_since(started)),
            _ => Duration::ZERO,
        }
    }

    pub fn on_frame(&mut self, hypotheses: &[PoseHypothesis]) -> FrameOutcome {
        let Some(pose) = hypotheses.first() else {
            return FrameOutcome::Ignored;
        };

        if self.status == BufferStatus::Idle {
            self.warmup_started = Some(self.clock.now());
            self.transition(BufferStatus::Warmup);
            log_info!("first pose seen, settling for {}ms", self.settle_delay.as_millis());
        }

        if self.status == BufferStatus::Warmup {
            if !self.warmup_remaining().is_zero() {
                return FrameOutcome::Warming;
            }
            self.transition(BufferStatus::Collecting);
            self.warmup_started = None;
            log_info!("collecting {} frames", self.capacity);
        }

        match self.status {
            BufferStatus::Collecting => {
                self.frames.push(self.source.select(pose).to_vec());
                let collected = self.frames.len();
                if collected >= self.capacity {
                    self.transition(BufferStatus::Ready);
                    log_info!("sample ready with {} frames", collected);
                    FrameOutcome::BecameReady
                } else {
                    log_debug!("collected frame {}/{}", collected, self.capacity);
                    FrameOutcome::Appended { collected }
                }
            }
            _ => FrameOutcome::Ignored,
        }
    }

    /// Take the finished sample and return to Idle.
    ///
    /// `None` means there is nothing to send yet; the partial sample, if any,
    /// is left untouched.
    pub fn take_ready(&mut self, label: &str) -> Option<Sample> {
        if self.status != BufferStatus::Ready {
            return None;
        }

        let frames = std::mem::replace(&mut self.frames, Vec::with_capacity(self.capacity));
        self.transition(BufferStatus::Idle);
        self.warmup_started = None;

        Some(Sample {
            label: label.to_string(),
            frames,
            capacity: self.capacity,
            completed_at: Utc::now(),
        })
    }

    /// Drop whatever is buffered and start over from Idle.
    pub fn reset(&mut self) {
        self.frames.clear();
        self.transition(BufferStatus::Idle);
        self.warmup_started = None;
    }

    fn transition(&mut self, next: BufferStatus) {
        if self.status != next {
            log_debug!("buffer {} -> {}", self.status.as_str(), next.as_str());
        }
        self.status = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::clock::ManualClock;

    fn pose(tag: f32) -> Vec<PoseHypothesis> {
        vec![PoseHypothesis::new(vec![Keypoint::new("nose", tag, tag, Some(0.9))])]
    }

    fn buffer(capacity: usize, delay_ms: u64) -> (SampleBuffer, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let buf = SampleBuffer::new(capacity, Duration::from_millis(delay_ms), clock.clone());
        (buf, clock)
    }

    #[test]
    fn test_empty_frame_is_noop() {
        let (mut buf, _) = buffer(3, 0);
        assert_eq!(buf.on_frame(&[]), FrameOutcome::Ignored);
        assert_eq!(buf.status(), BufferStatus::Idle);
    }

    #[test]
    fn test_warmup_holds_until_delay_elapses() {
        let (mut buf, clock) = buffer(3, 5000);

        assert_eq!(buf.on_frame(&pose(1.0)), FrameOutcome::Warming);
        assert_eq!(buf.status(), BufferStatus::Warmup);

        clock.advance(Duration::from_millis(4999));
        assert_eq!(buf.on_frame(&pose(2.0)), FrameOutcome::Warming);
        assert_eq!(buf.warmup_remaining(), Duration::from_millis(1));
        assert!(buf.is_empty());

        clock.advance(Duration::from_millis(1));
        assert_eq!(buf.on_frame(&pose(3.0)), FrameOutcome::Appended { collected: 1 });
        assert_eq!(buf.status(), BufferStatus::Collecting);
        assert_eq!(buf.frames()[0][0].x, 3.0);
    }

    #[test]
    fn test_zero_delay_collects_first_frame() {
        let (mut buf, _) = buffer(2, 0);
        assert_eq!(buf.on_frame(&pose(1.0)), FrameOutcome::Appended { collected: 1 });
        assert_eq!(buf.on_frame(&pose(2.0)), FrameOutcome::BecameReady);
        assert_eq!(buf.status(), BufferStatus::Ready);
    }

    #[test]
    fn test_capacity_is_never_exceeded() {
        let (mut buf, _) = buffer(300, 0);
        for i in 0..300 {
            buf.on_frame(&pose(i as f32));
        }
        assert_eq!(buf.status(), BufferStatus::Ready);
        assert_eq!(buf.len(), 300);

        assert_eq!(buf.on_frame(&pose(301.0)), FrameOutcome::Ignored);
        assert_eq!(buf.len(), 300);
        assert_eq!(buf.frames()[299][0].x, 299.0);
    }

    #[test]
    fn test_only_first_hypothesis_is_buffered() {
        let (mut buf, _) = buffer(5, 0);
        let mut frame = pose(1.0);
        frame.extend(pose(42.0));
        buf.on_frame(&frame);
        assert_eq!(buf.len(), 1);
        assert_eq!(buf.frames()[0][0].x, 1.0);
    }

    #[test]
    fn test_take_while_collecting_keeps_partial_sample() {
        let (mut buf, _) = buffer(5, 0);
        buf.on_frame(&pose(1.0));
        buf.on_frame(&pose(2.0));

        assert!(buf.take_ready("squat").is_none());
        assert_eq!(buf.status(), BufferStatus::Collecting);
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.frames()[1][0].x, 2.0);
    }

    #[test]
    fn test_take_ready_clears_and_returns_to_idle() {
        let (mut buf, _) = buffer(2, 0);
        buf.on_frame(&pose(1.0));
        buf.on_frame(&pose(2.0));

        let sample = buf.take_ready("squat").unwrap();
        assert_eq!(sample.label, "squat");
        assert_eq!(sample.len(), 2);
        assert_eq!(sample.capacity, 2);

        assert_eq!(buf.status(), BufferStatus::Idle);
        assert!(buf.is_empty());
        assert!(buf.take_ready("squat").is_none());
    }

    #[test]
    fn test_next_sample_warms_up_again() {
        let (mut buf, clock) = buffer(1, 100);
        buf.on_frame(&pose(1.0));
        clock.advance(Duration::from_millis(100));
        assert_eq!(buf.on_frame(&pose(2.0)), FrameOutcome::BecameReady);
        buf.take_ready("wave").unwrap();

        assert_eq!(buf.on_frame(&pose(3.0)), FrameOutcome::Warming);
        assert_eq!(buf.status(), BufferStatus::Warmup);
    }

    #[test]
    fn test_reset_abandons_partial_sample() {
        let (mut buf, _) = buffer(5, 0);
        buf.on_frame(&pose(1.0));
        buf.reset();
        assert_eq!(buf.status(), BufferStatus::Idle);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_zero_capacity_is_raised_to_one() {
        let (mut buf, _) = buffer(0, 0);
        assert_eq!(buf.capacity(), 1);
        assert_eq!(buf.on_frame(&pose(1.0)), FrameOutcome::BecameReady);
    }
}
