use serde::Serialize;

use crate::sample::BufferStatus;
use crate::submission::SubmissionResult;

/// What the status display shows.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum CaptureStatus {
    Idle,
    Warmup,
    Collecting,
    Ready,
    Sent,
}

impl Default for CaptureStatus {
    fn default() -> Self {
        CaptureStatus::Idle
    }
}

impl From<BufferStatus> for CaptureStatus {
    fn from(status: BufferStatus) -> Self {
        match status {
            BufferStatus::Idle => CaptureStatus::Idle,
            BufferStatus::Warmup => CaptureStatus::Warmup,
            BufferStatus::Collecting => CaptureStatus::Collecting,
            BufferStatus::Ready => CaptureStatus::Ready,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CaptureSnapshot {
    pub status: CaptureStatus,
    pub running: bool,
    pub frames_collected: usize,
    pub capacity: usize,
    pub fps: u32,
    pub last_submission: Option<SubmissionResult>,
}

impl CaptureSnapshot {
    /// Fold in the buffer state after a frame. "Sent" sticks while the buffer
    /// sits idle so the display keeps the outcome of the last send.
    pub fn apply_buffer(&mut self, status: BufferStatus, frames_collected: usize, capacity: usize) {
        let keep_sent = self.status == CaptureStatus::Sent && status == BufferStatus::Idle;
        if !keep_sent {
            self.status = status.into();
        }
        self.frames_collected = frames_collected;
        self.capacity = capacity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sent_sticks_while_idle() {
        let mut snap = CaptureSnapshot {
            status: CaptureStatus::Sent,
            ..Default::default()
        };
        snap.apply_buffer(BufferStatus::Idle, 0, 300);
        assert_eq!(snap.status, CaptureStatus::Sent);

        snap.apply_buffer(BufferStatus::Warmup, 0, 300);
        assert_eq!(snap.status, CaptureStatus::Warmup);
    }

    #[test]
    fn test_snapshot_serializes_for_display() {
        let snap = CaptureSnapshot {
            status: CaptureStatus::Collecting,
            running: true,
            frames_collected: 12,
            capacity: 300,
            fps: 24,
            last_submission: None,
        };
        let value = serde_json::to_value(&snap).unwrap();
        assert_eq!(value["status"], "collecting");
        assert_eq!(value["framesCollected"], 12);
    }
}
