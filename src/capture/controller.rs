use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use log::info;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::loop_worker::{capture_loop, LoopContext, LoopOptions, LoopStats};
use super::snapshot::{CaptureSnapshot, CaptureStatus};
use super::source::{FrameSource, PoseEstimator, RenderSink};
use crate::pipeline::OrientationContext;
use crate::sample::{Clock, SampleBuffer};
use crate::settings::CaptureSettings;
use crate::submission::{SubmissionClient, SubmissionResult, Transport};

/// Result of pressing "save & send".
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// The buffer is not Ready; nothing was touched.
    NothingToSend,
    /// Another submission is still in flight.
    Busy,
    Completed(SubmissionResult),
}

/// Clears the in-flight flag even if the send future is dropped midway.
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// One capture session: the sample buffer, the loop feeding it and the
/// client that ships finished samples.
pub struct CaptureController {
    buffer: Arc<Mutex<SampleBuffer>>,
    client: SubmissionClient,
    options: LoopOptions,
    orientation: watch::Receiver<OrientationContext>,
    status: Arc<watch::Sender<CaptureSnapshot>>,
    submitting: Arc<AtomicBool>,
    handle: Option<JoinHandle<LoopStats>>,
    cancel_token: Option<CancellationToken>,
}

impl CaptureController {
    pub fn new(
        buffer: SampleBuffer,
        client: SubmissionClient,
        options: LoopOptions,
        orientation: watch::Receiver<OrientationContext>,
    ) -> Self {
        let initial = CaptureSnapshot {
            capacity: buffer.capacity(),
            ..Default::default()
        };
        let (status, _) = watch::channel(initial);

        Self {
            buffer: Arc::new(Mutex::new(buffer)),
            client,
            options,
            orientation,
            status: Arc::new(status),
            submitting: Arc::new(AtomicBool::new(false)),
            handle: None,
            cancel_token: None,
        }
    }

    pub fn from_settings(
        settings: &CaptureSettings,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
        orientation: watch::Receiver<OrientationContext>,
    ) -> Self {
        let buffer = SampleBuffer::new(
            settings.effective_capacity(),
            settings.effective_settle_delay(),
            clock,
        )
        .with_source(settings.sample_source);
        let client = SubmissionClient::new(transport, settings.server_url.clone(), settings.secret.clone());

        Self::new(buffer, client, settings.loop_options(), orientation)
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    pub fn subscribe(&self) -> watch::Receiver<CaptureSnapshot> {
        self.status.subscribe()
    }

    pub fn snapshot(&self) -> CaptureSnapshot {
        self.status.borrow().clone()
    }

    /// Spawn the capture loop. A loop whose source already ran dry is joined
    /// first, so a finished session can be restarted without `stop`.
    pub async fn start<S, E, R>(&mut self, source: S, estimator: E, render: R) -> Result<()>
    where
        S: FrameSource,
        E: PoseEstimator<S::Frame>,
        R: RenderSink,
    {
        if self.handle.as_ref().is_some_and(|handle| handle.is_finished()) {
            let stats = self.stop().await?;
            info!(
                "previous capture finished after {} frames",
                stats.frames_released
            );
        }
        if self.handle.is_some() {
            bail!("capture already active");
        }

        let cancel_token = CancellationToken::new();
        self.status.send_modify(|snap| snap.running = true);
        let ctx = LoopContext {
            buffer: Arc::clone(&self.buffer),
            orientation: self.orientation.clone(),
            status: Arc::clone(&self.status),
        };

        let handle = tokio::spawn(capture_loop(
            source,
            estimator,
            render,
            ctx,
            self.options,
            cancel_token.clone(),
        ));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        info!("capture started, posting samples to {}", self.client.endpoint());
        Ok(())
    }

    /// Cancel the loop and wait for it to release its frame. A submission in
    /// flight is not affected.
    pub async fn stop(&mut self) -> Result<LoopStats> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        match self.handle.take() {
            Some(handle) => handle.await.context("capture loop task failed to join"),
            None => Ok(LoopStats::default()),
        }
    }

    /// Take the ready sample, label it and post it once.
    ///
    /// The buffer is cleared whether or not the server accepts the sample;
    /// a failed sample has to be recorded again.
    pub async fn trigger_send(&self, label: &str) -> SendOutcome {
        if self.submitting.swap(true, Ordering::SeqCst) {
            return SendOutcome::Busy;
        }
        let _in_flight = InFlight(Arc::clone(&self.submitting));

        let sample = {
            let mut buffer = self.buffer.lock().await;
            let taken = buffer.take_ready(label);
            if taken.is_some() {
                let (status, len, capacity) = (buffer.status(), buffer.len(), buffer.capacity());
                self.status.send_modify(|snap| snap.apply_buffer(status, len, capacity));
            }
            taken
        };
        let Some(sample) = sample else {
            info!("nothing to send yet");
            return SendOutcome::NothingToSend;
        };

        if label.trim().is_empty() {
            log::warn!("sending sample with an empty label");
        }

        let result = self.client.submit(&sample).await;
        self.status.send_modify(|snap| {
            // The loop may have started the next sample while the POST was out.
            if snap.status == CaptureStatus::Idle {
                snap.status = CaptureStatus::Sent;
            }
            snap.last_submission = Some(result.clone());
        });
        SendOutcome::Completed(result)
    }

    /// Abandon the sample in progress.
    pub async fn reset(&self) {
        let mut buffer = self.buffer.lock().await;
        buffer.reset();
        let capacity = buffer.capacity();
        self.status.send_modify(|snap| {
            snap.status = CaptureStatus::Idle;
            snap.frames_collected = 0;
            snap.capacity = capacity;
        });
    }
}
