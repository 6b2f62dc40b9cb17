pub mod args;
pub mod capture;
pub mod pipeline;
pub mod pose;
pub mod sample;
pub mod settings;
pub mod submission;
pub mod utils;

use std::sync::Arc;

use anyhow::Result;
use log::{info, warn};
use tokio::sync::watch;

use args::Args;
use capture::{
    CaptureController, CaptureSnapshot, CaptureStatus, LogRenderSink, PassthroughEstimator,
    ReplaySource, SendOutcome,
};
use pipeline::OrientationContext;
use sample::SystemClock;
use settings::SettingsStore;
use submission::UreqTransport;

/// Replay a recording through the capture pipeline and ship every sample
/// that fills up, until `args.samples` have been sent or the recording ends.
pub async fn run(args: Args) -> Result<()> {
    utils::init_logging();

    let store = SettingsStore::new(args.settings.clone())?;
    let settings = store.effective();
    if settings.secret.is_empty() {
        warn!("no shared secret configured; the training server will likely reject samples");
    }

    let orientation =
        OrientationContext::for_device(settings.platform, settings.portrait, settings.window_width);
    let (_orientation_tx, orientation_rx) = watch::channel(orientation);

    let mut controller = CaptureController::from_settings(
        &settings,
        Arc::new(UreqTransport::new()),
        Arc::new(SystemClock),
        orientation_rx,
    );
    let mut status_rx = controller.subscribe();

    let source = ReplaySource::load(&args.replay, settings.skeleton)?.with_frame_rate(args.fps);
    controller
        .start(source, PassthroughEstimator, LogRenderSink::default())
        .await?;

    let mut sent = 0u32;
    while sent < args.samples {
        let ready = tokio::select! {
            ready = wait_for_ready(&mut status_rx) => ready,
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                false
            }
        };
        if !ready {
            break;
        }

        match controller.trigger_send(&args.label).await {
            SendOutcome::Completed(result) => {
                info!("sample {}/{}: {}", sent + 1, args.samples, result.describe());
                sent += 1;
            }
            SendOutcome::NothingToSend | SendOutcome::Busy => {}
        }
    }

    let stats = controller.stop().await?;
    info!(
        "done: {} sample(s) sent, {} frames processed, {} estimation failures",
        sent, stats.frames_processed, stats.estimation_failures
    );
    Ok(())
}

/// True once the buffer is Ready; false if the loop stopped first.
async fn wait_for_ready(status_rx: &mut watch::Receiver<CaptureSnapshot>) -> bool {
    loop {
        {
            let snap = status_rx.borrow_and_update();
            if snap.status == CaptureStatus::Ready {
                return true;
            }
            if !snap.running {
                return false;
            }
        }
        if status_rx.changed().await.is_err() {
            return false;
        }
    }
}
