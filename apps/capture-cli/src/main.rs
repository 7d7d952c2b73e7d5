//! Capture CLI
//!
//! Periodically screenshots a process window (or the desktop) into a folder.

mod output;

use std::time::Duration;

use anyhow::{Context, Result};
use capture_session::{CaptureEvent, CaptureInterval, CaptureScheduler, SchedulerOptions};
use clap::Parser;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::output::{ScreenshotWriter, resolve_destination};

#[derive(Parser, Debug)]
#[command(name = "capture-cli")]
#[command(about = "Take screenshots of an application window at a fixed interval")]
struct Args {
    /// Process name to follow (with or without ".exe"); empty captures the desktop
    #[arg(short, long, default_value = "")]
    process: String,

    /// Seconds between screenshots
    #[arg(short, long, default_value = "1.0")]
    interval: f64,

    /// Folder for the PNG files; relative paths are resolved against the working directory
    #[arg(short, long, default_value = "")]
    destination: String,

    /// Stop after this many seconds
    #[arg(long)]
    duration: Option<f64>,

    /// Stop after this many saved screenshots
    #[arg(long)]
    count: Option<u64>,

    /// Do not bring the window to the front when capture starts
    #[arg(long)]
    no_activate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("capture_cli=info".parse()?)
                .add_directive("capture_session=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let interval = CaptureInterval::from_secs(args.interval)?;
    let run_for = args
        .duration
        .map(|secs| Duration::try_from_secs_f64(secs.max(0.0)))
        .transpose()
        .context("Invalid --duration")?;
    let writer = ScreenshotWriter::new(resolve_destination(&args.destination)?);
    info!("Saving screenshots to {}", writer.dir().display());

    let options = SchedulerOptions {
        activate_window: !args.no_activate,
        ..Default::default()
    };
    let scheduler =
        CaptureScheduler::native(options).context("Screen capture is not available here")?;

    let (observer, events) = scheduler.events().subscribe_channel();
    let (saved_tx, mut saved_rx) = watch::channel(0u64);

    // PNG encoding stays off the capture thread
    let saver = tokio::task::spawn_blocking(move || {
        let mut saved = 0u64;
        for event in events.iter() {
            match event {
                CaptureEvent::ScreenshotTaken {
                    image: Some(image), ..
                } => match writer.save(&image) {
                    Ok(path) => {
                        saved += 1;
                        debug!("Saved {}", path.display());
                        let _ = saved_tx.send(saved);
                    }
                    Err(e) => error!("Failed to save screenshot: {:#}", e),
                },
                CaptureEvent::ScreenshotTaken { image: None, .. } => {
                    warn!("Screenshot event without image");
                }
                CaptureEvent::CaptureFailed(failure) => {
                    warn!("{}", failure);
                }
            }
        }
        saved
    });

    scheduler.begin_capture(&args.process, interval.as_millis())?;
    info!(
        "Capturing '{}' every {} s, press Ctrl+C to stop",
        args.process, args.interval
    );

    let deadline = async {
        match run_for {
            Some(duration) => tokio::time::sleep(duration).await,
            None => std::future::pending().await,
        }
    };

    let reached_count = async {
        if let Some(limit) = args.count {
            if saved_rx.wait_for(|saved| *saved >= limit).await.is_ok() {
                return;
            }
        }
        std::future::pending::<()>().await
    };

    // Report geometry once the first tick has resolved the target
    let mut report = tokio::time::interval(Duration::from_secs(1));
    let mut last_report = String::new();

    tokio::pin!(deadline, reached_count);
    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result.context("Failed to listen for Ctrl+C")?;
                info!("Received Ctrl+C, stopping capture");
                break;
            }
            _ = &mut deadline => {
                info!("Duration elapsed, stopping capture");
                break;
            }
            _ = &mut reached_count => {
                info!("Screenshot count reached, stopping capture");
                break;
            }
            _ = report.tick() => {
                let line = scheduler.status().describe_target();
                if line != last_report {
                    println!("{}", line);
                    last_report = line;
                }
            }
        }
    }

    tokio::task::block_in_place(|| scheduler.shutdown());
    scheduler.events().unsubscribe(observer);

    let saved = saver.await.context("Screenshot writer panicked")?;
    info!("Saved {} screenshots", saved);

    println!("{}", serde_json::to_string_pretty(&scheduler.status())?);
    Ok(())
}
