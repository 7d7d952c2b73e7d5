//! Capture scheduler - the periodic loop
//!
//! Each session runs on its own worker thread:
//! resolve -> (activate once) -> start timer -> capture -> tick ... -> stop

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use capture::{CaptureResult, DesktopEnvironment, PlatformServices, ScreenshotEngine};
use capture_types::{Bounds, SessionId, SessionState};
use crossbeam_channel::{Receiver, Sender, bounded, select, tick};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::{
    CaptureFailure, CaptureInterval, EventSink, Operation, Resolution, SchedulerOptions,
    SessionResult, SessionStatus, TargetResolver, WindowActivator,
};

/// State shared between a session's worker and the scheduler's readers
struct SessionShared {
    id: SessionId,
    status: RwLock<SessionStatus>,
    stopped: AtomicBool,
}

impl SessionShared {
    fn new(id: SessionId, process_name: &str, interval: CaptureInterval) -> Self {
        Self {
            id,
            status: RwLock::new(SessionStatus {
                session: Some(id),
                process_name: process_name.to_string(),
                interval: Some(interval),
                ..Default::default()
            }),
            stopped: AtomicBool::new(false),
        }
    }

    /// Idle -> Running, unless stop won the race
    fn mark_running(&self) -> bool {
        let mut status = self.status.write();
        if self.stopped.load(Ordering::SeqCst) {
            return false;
        }
        status.state = SessionState::Running;
        true
    }

    fn mark_stopped(&self) {
        let mut status = self.status.write();
        self.stopped.store(true, Ordering::SeqCst);
        status.state = SessionState::Idle;
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    fn record_resolution(&self, resolution: &Resolution) {
        let mut status = self.status.write();
        status.bounds = resolution.bounds;
        status.target = resolution.target.clone();
        if let Some(error) = &resolution.error {
            status.last_error = Some(CaptureFailure::new(self.id, Operation::ResolveTarget, error));
        }
    }

    fn snapshot(&self) -> SessionStatus {
        self.status.read().clone()
    }
}

/// Scheduler-side handle of a session
struct SessionHandle {
    shared: Arc<SessionShared>,
    stop_tx: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl SessionHandle {
    /// Disable future ticks; idempotent
    fn retire(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            info!("Stopping capture session {}", self.shared.id.short());
            self.shared.mark_stopped();
            // Disconnecting wakes the worker
            drop(stop_tx);
        }
    }
}

/// Everything a session worker owns
struct SessionWorker {
    shared: Arc<SessionShared>,
    environment: Arc<dyn DesktopEnvironment>,
    engine: Arc<ScreenshotEngine>,
    events: Arc<EventSink>,
    activate_window: bool,
    process_name: String,
    interval: CaptureInterval,
}

impl SessionWorker {
    fn run(self, stop_rx: Receiver<()>, previous: Option<JoinHandle<()>>) {
        // Never overlap with the session being replaced
        if let Some(previous) = previous {
            if previous.join().is_err() {
                error!("Previous capture worker panicked");
            }
        }

        if self.shared.is_stopped() {
            debug!("Session {} stopped before it started", self.shared.id.short());
            return;
        }

        let mut resolver = TargetResolver::new(self.environment.clone());
        let first = resolver.resolve(&self.process_name);
        self.shared.record_resolution(&first);

        if self.activate_window && first.target.is_process() {
            WindowActivator::new(self.environment.clone()).activate(&first.target);
        }

        let ticker = tick(self.interval.as_duration());
        if !self.shared.mark_running() {
            return;
        }

        info!(
            "Capture session {} running: target='{}' interval={}ms bounds={}",
            self.shared.id.short(),
            self.process_name,
            self.interval.as_millis(),
            first.bounds
        );

        // Tick zero, without waiting a full interval
        self.capture(first.bounds);

        loop {
            select! {
                recv(stop_rx) -> _ => break,
                recv(ticker) -> _ => {
                    if self.shared.is_stopped() {
                        break;
                    }
                    let resolution = resolver.resolve(&self.process_name);
                    self.shared.record_resolution(&resolution);
                    self.capture(resolution.bounds);
                }
            }
        }

        info!("Capture session {} ended", self.shared.id.short());
    }

    fn capture(&self, bounds: Bounds) {
        match self.engine.capture(bounds) {
            Ok(image) => {
                self.shared.status.write().screenshots += 1;
                self.events.emit_screenshot(self.shared.id, Some(image));
            }
            Err(e) => {
                warn!("Capture of {} failed: {}", bounds, e);
                let failure = CaptureFailure::new(self.shared.id, Operation::Capture, &e);
                {
                    let mut status = self.shared.status.write();
                    status.failures += 1;
                    status.last_error = Some(failure.clone());
                }
                self.events.emit_failure(&failure);
            }
        }
    }
}

/// Periodic screenshot scheduler.
///
/// At most one session is active; starting another retires the current one.
pub struct CaptureScheduler {
    environment: Arc<dyn DesktopEnvironment>,
    engine: Arc<ScreenshotEngine>,
    events: Arc<EventSink>,
    options: SchedulerOptions,
    current: Mutex<Option<SessionHandle>>,
}

impl CaptureScheduler {
    pub fn new(platform: PlatformServices, options: SchedulerOptions) -> Self {
        Self {
            environment: platform.environment,
            engine: Arc::new(ScreenshotEngine::new(platform.screen, options.quality)),
            events: Arc::new(EventSink::new()),
            options,
            current: Mutex::new(None),
        }
    }

    /// Scheduler backed by the native platform
    pub fn native(options: SchedulerOptions) -> CaptureResult<Self> {
        Ok(Self::new(capture::create_platform()?, options))
    }

    /// Where screenshots and failures are delivered
    pub fn events(&self) -> &EventSink {
        &self.events
    }

    /// Start capturing `process_name` (blank = desktop) every `interval_ms`.
    ///
    /// Returns as soon as the worker thread exists; resolution, activation
    /// and the first screenshot happen on that thread. A running session is
    /// stopped first and its worker finishes before the new one does anything.
    pub fn begin_capture(&self, process_name: &str, interval_ms: f64) -> SessionResult<SessionId> {
        let interval = CaptureInterval::from_millis(interval_ms)?;

        let mut current = self.current.lock();
        let previous = current.as_mut().and_then(|handle| {
            handle.retire();
            handle.worker.take()
        });

        let id = SessionId::new();
        let shared = Arc::new(SessionShared::new(id, process_name, interval));
        let (stop_tx, stop_rx) = bounded::<()>(1);

        let worker = SessionWorker {
            shared: shared.clone(),
            environment: self.environment.clone(),
            engine: self.engine.clone(),
            events: self.events.clone(),
            activate_window: self.options.activate_window,
            process_name: process_name.to_string(),
            interval,
        };

        info!(
            "Starting capture session {} for '{}'",
            id.short(),
            process_name.trim()
        );

        let handle = thread::Builder::new()
            .name(self.options.thread_name.clone())
            .spawn(move || worker.run(stop_rx, previous))?;

        *current = Some(SessionHandle {
            shared,
            stop_tx: Some(stop_tx),
            worker: Some(handle),
        });

        Ok(id)
    }

    /// Stop the active session. Safe to call at any time, any number of times.
    ///
    /// A tick already in progress completes and still emits its result.
    pub fn stop_capture(&self) {
        if let Some(handle) = self.current.lock().as_mut() {
            handle.retire();
        }
    }

    /// Stop and wait for the worker to finish its in-flight tick
    pub fn shutdown(&self) {
        let worker = self.current.lock().as_mut().and_then(|handle| {
            handle.retire();
            handle.worker.take()
        });

        if let Some(worker) = worker {
            if worker.join().is_err() {
                error!("Capture worker panicked");
            }
        }
    }

    /// Status of the current or most recent session
    pub fn status(&self) -> SessionStatus {
        self.current
            .lock()
            .as_ref()
            .map(|handle| handle.shared.snapshot())
            .unwrap_or_default()
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.current.lock().as_ref().map(|handle| handle.shared.id)
    }

    pub fn state(&self) -> SessionState {
        self.status().state
    }

    pub fn is_active(&self) -> bool {
        self.status().is_active()
    }

    pub fn is_process_found(&self) -> bool {
        self.status().is_process_found()
    }

    pub fn bounds(&self) -> Bounds {
        self.status().bounds
    }

    pub fn interval(&self) -> Option<CaptureInterval> {
        self.status().interval
    }

    pub fn last_error(&self) -> Option<CaptureFailure> {
        self.status().last_error
    }
}

impl Drop for CaptureScheduler {
    fn drop(&mut self) {
        self.stop_capture();
    }
}
