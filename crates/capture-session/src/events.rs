//! Event sink: screenshot and failure notifications

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use capture::CapturedImage;
use capture_types::SessionId;
use crossbeam_channel::{Receiver, Sender, unbounded};
use parking_lot::RwLock;
use tracing::{error, trace};

use crate::CaptureFailure;

/// Notification delivered to channel subscribers
#[derive(Debug, Clone)]
pub enum CaptureEvent {
    /// A screenshot was produced; `None` only when no bitmap was available
    ScreenshotTaken {
        session: SessionId,
        image: Option<CapturedImage>,
    },
    /// A capture attempt failed; the session keeps running
    CaptureFailed(CaptureFailure),
}

impl CaptureEvent {
    pub fn session(&self) -> SessionId {
        match self {
            CaptureEvent::ScreenshotTaken { session, .. } => *session,
            CaptureEvent::CaptureFailed(failure) => failure.session,
        }
    }
}

/// Receives capture outcomes.
///
/// Called on the session's worker thread, in tick order.
pub trait CaptureObserver: Send + Sync {
    /// The observer owns `image` from here on
    fn on_screenshot_taken(&self, session: SessionId, image: Option<CapturedImage>);

    fn on_capture_failed(&self, failure: &CaptureFailure) {
        let _ = failure;
    }
}

/// Handle for removing an observer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

struct ChannelObserver(Sender<CaptureEvent>);

impl CaptureObserver for ChannelObserver {
    fn on_screenshot_taken(&self, session: SessionId, image: Option<CapturedImage>) {
        if self.0.send(CaptureEvent::ScreenshotTaken { session, image }).is_err() {
            trace!("Screenshot receiver dropped");
        }
    }

    fn on_capture_failed(&self, failure: &CaptureFailure) {
        if self.0.send(CaptureEvent::CaptureFailed(failure.clone())).is_err() {
            trace!("Failure receiver dropped");
        }
    }
}

struct FnObserver<F>(F);

impl<F> CaptureObserver for FnObserver<F>
where
    F: Fn(CaptureEvent) + Send + Sync,
{
    fn on_screenshot_taken(&self, session: SessionId, image: Option<CapturedImage>) {
        (self.0)(CaptureEvent::ScreenshotTaken { session, image })
    }

    fn on_capture_failed(&self, failure: &CaptureFailure) {
        (self.0)(CaptureEvent::CaptureFailed(failure.clone()))
    }
}

/// Fan-out of capture outcomes to registered observers
#[derive(Default)]
pub struct EventSink {
    observers: RwLock<Vec<(ObserverId, Arc<dyn CaptureObserver>)>>,
    next_id: AtomicU64,
}

impl EventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, observer: Arc<dyn CaptureObserver>) -> ObserverId {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.observers.write().push((id, observer));
        id
    }

    /// Register a closure that receives every event
    pub fn subscribe_fn<F>(&self, f: F) -> ObserverId
    where
        F: Fn(CaptureEvent) + Send + Sync + 'static,
    {
        self.subscribe(Arc::new(FnObserver(f)))
    }

    /// Register an unbounded channel that receives every event
    pub fn subscribe_channel(&self) -> (ObserverId, Receiver<CaptureEvent>) {
        let (tx, rx) = unbounded();
        (self.subscribe(Arc::new(ChannelObserver(tx))), rx)
    }

    /// Remove an observer. An emission already in progress may still reach it.
    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        let mut observers = self.observers.write();
        let before = observers.len();
        observers.retain(|(observer_id, _)| *observer_id != id);
        observers.len() != before
    }

    pub fn observer_count(&self) -> usize {
        self.observers.read().len()
    }

    pub fn emit_screenshot(&self, session: SessionId, image: Option<CapturedImage>) {
        self.dispatch(|observer| observer.on_screenshot_taken(session, image.clone()));
    }

    pub fn emit_failure(&self, failure: &CaptureFailure) {
        self.dispatch(|observer| observer.on_capture_failed(failure));
    }

    pub fn emit(&self, event: CaptureEvent) {
        match event {
            CaptureEvent::ScreenshotTaken { session, image } => self.emit_screenshot(session, image),
            CaptureEvent::CaptureFailed(failure) => self.emit_failure(&failure),
        }
    }

    fn dispatch(&self, deliver: impl Fn(&dyn CaptureObserver)) {
        // Snapshot so observers may (un)subscribe from inside a callback
        let observers: Vec<Arc<dyn CaptureObserver>> = self
            .observers
            .read()
            .iter()
            .map(|(_, observer)| observer.clone())
            .collect();

        for observer in observers {
            if catch_unwind(AssertUnwindSafe(|| deliver(observer.as_ref()))).is_err() {
                error!("Capture observer panicked; continuing with the next one");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Operation;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        screenshots: Mutex<Vec<Option<u64>>>,
        failures: Mutex<Vec<String>>,
    }

    impl CaptureObserver for Recorder {
        fn on_screenshot_taken(&self, _session: SessionId, image: Option<CapturedImage>) {
            self.screenshots.lock().push(image.map(|i| i.sequence));
        }

        fn on_capture_failed(&self, failure: &CaptureFailure) {
            self.failures.lock().push(failure.message.clone());
        }
    }

    #[test]
    fn test_all_observers_receive_events_in_order() {
        let sink = EventSink::new();
        let recorder = Arc::new(Recorder::default());
        sink.subscribe(recorder.clone());
        let (_, rx) = sink.subscribe_channel();
        let session = SessionId::new();

        sink.emit_screenshot(session, None);
        sink.emit_failure(&CaptureFailure::new(session, Operation::Capture, "boom"));

        assert_eq!(*recorder.screenshots.lock(), vec![None]);
        assert_eq!(*recorder.failures.lock(), vec!["boom".to_string()]);

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], CaptureEvent::ScreenshotTaken { image: None, .. }));
        assert!(matches!(&events[1], CaptureEvent::CaptureFailed(f) if f.session == session));
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let sink = EventSink::new();
        let (id, rx) = sink.subscribe_channel();
        assert_eq!(sink.observer_count(), 1);

        assert!(sink.unsubscribe(id));
        assert!(!sink.unsubscribe(id));
        sink.emit_screenshot(SessionId::new(), None);

        assert_eq!(sink.observer_count(), 0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_panicking_observer_does_not_block_others() {
        let sink = EventSink::new();
        sink.subscribe_fn(|_| panic!("observer bug"));
        let (_, rx) = sink.subscribe_channel();

        sink.emit_screenshot(SessionId::new(), None);

        assert_eq!(rx.try_iter().count(), 1);
    }

    #[test]
    fn test_dropped_receiver_is_harmless() {
        let sink = EventSink::new();
        let (_, rx) = sink.subscribe_channel();
        drop(rx);

        sink.emit(CaptureEvent::ScreenshotTaken {
            session: SessionId::new(),
            image: None,
        });
    }
}
