//! Scriptable in-memory platform
//!
//! Stands in for the desktop in scheduler and resolver tests: processes and
//! windows are plain records, screen grabs return a solid colour, and every
//! call is recorded so tests can assert on what the engine did.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use capture_types::{Bounds, ProcessHandle, WindowId};
use parking_lot::Mutex;

use crate::process::process_name_matches;
use crate::{
    CaptureError, CaptureResult, DesktopEnvironment, PlatformServices, ResolutionError,
    ResolutionResult, SamplingQuality, ScreenSource,
};

/// BGRA value of every grabbed pixel; alpha deliberately zero
pub const FAKE_PIXEL: [u8; 4] = [0x20, 0x40, 0x80, 0x00];

#[derive(Debug, Clone)]
struct FakeWindow {
    id: WindowId,
    bounds: Bounds,
    minimized: bool,
}

#[derive(Debug, Clone)]
struct FakeProcess {
    handle: ProcessHandle,
    window: Option<FakeWindow>,
    alive: bool,
}

#[derive(Debug, Default)]
struct FakeState {
    desktop: Bounds,
    processes: Vec<FakeProcess>,
    next_pid: u32,
    next_window: isize,
    fail_process_queries: bool,
    fail_window_queries: bool,
    pending_grab_failures: usize,
    grab_delay: Duration,
    grabs: usize,
    restored: Vec<WindowId>,
    foregrounded: Vec<WindowId>,
    process_lookups: usize,
}

/// In-memory [`DesktopEnvironment`] and [`ScreenSource`]
pub struct FakePlatform {
    state: Mutex<FakeState>,
    grabs_in_flight: AtomicUsize,
    max_grabs_in_flight: AtomicUsize,
}

impl FakePlatform {
    pub fn new(desktop: Bounds) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(FakeState {
                desktop,
                next_pid: 1000,
                next_window: 0x10,
                ..Default::default()
            }),
            grabs_in_flight: AtomicUsize::new(0),
            max_grabs_in_flight: AtomicUsize::new(0),
        })
    }

    pub fn services(self: &Arc<Self>) -> PlatformServices {
        PlatformServices::new(self.clone())
    }

    /// Start a process, optionally with a window already open
    pub fn launch(&self, name: &str, window: Option<Bounds>) -> ProcessHandle {
        let mut state = self.state.lock();
        let pid = state.next_pid;
        state.next_pid += 1;

        let handle = ProcessHandle::new(pid, name, 1_000 + pid as u64);
        let window = window.map(|bounds| {
            let id = WindowId(state.next_window);
            state.next_window += 1;
            FakeWindow {
                id,
                bounds,
                minimized: false,
            }
        });

        state.processes.push(FakeProcess {
            handle: handle.clone(),
            window,
            alive: true,
        });
        handle
    }

    /// Give a running process a window (or replace its window)
    pub fn open_window(&self, pid: u32, bounds: Bounds) -> WindowId {
        let mut state = self.state.lock();
        let id = WindowId(state.next_window);
        state.next_window += 1;
        if let Some(process) = state.processes.iter_mut().find(|p| p.handle.pid == pid) {
            process.window = Some(FakeWindow {
                id,
                bounds,
                minimized: false,
            });
        }
        id
    }

    /// Move or resize the process's window
    pub fn move_window(&self, pid: u32, bounds: Bounds) {
        self.with_window(pid, |window| window.bounds = bounds);
    }

    pub fn minimize(&self, pid: u32) {
        self.with_window(pid, |window| window.minimized = true);
    }

    /// Destroy the process's window; its handle becomes invalid
    pub fn close_window(&self, pid: u32) {
        let mut state = self.state.lock();
        if let Some(process) = state.processes.iter_mut().find(|p| p.handle.pid == pid) {
            process.window = None;
        }
    }

    pub fn exit(&self, pid: u32) {
        let mut state = self.state.lock();
        if let Some(process) = state.processes.iter_mut().find(|p| p.handle.pid == pid) {
            process.alive = false;
            process.window = None;
        }
    }

    pub fn fail_process_queries(&self, fail: bool) {
        self.state.lock().fail_process_queries = fail;
    }

    pub fn fail_window_queries(&self, fail: bool) {
        self.state.lock().fail_window_queries = fail;
    }

    /// Make the next `count` screen grabs fail
    pub fn fail_next_grabs(&self, count: usize) {
        self.state.lock().pending_grab_failures = count;
    }

    /// Slow every screen grab down by `delay`
    pub fn set_grab_delay(&self, delay: Duration) {
        self.state.lock().grab_delay = delay;
    }

    pub fn is_minimized_pid(&self, pid: u32) -> bool {
        let state = self.state.lock();
        state
            .processes
            .iter()
            .find(|p| p.handle.pid == pid)
            .and_then(|p| p.window.as_ref())
            .map(|w| w.minimized)
            .unwrap_or(false)
    }

    pub fn window_of(&self, pid: u32) -> Option<WindowId> {
        let state = self.state.lock();
        state
            .processes
            .iter()
            .find(|p| p.handle.pid == pid)
            .and_then(|p| p.window.as_ref())
            .map(|w| w.id)
    }

    /// Grabs attempted so far, including failed ones
    pub fn grab_count(&self) -> usize {
        self.state.lock().grabs
    }

    pub fn restored(&self) -> Vec<WindowId> {
        self.state.lock().restored.clone()
    }

    pub fn foregrounded(&self) -> Vec<WindowId> {
        self.state.lock().foregrounded.clone()
    }

    /// Number of `find_process` calls
    pub fn process_lookups(&self) -> usize {
        self.state.lock().process_lookups
    }

    /// Highest number of grabs that were ever running at once
    pub fn max_concurrent_grabs(&self) -> usize {
        self.max_grabs_in_flight.load(Ordering::SeqCst)
    }

    fn with_window(&self, pid: u32, f: impl FnOnce(&mut FakeWindow)) {
        let mut state = self.state.lock();
        if let Some(window) = state
            .processes
            .iter_mut()
            .find(|p| p.handle.pid == pid)
            .and_then(|p| p.window.as_mut())
        {
            f(window);
        }
    }

    fn find_window<T>(&self, id: WindowId, f: impl FnOnce(&FakeWindow) -> T) -> Option<T> {
        let state = self.state.lock();
        state
            .processes
            .iter()
            .filter_map(|p| p.window.as_ref())
            .find(|w| w.id == id)
            .map(f)
    }
}

impl DesktopEnvironment for FakePlatform {
    fn find_process(&self, name: &str) -> ResolutionResult<Option<ProcessHandle>> {
        let mut state = self.state.lock();
        state.process_lookups += 1;
        if state.fail_process_queries {
            return Err(ResolutionError::ProcessQuery("simulated process query failure".into()));
        }

        let query = name.trim();
        Ok(state
            .processes
            .iter()
            .filter(|p| p.alive && process_name_matches(&p.handle.name, query))
            .map(|p| p.handle.clone())
            .next())
    }

    fn has_exited(&self, process: &ProcessHandle) -> ResolutionResult<bool> {
        let state = self.state.lock();
        if state.fail_process_queries {
            return Err(ResolutionError::ProcessQuery("simulated process query failure".into()));
        }

        Ok(!state
            .processes
            .iter()
            .any(|p| p.alive && p.handle == *process))
    }

    fn main_window(&self, process: &ProcessHandle) -> ResolutionResult<Option<WindowId>> {
        let state = self.state.lock();
        if state.fail_window_queries {
            return Err(ResolutionError::WindowQuery("simulated window query failure".into()));
        }

        Ok(state
            .processes
            .iter()
            .find(|p| p.handle == *process)
            .and_then(|p| p.window.as_ref())
            .map(|w| w.id))
    }

    fn window_bounds(&self, window: WindowId) -> ResolutionResult<Bounds> {
        if self.state.lock().fail_window_queries {
            return Err(ResolutionError::WindowQuery("simulated window query failure".into()));
        }

        self.find_window(window, |w| w.bounds)
            .ok_or_else(|| ResolutionError::WindowQuery(format!("invalid window handle {}", window)))
    }

    fn is_window(&self, window: WindowId) -> bool {
        self.find_window(window, |_| ()).is_some()
    }

    fn is_minimized(&self, window: WindowId) -> bool {
        self.find_window(window, |w| w.minimized).unwrap_or(false)
    }

    fn restore_window(&self, window: WindowId) -> CaptureResult<()> {
        let mut state = self.state.lock();
        state.restored.push(window);
        for process in state.processes.iter_mut() {
            if let Some(w) = process.window.as_mut().filter(|w| w.id == window) {
                w.minimized = false;
            }
        }
        Ok(())
    }

    fn bring_to_foreground(&self, window: WindowId) -> CaptureResult<()> {
        self.state.lock().foregrounded.push(window);
        Ok(())
    }

    fn primary_display_bounds(&self) -> Bounds {
        self.state.lock().desktop
    }
}

impl ScreenSource for FakePlatform {
    fn grab(&self, region: &Bounds, _quality: SamplingQuality) -> CaptureResult<Vec<u8>> {
        let in_flight = self.grabs_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_grabs_in_flight.fetch_max(in_flight, Ordering::SeqCst);

        let (delay, fail) = {
            let mut state = self.state.lock();
            state.grabs += 1;
            let fail = state.pending_grab_failures > 0;
            if fail {
                state.pending_grab_failures -= 1;
            }
            (state.grab_delay, fail)
        };

        if !delay.is_zero() {
            std::thread::sleep(delay);
        }

        self.grabs_in_flight.fetch_sub(1, Ordering::SeqCst);

        if fail {
            return Err(CaptureError::CaptureFailed("simulated BitBlt failure".into()));
        }

        Ok(FAKE_PIXEL.repeat(region.area() as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fake_process_lifecycle() {
        let platform = FakePlatform::new(Bounds::new(0, 0, 1920, 1080));
        let handle = platform.launch("viewer.exe", Some(Bounds::new(10, 10, 410, 310)));

        let found = platform.find_process("viewer").unwrap();
        assert_eq!(found, Some(handle.clone()));

        let window = platform.main_window(&handle).unwrap().unwrap();
        assert_eq!(platform.window_bounds(window).unwrap().width(), 400);

        platform.exit(handle.pid);
        assert!(platform.has_exited(&handle).unwrap());
        assert!(!platform.is_window(window));
        assert_eq!(platform.find_process("viewer").unwrap(), None);
    }

    #[test]
    fn test_fake_grab_failures_are_counted_down() {
        let platform = FakePlatform::new(Bounds::new(0, 0, 4, 4));
        platform.fail_next_grabs(1);

        let region = Bounds::new(0, 0, 2, 2);
        assert!(platform.grab(&region, SamplingQuality::High).is_err());
        let pixels = platform.grab(&region, SamplingQuality::High).unwrap();
        assert_eq!(pixels.len(), 16);
        assert_eq!(platform.grab_count(), 2);
    }
}
