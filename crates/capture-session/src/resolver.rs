//! Target resolution: process name to capture bounds

use std::sync::Arc;

use capture::{DesktopEnvironment, ResolutionError, ResolutionResult};
use capture_types::{Bounds, CaptureTarget, ProcessHandle, WindowId};
use tracing::{debug, info, warn};

/// Outcome of one resolution cycle
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Region to capture; always usable
    pub bounds: Bounds,
    /// What the bounds belong to
    pub target: CaptureTarget,
    /// Platform failure that forced the desktop fallback
    pub error: Option<ResolutionError>,
}

impl Resolution {
    fn desktop(bounds: Bounds, error: Option<ResolutionError>) -> Self {
        Self {
            bounds,
            target: CaptureTarget::Desktop,
            error,
        }
    }
}

/// Resolves a process name to window bounds, falling back to the desktop.
///
/// The located process is cached between calls and re-validated on every
/// call; a window is never cached.
pub struct TargetResolver {
    environment: Arc<dyn DesktopEnvironment>,
    process: Option<ProcessHandle>,
}

impl TargetResolver {
    pub fn new(environment: Arc<dyn DesktopEnvironment>) -> Self {
        Self {
            environment,
            process: None,
        }
    }

    /// Process found by the last lookup, if still considered alive
    pub fn cached_process(&self) -> Option<&ProcessHandle> {
        self.process.as_ref()
    }

    /// Resolve the bounds to capture for `process_name`.
    ///
    /// Never fails: a blank name, a missing process, a window that is not
    /// there yet, and platform query failures all yield the primary display.
    pub fn resolve(&mut self, process_name: &str) -> Resolution {
        let name = process_name.trim();
        if name.is_empty() {
            self.process = None;
            return Resolution::desktop(self.environment.primary_display_bounds(), None);
        }

        match self.resolve_window(name) {
            Ok(Some((process, window, bounds))) => Resolution {
                bounds,
                target: CaptureTarget::Process { process, window },
                error: None,
            },
            Ok(None) => Resolution::desktop(self.environment.primary_display_bounds(), None),
            Err(error) => {
                warn!("Resolving '{}' failed, using desktop: {}", name, error);
                // A window failure keeps the process; it may just be mid-creation
                if error.is_process_failure() {
                    self.process = None;
                }
                Resolution::desktop(self.environment.primary_display_bounds(), Some(error))
            }
        }
    }

    fn resolve_window(
        &mut self,
        name: &str,
    ) -> ResolutionResult<Option<(ProcessHandle, WindowId, Bounds)>> {
        let stale = match &self.process {
            Some(process) => self.environment.has_exited(process)?,
            None => true,
        };

        if stale {
            if let Some(gone) = self.process.take() {
                info!("Target process {} exited", gone);
            }
            self.process = self.environment.find_process(name)?;
            match &self.process {
                Some(process) => info!("Found target process {}", process),
                None => debug!("No process named '{}'", name),
            }
        }

        let Some(process) = self.process.clone() else {
            return Ok(None);
        };

        let Some(window) = self.environment.main_window(&process)? else {
            debug!("{} has no main window yet", process);
            return Ok(None);
        };

        let bounds = self.environment.window_bounds(window)?;
        if bounds.is_empty() {
            debug!("Window {} of {} has empty bounds", window, process);
            return Ok(None);
        }

        Ok(Some((process, window, bounds)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capture::testing::FakePlatform;

    const DESKTOP: Bounds = Bounds::new(0, 0, 2560, 1440);

    fn resolver(platform: &Arc<FakePlatform>) -> TargetResolver {
        TargetResolver::new(platform.clone())
    }

    #[test]
    fn test_blank_name_is_desktop() {
        let platform = FakePlatform::new(DESKTOP);
        let mut resolver = resolver(&platform);

        for name in ["", "   ", "\t\n"] {
            let resolution = resolver.resolve(name);
            assert_eq!(resolution, Resolution::desktop(DESKTOP, None));
        }
        assert_eq!(platform.process_lookups(), 0);
    }

    #[test]
    fn test_missing_process_falls_back_without_error() {
        let platform = FakePlatform::new(DESKTOP);
        let mut resolver = resolver(&platform);

        for name in ["nonexistent_proc", "Notepad", "x"] {
            let resolution = resolver.resolve(name);
            assert_eq!(resolution.bounds, DESKTOP);
            assert!(!resolution.target.is_process());
            assert!(resolution.error.is_none());
            assert!(resolver.cached_process().is_none());
        }
    }

    #[test]
    fn test_process_window_bounds() {
        let platform = FakePlatform::new(DESKTOP);
        let window = Bounds::new(100, 200, 900, 800);
        let process = platform.launch("editor.exe", Some(window));
        let mut resolver = resolver(&platform);

        let resolution = resolver.resolve("editor");

        assert_eq!(resolution.bounds, window);
        assert_eq!(resolution.target.process(), Some(&process));
        assert_eq!(resolution.target.window(), platform.window_of(process.pid));
        assert_eq!(resolver.cached_process(), Some(&process));
    }

    #[test]
    fn test_window_moves_are_picked_up_every_call() {
        let platform = FakePlatform::new(DESKTOP);
        let process = platform.launch("editor.exe", Some(Bounds::new(0, 0, 640, 480)));
        let mut resolver = resolver(&platform);

        assert_eq!(resolver.resolve("editor.exe").bounds, Bounds::new(0, 0, 640, 480));

        platform.move_window(process.pid, Bounds::new(50, 60, 1074, 828));
        assert_eq!(resolver.resolve("editor.exe").bounds, Bounds::new(50, 60, 1074, 828));

        // Cached process is reused rather than looked up again
        assert_eq!(platform.process_lookups(), 1);
    }

    #[test]
    fn test_windowless_process_keeps_cache() {
        let platform = FakePlatform::new(DESKTOP);
        let process = platform.launch("starting.exe", None);
        let mut resolver = resolver(&platform);

        let resolution = resolver.resolve("starting");
        assert_eq!(resolution.bounds, DESKTOP);
        assert!(!resolution.target.is_process());
        assert!(resolution.error.is_none());
        assert_eq!(resolver.cached_process(), Some(&process));

        let window = Bounds::new(10, 10, 330, 250);
        platform.open_window(process.pid, window);
        let resolution = resolver.resolve("starting");
        assert_eq!(resolution.bounds, window);
        assert!(resolution.target.is_process());
        assert_eq!(platform.process_lookups(), 1);
    }

    #[test]
    fn test_closed_window_keeps_live_process() {
        let platform = FakePlatform::new(DESKTOP);
        let process = platform.launch("editor.exe", Some(Bounds::new(0, 0, 640, 480)));
        let mut resolver = resolver(&platform);
        assert!(resolver.resolve("editor").target.is_process());

        platform.close_window(process.pid);
        let resolution = resolver.resolve("editor");

        assert_eq!(resolution, Resolution::desktop(DESKTOP, None));
        assert_eq!(resolver.cached_process(), Some(&process));

        let reopened = Bounds::new(20, 20, 420, 320);
        platform.open_window(process.pid, reopened);
        assert_eq!(resolver.resolve("editor").bounds, reopened);
        assert_eq!(platform.process_lookups(), 1);
    }

    #[test]
    fn test_empty_window_rect_falls_back() {
        let platform = FakePlatform::new(DESKTOP);
        let process = platform.launch("tiny.exe", Some(Bounds::new(40, 40, 40, 90)));
        let mut resolver = resolver(&platform);

        let resolution = resolver.resolve("tiny");
        assert_eq!(resolution.bounds, DESKTOP);
        assert!(!resolution.target.is_process());
        assert_eq!(resolver.cached_process(), Some(&process));
    }

    #[test]
    fn test_exited_process_is_replaced() {
        let platform = FakePlatform::new(DESKTOP);
        let first = platform.launch("worker.exe", Some(Bounds::new(0, 0, 100, 100)));
        let mut resolver = resolver(&platform);
        assert!(resolver.resolve("worker").target.is_process());

        platform.exit(first.pid);
        let resolution = resolver.resolve("worker");
        assert_eq!(resolution.bounds, DESKTOP);
        assert!(resolver.cached_process().is_none());

        let second = platform.launch("worker.exe", Some(Bounds::new(5, 5, 205, 105)));
        let resolution = resolver.resolve("worker");
        assert_eq!(resolution.target.process(), Some(&second));
        assert_eq!(resolution.bounds, Bounds::new(5, 5, 205, 105));
    }

    #[test]
    fn test_process_query_failure_clears_cache() {
        let platform = FakePlatform::new(DESKTOP);
        platform.launch("app.exe", Some(Bounds::new(0, 0, 300, 300)));
        let mut resolver = resolver(&platform);
        assert!(resolver.resolve("app").target.is_process());

        platform.fail_process_queries(true);
        let resolution = resolver.resolve("app");

        assert_eq!(resolution.bounds, DESKTOP);
        assert!(matches!(
            resolution.error,
            Some(ResolutionError::ProcessQuery(_))
        ));
        assert!(resolver.cached_process().is_none());

        platform.fail_process_queries(false);
        assert!(resolver.resolve("app").target.is_process());
    }

    #[test]
    fn test_window_query_failure_keeps_process() {
        let platform = FakePlatform::new(DESKTOP);
        let process = platform.launch("app.exe", Some(Bounds::new(0, 0, 300, 300)));
        let mut resolver = resolver(&platform);
        resolver.resolve("app");

        platform.fail_window_queries(true);
        let resolution = resolver.resolve("app");

        assert_eq!(resolution.bounds, DESKTOP);
        assert!(matches!(resolution.error, Some(ResolutionError::WindowQuery(_))));
        assert_eq!(resolver.cached_process(), Some(&process));

        platform.fail_window_queries(false);
        assert_eq!(resolver.resolve("app").bounds, Bounds::new(0, 0, 300, 300));
        assert_eq!(platform.process_lookups(), 1);
    }
}
