//! Bringing the target window to the front

use std::sync::Arc;

use capture::DesktopEnvironment;
use capture_types::CaptureTarget;
use tracing::debug;

/// Best-effort window activation
pub struct WindowActivator {
    environment: Arc<dyn DesktopEnvironment>,
}

impl WindowActivator {
    pub fn new(environment: Arc<dyn DesktopEnvironment>) -> Self {
        Self { environment }
    }

    /// Restore the target's window if minimized, then focus it.
    ///
    /// Returns whether the window accepted focus. Failures are only logged.
    pub fn activate(&self, target: &CaptureTarget) -> bool {
        let Some(window) = target.window() else {
            return false;
        };

        if !self.environment.is_window(window) {
            debug!("Window {} is gone, skipping activation", window);
            return false;
        }

        if self.environment.is_minimized(window) {
            if let Err(e) = self.environment.restore_window(window) {
                debug!("Restoring window {} failed: {}", window, e);
            }
        }

        match self.environment.bring_to_foreground(window) {
            Ok(()) => {
                debug!("Activated window {}", window);
                true
            }
            Err(e) => {
                debug!("Activating window {} failed: {}", window, e);
                false
            }
        }
    }
}
