//! Observable session status

use capture_types::{Bounds, CaptureTarget, SessionId, SessionState};
use serde::Serialize;

use crate::{CaptureFailure, CaptureInterval};

/// Snapshot of the current (or most recent) capture session
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionStatus {
    pub session: Option<SessionId>,
    pub process_name: String,
    pub state: SessionState,
    pub target: CaptureTarget,
    pub bounds: Bounds,
    pub interval: Option<CaptureInterval>,
    pub last_error: Option<CaptureFailure>,
    pub screenshots: u64,
    pub failures: u64,
}

impl SessionStatus {
    pub fn is_active(&self) -> bool {
        self.state == SessionState::Running
    }

    /// Capturing a live process window rather than the desktop
    pub fn is_process_found(&self) -> bool {
        self.target.is_process()
    }

    /// One-line summary of the acquired geometry
    pub fn describe_target(&self) -> String {
        if self.is_process_found() {
            format!("Acquired {}", self.bounds)
        } else {
            "Process window bounds not acquired.".to_string()
        }
    }
}
