//! Capture targets: processes, windows and the desktop

use serde::{Deserialize, Serialize};

/// Opaque native window handle value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowId(pub isize);

impl std::fmt::Display for WindowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// A running process located by name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessHandle {
    /// Operating system process id
    pub pid: u32,
    /// Process name as reported by the OS
    pub name: String,
    /// Start time in seconds since the epoch; distinguishes a reused pid
    pub start_time: u64,
}

impl ProcessHandle {
    pub fn new(pid: u32, name: impl Into<String>, start_time: u64) -> Self {
        Self {
            pid,
            name: name.into(),
            start_time,
        }
    }
}

impl std::fmt::Display for ProcessHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (pid {})", self.name, self.pid)
    }
}

/// What a capture cycle resolved to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureTarget {
    /// Whole primary display
    #[default]
    Desktop,
    /// Top-level window of a live process
    Process {
        process: ProcessHandle,
        window: WindowId,
    },
}

impl CaptureTarget {
    pub fn is_process(&self) -> bool {
        matches!(self, CaptureTarget::Process { .. })
    }

    pub fn window(&self) -> Option<WindowId> {
        match self {
            CaptureTarget::Process { window, .. } => Some(*window),
            CaptureTarget::Desktop => None,
        }
    }

    pub fn process(&self) -> Option<&ProcessHandle> {
        match self {
            CaptureTarget::Process { process, .. } => Some(process),
            CaptureTarget::Desktop => None,
        }
    }
}
