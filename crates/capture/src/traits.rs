//! Platform trait abstraction

use std::sync::Arc;

use capture_types::{Bounds, ProcessHandle, WindowId};

use crate::{CaptureResult, ResolutionResult};

/// Sampling settings applied to the destination device context.
///
/// They only affect scaled copies; a 1:1 region copy is identical either way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SamplingQuality {
    /// Halftone/bicubic style resampling
    #[default]
    High,
    /// Nearest-colour resampling
    Fast,
}

/// Process, window and display queries
pub trait DesktopEnvironment: Send + Sync {
    /// First live process whose name matches `name`
    fn find_process(&self, name: &str) -> ResolutionResult<Option<ProcessHandle>>;

    /// Check whether a previously found process is gone
    fn has_exited(&self, process: &ProcessHandle) -> ResolutionResult<bool>;

    /// Top-level window owned by the process, if it has one yet
    fn main_window(&self, process: &ProcessHandle) -> ResolutionResult<Option<WindowId>>;

    /// Screen-space rectangle of a window
    fn window_bounds(&self, window: WindowId) -> ResolutionResult<Bounds>;

    /// Check if the handle still names a window
    fn is_window(&self, window: WindowId) -> bool;

    /// Check if the window is minimized
    fn is_minimized(&self, window: WindowId) -> bool;

    /// Restore a minimized window
    fn restore_window(&self, window: WindowId) -> CaptureResult<()>;

    /// Ask the window manager to focus the window
    fn bring_to_foreground(&self, window: WindowId) -> CaptureResult<()>;

    /// Bounds of the primary display
    fn primary_display_bounds(&self) -> Bounds;
}

/// Raw screen pixel access
pub trait ScreenSource: Send + Sync {
    /// Copy `region` into a tightly packed, top-down BGRA buffer
    fn grab(&self, region: &Bounds, quality: SamplingQuality) -> CaptureResult<Vec<u8>>;
}

/// The two platform halves, usually backed by the same object
#[derive(Clone)]
pub struct PlatformServices {
    pub environment: Arc<dyn DesktopEnvironment>,
    pub screen: Arc<dyn ScreenSource>,
}

impl PlatformServices {
    pub fn new<P>(platform: Arc<P>) -> Self
    where
        P: DesktopEnvironment + ScreenSource + 'static,
    {
        Self {
            environment: platform.clone(),
            screen: platform,
        }
    }
}
