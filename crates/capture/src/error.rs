//! Capture error types

use thiserror::Error;

/// Failure while copying screen pixels into a bitmap
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    #[error("Invalid capture bounds: {width}x{height}")]
    InvalidBounds { width: u32, height: u32 },

    #[error("Device context unavailable: {0}")]
    DeviceContext(String),

    #[error("Screen copy failed: {0}")]
    CaptureFailed(String),

    #[error("Pixel buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    #[error("Window operation failed: {0}")]
    WindowOperation(String),

    #[error("Platform not supported")]
    UnsupportedPlatform,

    #[error("Platform error: {0}")]
    Platform(String),
}

pub type CaptureResult<T> = Result<T, CaptureError>;

/// Failure while locating a process or querying its window
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("Process query failed: {0}")]
    ProcessQuery(String),

    #[error("Window query failed: {0}")]
    WindowQuery(String),
}

impl ResolutionError {
    /// True when the failure concerns the process itself rather than its window
    pub fn is_process_failure(&self) -> bool {
        matches!(self, ResolutionError::ProcessQuery(_))
    }
}

pub type ResolutionResult<T> = Result<T, ResolutionError>;
