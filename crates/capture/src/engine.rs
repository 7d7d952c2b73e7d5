//! Screenshot engine: turns a screen rectangle into an owned bitmap

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Instant, SystemTime};

use bytes::Bytes;
use capture_types::Bounds;
use tracing::trace;

use crate::{CaptureError, CaptureResult, CapturedImage, PixelFormat, SamplingQuality, ScreenSource};

/// Synchronous region-to-bitmap capture, independent of what the region shows
pub struct ScreenshotEngine {
    source: Arc<dyn ScreenSource>,
    quality: SamplingQuality,
    sequence: AtomicU64,
}

impl ScreenshotEngine {
    pub fn new(source: Arc<dyn ScreenSource>, quality: SamplingQuality) -> Self {
        Self {
            source,
            quality,
            sequence: AtomicU64::new(0),
        }
    }

    /// Number of images produced so far
    pub fn captured(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }

    /// Capture `bounds` at 32 bits per pixel with an opaque alpha channel.
    ///
    /// Either a complete bitmap of exactly `width x height` pixels is
    /// returned, or an error; partial buffers are rejected.
    pub fn capture(&self, bounds: Bounds) -> CaptureResult<CapturedImage> {
        if bounds.is_empty() {
            return Err(CaptureError::InvalidBounds {
                width: bounds.width(),
                height: bounds.height(),
            });
        }

        let started = Instant::now();
        let mut data = self.source.grab(&bounds, self.quality)?;

        let expected = bounds.area() as usize * PixelFormat::Bgra8.bytes_per_pixel();
        if data.len() != expected {
            return Err(CaptureError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }

        // GDI leaves alpha undefined
        for px in data.chunks_exact_mut(4) {
            px[3] = 0xFF;
        }

        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        trace!(
            "Captured #{} {} in {:?}",
            sequence,
            bounds,
            started.elapsed()
        );

        Ok(CapturedImage {
            data: Bytes::from(data),
            width: bounds.width(),
            height: bounds.height(),
            stride: bounds.width() * 4,
            format: PixelFormat::Bgra8,
            bounds,
            captured_at: SystemTime::now(),
            sequence,
        })
    }
}
