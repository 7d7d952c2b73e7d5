//! Captured image data structures

use bytes::Bytes;
use capture_types::Bounds;
use std::time::SystemTime;

/// Pixel format of the captured image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// BGRA 8-bit per channel
    Bgra8,
    /// RGBA 8-bit per channel
    Rgba8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        4
    }
}

/// Owned, fully decoded screenshot
#[derive(Debug, Clone)]
pub struct CapturedImage {
    /// Raw pixel data, top-down rows
    pub data: Bytes,
    /// Image width
    pub width: u32,
    /// Image height
    pub height: u32,
    /// Stride (bytes per row)
    pub stride: u32,
    /// Pixel format
    pub format: PixelFormat,
    /// Screen rectangle the pixels were copied from
    pub bounds: Bounds,
    /// Wall-clock capture time
    pub captured_at: SystemTime,
    /// Engine-wide sequence number
    pub sequence: u64,
}

impl CapturedImage {
    /// Channel values at `(x, y)` in the image's own format
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = y as usize * self.stride as usize + x as usize * 4;
        let px = self.data.get(offset..offset + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Tightly packed RGBA copy, ready for an encoder
    pub fn to_rgba8(&self) -> Vec<u8> {
        match self.format {
            PixelFormat::Rgba8 if self.stride == self.width * 4 => self.data.to_vec(),
            _ => self.rgba_rows(),
        }
    }

    fn rgba_rows(&self) -> Vec<u8> {
        let row_len = self.width as usize * 4;
        let swap = self.format == PixelFormat::Bgra8;
        let mut out = Vec::with_capacity(row_len * self.height as usize);

        for row in self.data.chunks(self.stride.max(1) as usize).take(self.height as usize) {
            for chunk in row[..row_len.min(row.len())].chunks_exact(4) {
                if swap {
                    out.extend_from_slice(&[chunk[2], chunk[1], chunk[0], chunk[3]]);
                } else {
                    out.extend_from_slice(chunk);
                }
            }
        }

        out
    }
}
