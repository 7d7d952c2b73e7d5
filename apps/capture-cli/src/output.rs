//! Screenshot destination and PNG files

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use capture_session::CapturedImage;
use chrono::{DateTime, Utc};
use image::{ImageFormat, RgbaImage};
use tracing::debug;

/// Absolute, existing directory for `raw`; blank means the working directory
pub fn resolve_destination(raw: &str) -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("Failed to read working directory")?;
    let raw = raw.trim();

    let dir = if raw.is_empty() {
        cwd
    } else {
        let path = Path::new(raw);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            cwd.join(path)
        }
    };

    if !dir.exists() {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        debug!("Created destination {}", dir.display());
    } else if !dir.is_dir() {
        anyhow::bail!("{} is not a directory", dir.display());
    }

    Ok(dir)
}

/// `yyyy-MM-dd_HHmmssfff.png` in UTC
pub fn screenshot_file_name(at: DateTime<Utc>) -> String {
    format!("{}.png", at.format("%Y-%m-%d_%H%M%S%3f"))
}

/// Writes screenshots into one directory
pub struct ScreenshotWriter {
    dir: PathBuf,
}

impl ScreenshotWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Encode `image` as PNG named after its capture time
    pub fn save(&self, image: &CapturedImage) -> Result<PathBuf> {
        let path = self
            .dir
            .join(screenshot_file_name(DateTime::<Utc>::from(image.captured_at)));

        let pixels = RgbaImage::from_raw(image.width, image.height, image.to_rgba8())
            .context("Pixel buffer does not match image size")?;
        pixels
            .save_with_format(&path, ImageFormat::Png)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capture::testing::{FAKE_PIXEL, FakePlatform};
    use capture::{SamplingQuality, ScreenshotEngine};
    use capture_session::Bounds;
    use chrono::TimeZone;

    #[test]
    fn test_file_name_format() {
        let at = Utc.with_ymd_and_hms(2024, 3, 5, 7, 8, 9).unwrap()
            + chrono::Duration::milliseconds(42);
        assert_eq!(screenshot_file_name(at), "2024-03-05_070809042.png");
    }

    #[test]
    fn test_missing_destination_is_created() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("shots").join("today");

        let dir = resolve_destination(nested.to_str().unwrap()).unwrap();

        assert_eq!(dir, nested);
        assert!(dir.is_dir());
    }

    #[test]
    fn test_blank_destination_is_working_directory() {
        let dir = resolve_destination("  ").unwrap();
        assert_eq!(dir, std::env::current_dir().unwrap());
        assert!(dir.is_absolute());
    }

    #[test]
    fn test_file_destination_rejected() {
        let root = tempfile::tempdir().unwrap();
        let file = root.path().join("not-a-dir");
        std::fs::write(&file, b"x").unwrap();

        assert!(resolve_destination(file.to_str().unwrap()).is_err());
    }

    #[test]
    fn test_save_writes_opaque_png() {
        let root = tempfile::tempdir().unwrap();
        let platform = FakePlatform::new(Bounds::new(0, 0, 8, 8));
        let engine = ScreenshotEngine::new(platform, SamplingQuality::High);
        let shot = engine.capture(Bounds::new(2, 2, 6, 5)).unwrap();
        let writer = ScreenshotWriter::new(root.path().to_path_buf());

        let path = writer.save(&shot).unwrap();

        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("png"));
        let decoded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (4, 3));
        let px = decoded.get_pixel(0, 0).0;
        assert_eq!(px, [FAKE_PIXEL[2], FAKE_PIXEL[1], FAKE_PIXEL[0], 0xFF]);
    }
}
