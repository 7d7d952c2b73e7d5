//! Screen-space geometry

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in screen coordinates.
///
/// `right` and `bottom` are exclusive, matching the Win32 `RECT` convention.
/// A rectangle whose right/bottom edge lies left of/above its origin is
/// treated as zero-sized rather than negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bounds {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Bounds {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Build from an origin and a size
    pub fn from_origin_size(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            left: x,
            top: y,
            right: x.saturating_add(width.min(i32::MAX as u32) as i32),
            bottom: y.saturating_add(height.min(i32::MAX as u32) as i32),
        }
    }

    pub fn width(&self) -> u32 {
        (self.right as i64 - self.left as i64).max(0) as u32
    }

    pub fn height(&self) -> u32 {
        (self.bottom as i64 - self.top as i64).max(0) as u32
    }

    /// No usable geometry: callers fall back to the desktop
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Number of pixels covered
    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }
}

impl std::fmt::Display for Bounds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}x{} @ [{}, {}, {}, {}]",
            self.width(),
            self.height(),
            self.left,
            self.top,
            self.right,
            self.bottom
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions_are_derived() {
        let bounds = Bounds::new(-8, 10, 1912, 1090);
        assert_eq!(bounds.width(), 1920);
        assert_eq!(bounds.height(), 1080);
        assert_eq!(bounds.area(), 1920 * 1080);
        assert!(!bounds.is_empty());
    }

    #[test]
    fn test_inverted_rect_is_empty_not_negative() {
        let bounds = Bounds::new(100, 100, 50, 300);
        assert_eq!(bounds.width(), 0);
        assert_eq!(bounds.height(), 200);
        assert!(bounds.is_empty());
        assert!(Bounds::default().is_empty());
    }

    #[test]
    fn test_from_origin_size() {
        let bounds = Bounds::from_origin_size(20, 30, 640, 480);
        assert_eq!(bounds, Bounds::new(20, 30, 660, 510));

        let clamped = Bounds::from_origin_size(i32::MAX - 1, 0, 100, 1);
        assert_eq!(clamped.right, i32::MAX);
    }

    #[test]
    fn test_display_matches_status_line() {
        let bounds = Bounds::new(10, 20, 810, 620);
        assert_eq!(bounds.to_string(), "800x600 @ [10, 20, 810, 620]");
    }
}
