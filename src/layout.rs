//! Page geometry for overlay placement
//!
//! All values are in PDF points (1/72 inch) with the origin at the
//! bottom-left of the page.

use crate::config::{WATERMARK_ANGLE_DEGREES, WATERMARK_LEFT_OFFSET};

/// Page dimensions in points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    /// US Letter size (8.5" × 11")
    pub fn letter() -> Self {
        Self { width: 612.0, height: 792.0 }
    }

    /// A4 size (210mm × 297mm)
    pub fn a4() -> Self {
        Self { width: 595.28, height: 841.89 }
    }

    /// Size of a `[llx lly urx ury]` box; `None` if it has no area
    pub fn from_box(rect: [f32; 4]) -> Option<Self> {
        let width = (rect[2] - rect[0]).abs();
        let height = (rect[3] - rect[1]).abs();
        if width > 0.0 && height > 0.0 {
            Some(Self { width, height })
        } else {
            None
        }
    }
}

/// Where and how a run of text is laid down
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextPlacement {
    pub x: f32,
    pub y: f32,
    /// Counter-clockwise rotation about `(x, y)` in degrees
    pub angle_degrees: f32,
}

impl TextPlacement {
    /// Unrotated text starting at `(x, y)`
    pub fn at(x: f32, y: f32) -> Self {
        Self { x, y, angle_degrees: 0.0 }
    }

    /// Text matrix `[a b c d e f]` for the `Tm` operator
    pub fn text_matrix(&self) -> [f32; 6] {
        let radians = self.angle_degrees.to_radians();
        let (sin, cos) = radians.sin_cos();
        [cos, sin, -sin, cos, self.x, self.y]
    }
}

/// Placement of the watermark on a page of the given size
///
/// The origin sits 150pt left of the horizontal centre at the vertical
/// centre, and the text runs diagonally up at 45°.
pub fn watermark_placement(page: &PageSize) -> TextPlacement {
    TextPlacement {
        x: page.width / 2.0 - WATERMARK_LEFT_OFFSET,
        y: page.height / 2.0,
        angle_degrees: WATERMARK_ANGLE_DEGREES,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letter_size() {
        let letter = PageSize::letter();
        assert_eq!(letter.width, 612.0);
        assert_eq!(letter.height, 792.0);
    }

    #[test]
    fn test_from_box_handles_offset_origin() {
        let size = PageSize::from_box([10.0, 20.0, 622.0, 812.0]).unwrap();
        assert_eq!(size, PageSize::letter());
        assert!(PageSize::from_box([0.0, 0.0, 0.0, 100.0]).is_none());
    }

    #[test]
    fn test_watermark_placement_on_letter() {
        let placement = watermark_placement(&PageSize::letter());
        assert_eq!(placement.x, 156.0);
        assert_eq!(placement.y, 396.0);
        assert_eq!(placement.angle_degrees, 45.0);
    }

    #[test]
    fn test_unrotated_text_matrix_is_translation() {
        let m = TextPlacement::at(50.0, 60.0).text_matrix();
        assert_eq!(m, [1.0, 0.0, -0.0, 1.0, 50.0, 60.0]);
    }

    #[test]
    fn test_rotated_text_matrix() {
        let m = watermark_placement(&PageSize::letter()).text_matrix();
        let half_sqrt2 = std::f32::consts::FRAC_1_SQRT_2;
        assert!((m[0] - half_sqrt2).abs() < 1e-5);
        assert!((m[1] - half_sqrt2).abs() < 1e-5);
        assert!((m[2] + half_sqrt2).abs() < 1e-5);
        assert!((m[3] - half_sqrt2).abs() < 1e-5);
    }
}
