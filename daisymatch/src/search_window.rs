use crate::error::{DaisyError, Result};
use std::ops::Range;

/// Default number of rows searched around each pixel.
pub const DEFAULT_WINDOW_HEIGHT: usize = 21;

/// Default number of columns searched around each pixel.
pub const DEFAULT_WINDOW_WIDTH: usize = 151;

/// How the search window is placed around the pixel being matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowAlignment {
    /// `[p - n/2, p + n/2)`, clamped to the image. With floor division this yields `n - 1`
    /// positions for odd `n` and `n` for even `n`, one more before the pixel than after it.
    /// Existing match files were produced with this layout.
    #[default]
    Legacy,

    /// `[p - n/2, p + n/2]`, clamped to the image, i.e. exactly `n` positions for odd `n`
    /// centred on the pixel. Not compatible with files produced with [`WindowAlignment::Legacy`].
    Centered,
}

/// The rectangular neighbourhood searched in the second image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWindow {
    /// Extent along image rows.
    pub height: usize,
    /// Extent along image columns.
    pub width: usize,
    pub alignment: WindowAlignment,
}

impl Default for SearchWindow {
    fn default() -> Self {
        SearchWindow {
            height: DEFAULT_WINDOW_HEIGHT,
            width: DEFAULT_WINDOW_WIDTH,
            alignment: WindowAlignment::Legacy,
        }
    }
}

impl SearchWindow {
    pub fn new(height: usize, width: usize) -> Result<Self> {
        if height == 0 {
            return Err(DaisyError::InvalidDimension {
                name: "search window height",
                value: 0,
            });
        }
        if width == 0 {
            return Err(DaisyError::InvalidDimension {
                name: "search window width",
                value: 0,
            });
        }
        Ok(SearchWindow {
            height,
            width,
            alignment: WindowAlignment::Legacy,
        })
    }

    pub fn with_alignment(mut self, alignment: WindowAlignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// A window large enough to cover every pixel of an image of the given size from any
    /// position, whatever the alignment.
    pub fn covering(image_height: usize, image_width: usize) -> Self {
        SearchWindow {
            height: image_height * 2 + 1,
            width: image_width * 2 + 1,
            alignment: WindowAlignment::Legacy,
        }
    }

    /// Rows searched for a pixel in row `y` of an image `image_height` rows tall.
    pub fn rows(&self, y: usize, image_height: usize) -> Range<usize> {
        span(y, self.height, image_height, self.alignment)
    }

    /// Columns searched for a pixel in column `x` of an image `image_width` columns wide.
    pub fn cols(&self, x: usize, image_width: usize) -> Range<usize> {
        span(x, self.width, image_width, self.alignment)
    }
}

// A half-extent of zero would give an empty legacy range; it collapses onto the pixel
// itself instead.
fn span(position: usize, extent: usize, limit: usize, alignment: WindowAlignment) -> Range<usize> {
    debug_assert!(position < limit);
    let half = extent / 2;
    let start = position.saturating_sub(half);
    let end = match alignment {
        WindowAlignment::Legacy => position + half.max(1),
        WindowAlignment::Centered => position + half + 1,
    };
    start..end.min(limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_window_is_asymmetric_for_odd_extent() {
        let window = SearchWindow::default();
        assert_eq!(window.rows(50, 100), 40..60);
        assert_eq!(window.rows(50, 100).len(), 20);
        assert_eq!(window.cols(500, 1024), 425..575);
    }

    #[test]
    fn legacy_window_even_extent() {
        let window = SearchWindow::new(20, 4).unwrap();
        assert_eq!(window.rows(50, 100), 40..60);
        assert_eq!(window.cols(5, 10), 3..7);
    }

    #[test]
    fn window_is_clamped_at_borders() {
        let window = SearchWindow::default();
        assert_eq!(window.rows(0, 100), 0..10);
        assert_eq!(window.rows(3, 100), 0..13);
        assert_eq!(window.rows(99, 100), 89..100);
        assert_eq!(window.cols(0, 5), 0..5);
    }

    #[test]
    fn unit_window_collapses_to_pixel() {
        let window = SearchWindow::new(1, 1).unwrap();
        for y in 0..4 {
            assert_eq!(window.rows(y, 4), y..y + 1);
        }
        let centered = window.with_alignment(WindowAlignment::Centered);
        assert_eq!(centered.rows(2, 4), 2..3);
    }

    #[test]
    fn centered_window_is_symmetric() {
        let window = SearchWindow::default().with_alignment(WindowAlignment::Centered);
        assert_eq!(window.rows(50, 100), 40..61);
        assert_eq!(window.rows(50, 100).len(), 21);
        assert_eq!(window.rows(95, 100), 85..100);
    }

    #[test]
    fn windows_are_never_empty_and_contain_the_pixel() {
        for extent in 1..8 {
            for limit in 1..6 {
                for alignment in [WindowAlignment::Legacy, WindowAlignment::Centered] {
                    let window = SearchWindow::new(extent, extent)
                        .unwrap()
                        .with_alignment(alignment);
                    for p in 0..limit {
                        let range = window.rows(p, limit);
                        assert!(!range.is_empty());
                        assert!(range.contains(&p));
                        assert!(range.end <= limit);
                    }
                }
            }
        }
    }

    #[test]
    fn zero_extent_is_rejected() {
        assert!(SearchWindow::new(0, 3).is_err());
        assert!(SearchWindow::new(3, 0).is_err());
    }

    #[test]
    fn covering_window_spans_the_image() {
        let window = SearchWindow::covering(2, 3);
        for y in 0..2 {
            assert_eq!(window.rows(y, 2), 0..2);
        }
        for x in 0..3 {
            assert_eq!(window.cols(x, 3), 0..3);
        }
    }
}
