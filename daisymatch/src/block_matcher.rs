use crate::descriptor_field::DescriptorField;
use crate::distance::l1_distance;
use crate::error::{DaisyError, Result};
use crate::match_result::{MatchResult, PixelMatch};
use crate::search_window::SearchWindow;
use log::*;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Brute-force nearest-descriptor search between two descriptor fields.
///
/// For every pixel of the first field the matcher scans the [`SearchWindow`] around the
/// same position in the second field and keeps the candidate with the smallest L1
/// distance. Candidates are visited row by row, left to right, and only a strictly smaller
/// distance replaces the current best, so among equal distances the first one scanned wins.
///
/// Each pixel is reduced independently, which lets rows be processed in parallel
/// (`rayon` feature) without changing the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockMatcher {
    pub window: SearchWindow,

    /// Spread rows over the rayon thread pool. Ignored without the `rayon` feature.
    pub parallel: bool,
}

impl Default for BlockMatcher {
    fn default() -> Self {
        BlockMatcher {
            window: SearchWindow::default(),
            parallel: true,
        }
    }
}

impl BlockMatcher {
    pub fn new(window: SearchWindow) -> Self {
        BlockMatcher {
            window,
            ..Default::default()
        }
    }

    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Finds the best match in `b` for the descriptor of pixel `(y, x)` in `a`.
    ///
    /// Both fields must share the same shape; [`BlockMatcher::match_fields`] checks this.
    pub fn match_pixel(
        &self,
        a: &DescriptorField,
        b: &DescriptorField,
        y: usize,
        x: usize,
    ) -> PixelMatch {
        let descriptor = a.descriptor(y, x);
        // the window is never empty, so the first candidate always replaces this
        let mut best = PixelMatch {
            diff: f32::INFINITY,
            ..PixelMatch::default()
        };
        for other_y in self.window.rows(y, b.height()) {
            for other_x in self.window.cols(x, b.width()) {
                let diff = l1_distance(b.descriptor(other_y, other_x), descriptor);
                if diff < best.diff {
                    best = PixelMatch {
                        offset_y: other_y as i64 - y as i64,
                        offset_x: other_x as i64 - x as i64,
                        diff,
                    };
                }
            }
        }
        best
    }

    /// Matches every pixel of `a` against `b`.
    pub fn match_fields(&self, a: &DescriptorField, b: &DescriptorField) -> Result<MatchResult> {
        if a.dimensions() != b.dimensions() {
            return Err(DaisyError::DimensionMismatch {
                left: a.dimensions().to_string(),
                right: b.dimensions().to_string(),
            });
        }

        let (height, width) = (a.height(), a.width());
        info!(
            "Matching {} descriptor fields with a {}x{} {:?} search window",
            a.dimensions(),
            self.window.height,
            self.window.width,
            self.window.alignment
        );

        let mut result = MatchResult::new(height, width);
        let (offsets_y, offsets_x, diffs) = result.maps_mut();
        let match_row = |y: usize, row_y: &mut [i64], row_x: &mut [i64], row_diff: &mut [f32]| {
            for x in 0..width {
                let best = self.match_pixel(a, b, y, x);
                row_y[x] = best.offset_y;
                row_x[x] = best.offset_x;
                row_diff[x] = best.diff;
            }
            debug!("Finished row {y}");
        };

        #[cfg(feature = "rayon")]
        {
            if self.parallel {
                offsets_y
                    .par_chunks_mut(width)
                    .zip(offsets_x.par_chunks_mut(width))
                    .zip(diffs.par_chunks_mut(width))
                    .enumerate()
                    .for_each(|(y, ((row_y, row_x), row_diff))| {
                        match_row(y, row_y, row_x, row_diff)
                    });
                info!("Matching finished");
                return Ok(result);
            }
        }

        offsets_y
            .chunks_mut(width)
            .zip(offsets_x.chunks_mut(width))
            .zip(diffs.chunks_mut(width))
            .enumerate()
            .for_each(|(y, ((row_y, row_x), row_diff))| match_row(y, row_y, row_x, row_diff));
        info!("Matching finished");
        Ok(result)
    }
}
