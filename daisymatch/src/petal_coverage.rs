//! Which DAISY petals land inside a crop of the image.
//!
//! When descriptors are only computed for a crop window, a pixel near that window still
//! needs the petals of its sampling grid that fall inside it. These helpers enumerate, for
//! every pixel of a canvas, how many of a chosen set of grid points land inside the crop,
//! and rate crop geometries by how many of those petals come in adjacent pairs.

use crate::daisy_grid::{point_index, ring_and_petal, DAISY_GRID, GRID_POINTS, PETALS_PER_RING};
use crate::error::{DaisyError, Result};
use image::{GrayImage, Luma};
use log::*;
use std::collections::BTreeMap;

/// Inclusive rectangle of canvas pixels for which data exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropWindow {
    pub start_y: usize,
    pub end_y: usize,
    pub start_x: usize,
    pub end_x: usize,
}

impl CropWindow {
    pub fn new(start_y: usize, end_y: usize, start_x: usize, end_x: usize) -> Result<Self> {
        if end_y < start_y {
            return Err(DaisyError::InvalidDimension {
                name: "crop end y",
                value: end_y as i64,
            });
        }
        if end_x < start_x {
            return Err(DaisyError::InvalidDimension {
                name: "crop end x",
                value: end_x as i64,
            });
        }
        Ok(CropWindow {
            start_y,
            end_y,
            start_x,
            end_x,
        })
    }

    /// A `width_y × width_x` crop centred on a square canvas of side `canvas`.
    pub fn centered(canvas: usize, width_x: usize, width_y: usize) -> Result<Self> {
        let start = |width: usize, name: &'static str| {
            if width == 0 || width > canvas {
                Err(DaisyError::InvalidDimension {
                    name,
                    value: width as i64,
                })
            } else {
                Ok(canvas / 2 - width / 2)
            }
        };
        let start_x = start(width_x, "crop width x")?;
        let start_y = start(width_y, "crop width y")?;
        Ok(CropWindow {
            start_y,
            end_y: start_y + width_y - 1,
            start_x,
            end_x: start_x + width_x - 1,
        })
    }

    pub fn contains(&self, y: isize, x: isize) -> bool {
        self.start_y as isize <= y
            && y <= self.end_y as isize
            && self.start_x as isize <= x
            && x <= self.end_x as isize
    }

    pub fn width(&self) -> usize {
        self.end_x - self.start_x + 1
    }

    pub fn height(&self) -> usize {
        self.end_y - self.start_y + 1
    }

    pub fn area(&self) -> usize {
        self.width() * self.height()
    }
}

/// The grid points taken into account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PetalSelection {
    /// All eight petals of one ring.
    Ring(usize),
    /// Arbitrary grid indices, see [`crate::daisy_grid::DAISY_GRID`]. Repeated indices
    /// count once.
    Points(Vec<usize>),
}

impl PetalSelection {
    fn indices(&self) -> Result<Vec<usize>> {
        let indices: Vec<usize> = match self {
            PetalSelection::Ring(ring) => (0..PETALS_PER_RING)
                .map(|petal| point_index(*ring, petal))
                .collect(),
            PetalSelection::Points(points) => {
                let mut points = points.clone();
                points.sort_unstable();
                points.dedup();
                points
            }
        };
        match indices.iter().find(|&&index| index >= GRID_POINTS) {
            Some(&bad) => Err(DaisyError::InvalidDimension {
                name: "grid point index",
                value: bad as i64,
            }),
            None => Ok(indices),
        }
    }
}

/// Per-pixel number of selected petals inside the crop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageMap {
    height: usize,
    width: usize,
    counts: Vec<u8>,
}

impl CoverageMap {
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn get(&self, y: usize, x: usize) -> u8 {
        self.counts[y * self.width + x]
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.counts
    }

    pub fn row(&self, y: usize) -> &[u8] {
        &self.counts[y * self.width..(y + 1) * self.width]
    }

    /// How many pixels have each count.
    pub fn histogram(&self) -> BTreeMap<u8, usize> {
        let mut histogram = BTreeMap::new();
        for &count in &self.counts {
            *histogram.entry(count).or_insert(0) += 1;
        }
        histogram
    }

    pub fn count_of(&self, petals: u8) -> usize {
        self.counts.iter().filter(|&&c| c == petals).count()
    }

    /// Grey image of the map, the highest count white.
    pub fn preview(&self) -> GrayImage {
        let max = self.counts.iter().copied().max().unwrap_or(0).max(1) as u32;
        GrayImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            Luma([(self.get(y as usize, x as usize) as u32 * 255 / max) as u8])
        })
    }
}

/// Counts, for every pixel of a `canvas_height × canvas_width` canvas, the selected petals
/// that land inside `crop`.
///
/// With `require_adjacent` a petal only counts when a neighbouring petal of the same ring
/// (petal number one lower or higher, no wrap-around between the last and first) is inside
/// the crop too.
pub fn coverage_map(
    canvas_height: usize,
    canvas_width: usize,
    crop: &CropWindow,
    selection: &PetalSelection,
    require_adjacent: bool,
) -> Result<CoverageMap> {
    let indices = selection.indices()?;
    let mut counts = vec![0u8; canvas_height * canvas_width];
    let mut inside: Vec<usize> = Vec::with_capacity(indices.len());

    for y in 0..canvas_height {
        for x in 0..canvas_width {
            inside.clear();
            inside.extend(indices.iter().copied().filter(|&index| {
                let offset = DAISY_GRID[index];
                crop.contains(y as isize + offset.y as isize, x as isize + offset.x as isize)
            }));
            let count = if require_adjacent {
                inside
                    .iter()
                    .filter(|&&index| inside.iter().any(|&other| adjacent(index, other)))
                    .count()
            } else {
                inside.len()
            };
            counts[y * canvas_width + x] = count as u8;
        }
    }

    Ok(CoverageMap {
        height: canvas_height,
        width: canvas_width,
        counts,
    })
}

fn adjacent(a: usize, b: usize) -> bool {
    match (ring_and_petal(a), ring_and_petal(b)) {
        (Some((ring_a, petal_a)), Some((ring_b, petal_b))) => {
            ring_a == ring_b && petal_a.abs_diff(petal_b) == 1
        }
        _ => false,
    }
}

/// Weight of a pixel whose coverage count is `petals`: the petals that can be grouped into
/// pairs, for up to five petals. Other counts do not contribute.
pub fn paired_petal_weight(petals: u8) -> u32 {
    match petals {
        2 | 3 => 2,
        4 | 5 => 4,
        _ => 0,
    }
}

/// Paired petal weight of `map` per crop pixel.
pub fn paired_ratio(map: &CoverageMap, crop: &CropWindow) -> f64 {
    let total: u64 = map
        .as_slice()
        .iter()
        .map(|&count| paired_petal_weight(count) as u64)
        .sum();
    total as f64 / crop.area() as f64
}

/// One crop geometry and its paired petal ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatioSample {
    pub width_x: usize,
    pub width_y: usize,
    pub ratio: f64,
}

/// Sweep over centred crop sizes on a square canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatioSweep {
    pub canvas: usize,
    /// Smallest crop side.
    pub min_width: usize,
    /// Crop sides stop before this value.
    pub max_width: usize,
    pub step: usize,
    pub ring: usize,
}

impl Default for RatioSweep {
    fn default() -> Self {
        RatioSweep {
            canvas: 128,
            min_width: 8,
            max_width: 34,
            step: 2,
            ring: 2,
        }
    }
}

impl RatioSweep {
    /// Evaluates every `(width_x, width_y)` combination, `width_x` in the outer loop.
    pub fn run(&self) -> Result<Vec<RatioSample>> {
        if self.step == 0 {
            return Err(DaisyError::InvalidDimension {
                name: "step",
                value: 0,
            });
        }
        let selection = PetalSelection::Ring(self.ring);
        let widths: Vec<usize> = (self.min_width..self.max_width).step_by(self.step).collect();
        let mut samples = Vec::with_capacity(widths.len() * widths.len());
        for &width_x in &widths {
            debug!("Sweeping crops {width_x} pixels wide");
            for &width_y in &widths {
                let crop = CropWindow::centered(self.canvas, width_x, width_y)?;
                let map = coverage_map(self.canvas, self.canvas, &crop, &selection, true)?;
                samples.push(RatioSample {
                    width_x,
                    width_y,
                    ratio: paired_ratio(&map, &crop),
                });
            }
        }
        Ok(samples)
    }
}

/// Coverage of the outer ring around a 32 × 32 crop in a 65 × 65 canvas.
pub fn legacy_coverage() -> Result<CoverageMap> {
    let crop = CropWindow::new(16, 47, 16, 47)?;
    coverage_map(65, 65, &crop, &PetalSelection::Ring(2), false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_crop_matches_integer_halving() {
        let crop = CropWindow::centered(128, 16, 24).unwrap();
        assert_eq!((crop.start_x, crop.end_x), (56, 71));
        assert_eq!((crop.start_y, crop.end_y), (52, 75));
        assert_eq!(crop.area(), 16 * 24);
        assert!(CropWindow::centered(10, 11, 2).is_err());
        assert!(CropWindow::centered(10, 0, 2).is_err());
    }

    #[test]
    fn single_cell_crop_is_hit_once_per_petal() {
        let crop = CropWindow::new(10, 10, 10, 10).unwrap();
        let map = coverage_map(21, 21, &crop, &PetalSelection::Ring(0), false).unwrap();
        assert_eq!(map.count_of(1), 8);
        assert_eq!(map.count_of(0), 21 * 21 - 8);
        // petal 0 sits five columns to the right, so the pixel five columns left sees it.
        assert_eq!(map.get(10, 5), 1);

        let paired = coverage_map(21, 21, &crop, &PetalSelection::Ring(0), true).unwrap();
        assert!(paired.as_slice().iter().all(|&c| c == 0));
        assert_eq!(paired_ratio(&paired, &crop), 0.0);
    }

    #[test]
    fn partial_rings_near_the_crop_border() {
        let crop = CropWindow::new(0, 10, 0, 10).unwrap();
        let plain = coverage_map(12, 12, &crop, &PetalSelection::Ring(0), false).unwrap();
        let paired = coverage_map(12, 12, &crop, &PetalSelection::Ring(0), true).unwrap();
        assert_eq!(plain.get(5, 5), 8);
        assert_eq!(paired.get(5, 5), 8);
        // petals 3, 4 and 5 fall left of the crop.
        assert_eq!(plain.get(5, 1), 5);
        assert_eq!(paired.get(5, 1), 5);
        // only petals 0, 1 and 2 remain.
        assert_eq!(plain.get(1, 1), 3);
        assert_eq!(paired.get(1, 1), 3);
        for (p, q) in plain.as_slice().iter().zip(paired.as_slice()) {
            assert!(q <= p);
            assert!(*p <= 8);
        }
    }

    #[test]
    fn first_and_last_petal_are_not_neighbours() {
        // around pixel (10, 10) only petal 0 at (10, 15) and petal 7 at (6, 14) are inside.
        let crop = CropWindow::new(6, 10, 14, 15).unwrap();
        let plain = coverage_map(20, 20, &crop, &PetalSelection::Ring(0), false).unwrap();
        let paired = coverage_map(20, 20, &crop, &PetalSelection::Ring(0), true).unwrap();
        assert_eq!(plain.get(10, 10), 2);
        assert_eq!(paired.get(10, 10), 0);
    }

    #[test]
    fn petals_of_different_rings_are_not_neighbours() {
        let crop = CropWindow::new(0, 40, 0, 40).unwrap();
        let selection = PetalSelection::Points(vec![point_index(0, 0), point_index(1, 1)]);
        let paired = coverage_map(41, 41, &crop, &selection, true).unwrap();
        assert!(paired.as_slice().iter().all(|&c| c == 0));
        let plain = coverage_map(41, 41, &crop, &selection, false).unwrap();
        assert_eq!(plain.get(20, 20), 2);
    }

    #[test]
    fn invalid_points_are_rejected() {
        let crop = CropWindow::new(0, 1, 0, 1).unwrap();
        let selection = PetalSelection::Points(vec![GRID_POINTS]);
        assert!(coverage_map(4, 4, &crop, &selection, false).is_err());
    }

    #[test]
    fn repeated_points_count_once() {
        let crop = CropWindow::new(0, 31, 0, 31).unwrap();
        let once = PetalSelection::Points(vec![0, 1, 2]);
        let repeated = PetalSelection::Points(vec![2, 0, 1, 1, 0].repeat(100));
        let a = coverage_map(32, 32, &crop, &once, false).unwrap();
        let b = coverage_map(32, 32, &crop, &repeated, false).unwrap();
        assert_eq!(a, b);
        assert_eq!(b.get(16, 16), 3);
    }

    #[test]
    fn weights_group_petals_in_pairs() {
        let weights: Vec<u32> = (0..=8).map(paired_petal_weight).collect();
        assert_eq!(weights, vec![0, 0, 2, 2, 4, 4, 0, 0, 0]);
    }

    #[test]
    fn histogram_adds_up_to_canvas() {
        let map = legacy_coverage().unwrap();
        let total: usize = map.histogram().values().sum();
        assert_eq!(total, 65 * 65);
        // pixels in the middle of the crop see every outer petal.
        assert_eq!(map.get(32, 32), 8);
        assert_eq!(map.get(0, 0), 0);
    }

    #[test]
    fn sweep_covers_every_combination() {
        let sweep = RatioSweep {
            canvas: 48,
            min_width: 8,
            max_width: 14,
            step: 2,
            ring: 2,
        };
        let samples = sweep.run().unwrap();
        assert_eq!(samples.len(), 9);
        assert_eq!((samples[0].width_x, samples[0].width_y), (8, 8));
        assert_eq!((samples[1].width_x, samples[1].width_y), (8, 10));
        assert!(samples.iter().all(|s| s.ratio >= 0.0));
    }
}
