//! Fixed sampling geometry of the DAISY descriptor.
//!
//! A descriptor samples the centre pixel plus three rings of eight petals. Ring `r` has
//! radius [`RING_RADII`]`[r]`, petal `p` lies at angle `p * 45°` with `y = sin` and `x = cos`.
//! The offsets below are those positions rounded to whole pixels.

/// Radii of the petal rings, innermost first.
pub const RING_RADII: [u8; 3] = [5, 10, 15];

pub const RING_COUNT: usize = RING_RADII.len();

pub const PETALS_PER_RING: usize = 8;

/// Centre point plus every petal.
pub const GRID_POINTS: usize = 1 + RING_COUNT * PETALS_PER_RING;

/// Gradient orientation bins histogrammed at every grid point.
pub const GRADIENT_ORIENTATIONS: usize = 8;

/// Length of a descriptor vector produced with this geometry.
pub const DEFAULT_DESCRIPTOR_LENGTH: usize = GRID_POINTS * GRADIENT_ORIENTATIONS;

/// Pixel offset of a grid point relative to the described pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PetalOffset {
    pub y: i8,
    pub x: i8,
}

const fn p(y: i8, x: i8) -> PetalOffset {
    PetalOffset { y, x }
}

/// Index 0 is the centre, index `1 + ring * 8 + petal` the given petal.
pub static DAISY_GRID: [PetalOffset; GRID_POINTS] = [
    p(0, 0),
    // radius 5
    p(0, 5),
    p(4, 4),
    p(5, 0),
    p(4, -4),
    p(0, -5),
    p(-4, -4),
    p(-5, 0),
    p(-4, 4),
    // radius 10
    p(0, 10),
    p(7, 7),
    p(10, 0),
    p(7, -7),
    p(0, -10),
    p(-7, -7),
    p(-10, 0),
    p(-7, 7),
    // radius 15
    p(0, 15),
    p(11, 11),
    p(15, 0),
    p(11, -11),
    p(0, -15),
    p(-11, -11),
    p(-15, 0),
    p(-11, 11),
];

/// Grid index of petal `petal` on ring `ring`.
pub const fn point_index(ring: usize, petal: usize) -> usize {
    1 + ring * PETALS_PER_RING + petal
}

/// Ring and petal number of a grid index, `None` for the centre point.
pub fn ring_and_petal(index: usize) -> Option<(usize, usize)> {
    if index == 0 || index >= GRID_POINTS {
        return None;
    }
    Some(((index - 1) / PETALS_PER_RING, (index - 1) % PETALS_PER_RING))
}

/// The eight petals of `ring`.
pub fn ring_points(ring: usize) -> &'static [PetalOffset] {
    let start = point_index(ring, 0);
    &DAISY_GRID[start..start + PETALS_PER_RING]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_agrees_with_rounded_trigonometry() {
        for (ring, &radius) in RING_RADII.iter().enumerate() {
            for petal in 0..PETALS_PER_RING {
                let angle = std::f64::consts::PI * petal as f64 / 4.0;
                let round2 = |v: f64| (v * 100.0).round() / 100.0;
                let y = round2(angle.sin() * radius as f64).round() as i8;
                let x = round2(angle.cos() * radius as f64).round() as i8;
                assert_eq!(DAISY_GRID[point_index(ring, petal)], p(y, x), "ring {ring} petal {petal}");
            }
        }
        assert_eq!(DAISY_GRID[0], p(0, 0));
    }

    #[test]
    fn descriptor_length_is_two_hundred() {
        assert_eq!(DEFAULT_DESCRIPTOR_LENGTH, 200);
    }

    #[test]
    fn index_helpers_invert_each_other() {
        for ring in 0..RING_COUNT {
            for petal in 0..PETALS_PER_RING {
                assert_eq!(ring_and_petal(point_index(ring, petal)), Some((ring, petal)));
            }
        }
        assert_eq!(ring_and_petal(0), None);
        assert_eq!(ring_and_petal(GRID_POINTS), None);
        assert_eq!(ring_points(2)[1], p(11, 11));
    }
}
