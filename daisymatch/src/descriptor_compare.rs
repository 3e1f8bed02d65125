use crate::descriptor_field::read_descriptor_at;
use crate::distance::l1_distance;
use crate::error::Result;
use log::*;
use std::fmt;
use std::path::Path;

/// Scale applied to reference descriptors stored in the unit range.
pub const DEFAULT_REFERENCE_SCALE: f32 = 255.0;

/// The descriptors of one pixel read from two descriptor files.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptorComparison {
    pub y: usize,
    pub x: usize,
    /// Pixel index `y * width + x` in the descriptor files.
    pub element_index: usize,
    pub candidate: Vec<f32>,
    /// Reference values, already multiplied by the reference scale.
    pub reference: Vec<f32>,
    pub l1: f32,
    pub max_abs: f32,
}

/// Reads the descriptor of pixel `(y, x)` from a candidate file (e.g. computed on the GPU)
/// and from a reference file, scaling the reference by `reference_scale`.
pub fn compare_at(
    candidate_path: impl AsRef<Path>,
    reference_path: impl AsRef<Path>,
    image_width: usize,
    y: usize,
    x: usize,
    descriptor_length: usize,
    reference_scale: f32,
) -> Result<DescriptorComparison> {
    let candidate = read_descriptor_at(&candidate_path, image_width, y, x, descriptor_length)?;
    let reference: Vec<f32> =
        read_descriptor_at(&reference_path, image_width, y, x, descriptor_length)?
            .into_iter()
            .map(|v| v * reference_scale)
            .collect();

    let max_abs = candidate
        .iter()
        .zip(&reference)
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, f32::max);
    let comparison = DescriptorComparison {
        y,
        x,
        element_index: y * image_width + x,
        l1: l1_distance(&candidate, &reference),
        max_abs,
        candidate,
        reference,
    };
    debug!(
        "Pixel ({y}, {x}): L1 {} max abs difference {}",
        comparison.l1, comparison.max_abs
    );
    Ok(comparison)
}

impl fmt::Display for DescriptorComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "reference {:?}", self.reference)?;
        writeln!(f, "candidate {:?}", self.candidate)?;
        writeln!(f, "L1 distance {} (max element difference {})", self.l1, self.max_abs)?;
        write!(f, "Element at {}", self.element_index)
    }
}
