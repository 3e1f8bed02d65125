use wide::f32x4;

/// Sum of absolute element-wise differences between two descriptors.
///
/// Four lanes are accumulated independently and reduced at the end, followed by the
/// remaining tail elements, so the result for a given pair is always the same.
#[inline]
pub fn l1_distance(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    let chunks_a = a.chunks_exact(4);
    let chunks_b = b.chunks_exact(4);
    let tail: f32 = chunks_a
        .remainder()
        .iter()
        .zip(chunks_b.remainder())
        .map(|(x, y)| (x - y).abs())
        .sum();
    chunks_a
        .zip(chunks_b)
        .map(|(ca, cb)| {
            f32x4::new([ca[0], ca[1], ca[2], ca[3]]) - f32x4::new([cb[0], cb[1], cb[2], cb[3]])
        })
        .fold(f32x4::splat(0.), |acc, d| acc + d.abs())
        .reduce_add()
        + tail
}
