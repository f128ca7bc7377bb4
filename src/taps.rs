//! Merging of adjacent Gaussian taps into single bilinear fetches.
//!
//! Sampling between texels `k` and `k + 1` at the weighted centroid of their
//! weights returns exactly `w[k] * t[k] + w[k + 1] * t[k + 1]` divided by the
//! merged weight, because bilinear filtering is itself linear. Each merged tap
//! therefore halves the fetch count for its pair.

use smallvec::SmallVec;

use crate::kernel::WeightTable;

/// Most merged taps that travel from the vertex stage as interpolated
/// coordinates. `1 + 2 * 7` coordinates stay within common varying limits.
pub const MAX_VARYING_TAPS: usize = 7;

/// One fetch at `offset` texels from the center, scaled by `weight`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tap {
    pub offset: f32,
    pub weight: f32,
}

/// Number of merged taps needed per side to cover `radius` standard taps.
pub fn required_tap_count(radius: u32) -> usize {
    (radius / 2 + radius % 2) as usize
}

/// Merged taps for one side of the kernel; mirrored at `-offset` by the shader.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizedTapSet {
    varying: SmallVec<[Tap; MAX_VARYING_TAPS]>,
    overflow: Vec<Tap>,
}

impl OptimizedTapSet {
    pub fn from_weights(table: &WeightTable) -> Self {
        let required = required_tap_count(table.radius());
        let varying_count = required.min(MAX_VARYING_TAPS);

        let varying = (0..varying_count)
            .map(|i| merge_pair(table, i))
            .collect();
        let overflow = (varying_count..required)
            .map(|i| merge_pair(table, i))
            .collect();

        Self { varying, overflow }
    }

    /// Taps passed as interpolated coordinates.
    pub fn varying(&self) -> &[Tap] {
        &self.varying
    }

    /// Taps past the varying cap, fetched with offsets computed in the fragment stage.
    pub fn overflow(&self) -> &[Tap] {
        &self.overflow
    }

    pub fn required(&self) -> usize {
        self.varying.len() + self.overflow.len()
    }

    pub fn has_overflow(&self) -> bool {
        !self.overflow.is_empty()
    }

    /// Sum of the weights of both mirrored sides.
    pub fn side_weight(&self) -> f64 {
        self.varying
            .iter()
            .chain(self.overflow.iter())
            .map(|tap| 2.0 * tap.weight as f64)
            .sum()
    }
}

/// Merges standard taps `2i + 1` and `2i + 2`. On an odd radius the last pair
/// has no second tap; its weight reads as zero and the merged tap lands on
/// the first one.
fn merge_pair(table: &WeightTable, i: usize) -> Tap {
    let first_offset = 2 * i + 1;
    let second_offset = first_offset + 1;
    let first = table.get(first_offset);
    let second = table.get(second_offset);

    // Also covers weights that underflowed to zero for a tiny sigma.
    if second <= 0.0 {
        return Tap {
            offset: first_offset as f32,
            weight: first,
        };
    }

    let weight = first + second;
    Tap {
        offset: (first * first_offset as f32 + second * second_offset as f32) / weight,
        weight,
    }
}
