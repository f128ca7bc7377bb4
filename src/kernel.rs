//! Discrete Gaussian weights for one blur strength level.

use std::f64::consts::PI;

/// Radius and standard deviation of one separable Gaussian kernel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KernelSpec {
    radius: u32,
    sigma: f32,
}

impl KernelSpec {
    pub fn new(radius: u32, sigma: f32) -> Self {
        Self { radius, sigma }
    }

    pub fn radius(&self) -> u32 {
        self.radius
    }

    pub fn sigma(&self) -> f32 {
        self.sigma
    }

    /// A kernel with no taps beyond the center, or with no spread, blurs nothing.
    /// NaN sigma falls in here as well.
    pub fn is_degenerate(&self) -> bool {
        self.radius < 1 || !(self.sigma > 0.0)
    }

    /// Normalized weights for offsets `0..=radius`, or `None` for a degenerate
    /// kernel, in which case the caller must fall back to a pass-through copy.
    pub fn weights(&self) -> Option<WeightTable> {
        if self.is_degenerate() {
            return None;
        }

        let sigma = self.sigma as f64;
        let variance = sigma * sigma;
        let scale = 1.0 / (2.0 * PI * variance).sqrt();

        let raw: Vec<f64> = (0..=self.radius)
            .map(|i| {
                let offset = i as f64;
                scale * (-(offset * offset) / (2.0 * variance)).exp()
            })
            .collect();

        let sum = raw[0] + 2.0 * raw[1..].iter().sum::<f64>();

        Some(WeightTable {
            weights: raw.iter().map(|w| (w / sum) as f32).collect(),
        })
    }
}

/// `weights[k]` is the weight applied at offsets `+k` and `-k`; `weights[0]`
/// is the center.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightTable {
    weights: Vec<f32>,
}

impl WeightTable {
    pub fn radius(&self) -> u32 {
        (self.weights.len() - 1) as u32
    }

    pub fn center(&self) -> f32 {
        self.weights[0]
    }

    /// Weight at `offset`, or zero past the kernel's edge.
    pub fn get(&self, offset: usize) -> f32 {
        self.weights.get(offset).copied().unwrap_or(0.0)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.weights
    }

    /// `weights[0] + 2 * sum(weights[1..])`, which is 1 for a normalized table.
    pub fn total(&self) -> f64 {
        let center = self.weights[0] as f64;
        let sides: f64 = self.weights[1..].iter().map(|&w| w as f64).sum();
        center + 2.0 * sides
    }
}
