use std::time::Duration;

use crate::error::BlurError;

/// Largest `max_radius` a bank may be built for.
pub const MAX_SUPPORTED_RADIUS: u32 = 64;

/// Coordinate count above which most hosts run out of interpolated varyings.
pub(crate) const VARYING_BUDGET: usize = 16;

/// Strategy used to derive taps from the Gaussian weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GeneratorMode {
    /// One texture fetch per discrete tap, `2 * radius + 1` in total.
    #[default]
    Naive,
    /// Adjacent taps merged into single bilinear fetches.
    Optimized,
}

/// Surface syntax of the generated shader text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShaderDialect {
    /// `attribute`/`varying` GLSL for hosts that inject `CC_MVPMatrix` and `CC_Texture0`.
    #[default]
    Glsl,
    /// WGSL consumed by [`crate::WgpuHost`].
    Wgsl,
}

/// Settings for one blur effect instance. Fixed for the lifetime of the driver.
#[derive(Debug, Clone, PartialEq)]
pub struct BlurConfig {
    /// Largest blur radius; the bank holds a pass pair for every radius in `0..=max_radius`.
    pub max_radius: u32,
    /// Standard deviation shared by every kernel in the bank.
    pub sigma: f32,
    pub mode: GeneratorMode,
    pub dialect: ShaderDialect,
    /// Duration of one full 0 → 1 → 0 strength cycle.
    pub period: Duration,
    /// Whether the driver starts in `Blurring` rather than `Idle`.
    pub start_enabled: bool,
    /// Number of shader pairs the generation cache keeps.
    pub cache_capacity: usize,
}

impl Default for BlurConfig {
    fn default() -> Self {
        Self {
            max_radius: 10,
            sigma: 5.0,
            mode: GeneratorMode::Naive,
            dialect: ShaderDialect::Glsl,
            period: Duration::from_millis(3000),
            start_enabled: true,
            cache_capacity: 64,
        }
    }
}

impl BlurConfig {
    pub fn with_max_radius(mut self, max_radius: u32) -> Self {
        self.max_radius = max_radius;
        self
    }

    pub fn with_sigma(mut self, sigma: f32) -> Self {
        self.sigma = sigma;
        self
    }

    pub fn with_mode(mut self, mode: GeneratorMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_dialect(mut self, dialect: ShaderDialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub fn with_start_enabled(mut self, start_enabled: bool) -> Self {
        self.start_enabled = start_enabled;
        self
    }

    pub fn with_cache_capacity(mut self, cache_capacity: usize) -> Self {
        self.cache_capacity = cache_capacity;
        self
    }

    /// Checks the settings before any shader is generated.
    ///
    /// A non-positive sigma is accepted: every kernel degenerates to a
    /// pass-through copy, which is a defined outcome rather than an error.
    pub fn validate(&self) -> Result<(), BlurError> {
        if self.max_radius > MAX_SUPPORTED_RADIUS {
            return Err(BlurError::RadiusTooLarge {
                requested: self.max_radius,
                limit: MAX_SUPPORTED_RADIUS,
            });
        }
        if !self.sigma.is_finite() {
            return Err(BlurError::NonFiniteSigma(self.sigma));
        }
        if self.period.is_zero() {
            return Err(BlurError::ZeroPeriod);
        }
        if self.cache_capacity == 0 {
            return Err(BlurError::ZeroCacheCapacity);
        }

        if self.sigma <= 0.0 {
            tracing::warn!(
                sigma = self.sigma,
                "non-positive sigma, every blur pass will be a pass-through copy"
            );
        }

        let naive_coordinates = 2 * self.max_radius as usize + 1;
        if self.mode == GeneratorMode::Naive && naive_coordinates > VARYING_BUDGET {
            tracing::warn!(
                max_radius = self.max_radius,
                coordinates = naive_coordinates,
                "naive shaders exceed {VARYING_BUDGET} varyings, some hosts will reject them"
            );
        }

        Ok(())
    }

    pub(crate) fn period_ms(&self) -> f64 {
        self.period.as_secs_f64() * 1000.0
    }
}
