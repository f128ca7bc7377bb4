//! Precomputed pass pairs, one per integer blur radius.
//!
//! Passes live in a flat arena. The horizontal pass for radius `r` sits at
//! index `2r` and reads the scene; the vertical pass sits at `2r + 1` and
//! reads the horizontal pass's output. The dependency is an explicit
//! [`InputSource`] rather than a parent/child relationship, so the arena owns
//! every pass and nothing points back into it.

use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::cache::ShaderCache;
use crate::config::BlurConfig;
use crate::error::BlurError;
use crate::host::{PassHost, Viewport};
use crate::kernel::KernelSpec;
use crate::shader::ShaderPair;

pub use crate::id::PassId;

/// Direction a pass blurs along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    /// Texel step along this axis for the given viewport.
    pub fn texel_offset(&self, viewport: Viewport) -> [f32; 2] {
        let [texel_width, texel_height] = viewport.texel_size();
        match self {
            Axis::Horizontal => [texel_width, 0.0],
            Axis::Vertical => [0.0, texel_height],
        }
    }
}

/// What a pass samples from when drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    /// The unblurred scene.
    Scene,
    /// The output of another pass in the same bank.
    Pass(PassId),
}

#[derive(Debug, Clone)]
pub struct BlurPass {
    id: PassId,
    radius: u32,
    axis: Axis,
    input: InputSource,
    shaders: Arc<ShaderPair>,
    texel_offset: [f32; 2],
    visible: bool,
}

impl BlurPass {
    pub fn id(&self) -> PassId {
        self.id
    }

    pub fn radius(&self) -> u32 {
        self.radius
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn input(&self) -> InputSource {
        self.input
    }

    pub fn shaders(&self) -> &Arc<ShaderPair> {
        &self.shaders
    }

    /// Whether the bound shaders read the texel offset uniform. Pass-through
    /// shaders do not, and their passes never have it set.
    pub fn uses_texel_offset(&self) -> bool {
        self.shaders.uses_texel_offset()
    }

    /// Last texel offset set on this pass.
    pub fn texel_offset(&self) -> [f32; 2] {
        self.texel_offset
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

/// The two passes that blur one radius: horizontal first, then vertical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassPair {
    pub horizontal: PassId,
    pub vertical: PassId,
}

pub struct PassBank {
    passes: Vec<BlurPass>,
    max_radius: u32,
}

impl PassBank {
    /// Generates shaders for every radius in `0..=config.max_radius` and asks
    /// the host to prepare a hidden pass for each half of every pair.
    pub fn build<H: PassHost + ?Sized>(
        config: &BlurConfig,
        cache: &mut ShaderCache,
        host: &mut H,
    ) -> Result<Self, BlurError> {
        config.validate()?;

        let pair_count = config.max_radius as usize + 1;
        let mut passes = Vec::with_capacity(2 * pair_count);

        for radius in 0..=config.max_radius {
            let shaders = cache.get_or_generate(
                KernelSpec::new(radius, config.sigma),
                config.mode,
                config.dialect,
            );
            shaders.check_stages()?;

            let horizontal = PassId(passes.len());
            passes.push(BlurPass {
                id: horizontal,
                radius,
                axis: Axis::Horizontal,
                input: InputSource::Scene,
                shaders: Arc::clone(&shaders),
                texel_offset: [0.0, 0.0],
                visible: false,
            });
            passes.push(BlurPass {
                id: PassId(passes.len()),
                radius,
                axis: Axis::Vertical,
                input: InputSource::Pass(horizontal),
                shaders,
                texel_offset: [0.0, 0.0],
                visible: false,
            });
        }

        for pass in &passes {
            host.prepare_pass(pass)?;
            host.set_pass_visible(pass.id, false);
        }

        tracing::debug!(
            max_radius = config.max_radius,
            sigma = config.sigma,
            mode = ?config.mode,
            passes = passes.len(),
            "built blur pass bank"
        );

        Ok(Self {
            passes,
            max_radius: config.max_radius,
        })
    }

    /// Builds a bank with a cache sized from the config.
    pub fn build_uncached<H: PassHost + ?Sized>(
        config: &BlurConfig,
        host: &mut H,
    ) -> Result<Self, BlurError> {
        let capacity =
            NonZeroUsize::new(config.cache_capacity).ok_or(BlurError::ZeroCacheCapacity)?;
        let mut cache = ShaderCache::new(capacity);
        Self::build(config, &mut cache, host)
    }

    /// The pass pair for `radius`.
    ///
    /// # Panics
    ///
    /// Panics if `radius` exceeds [`PassBank::max_radius`]; callers derive the
    /// radius from a strength in `[0, 1]`, so an out-of-range value is a bug.
    pub fn select(&self, radius: u32) -> PassPair {
        assert!(
            radius <= self.max_radius,
            "blur radius {radius} is outside the bank's range 0..={}",
            self.max_radius
        );
        let horizontal = 2 * radius as usize;
        PassPair {
            horizontal: PassId(horizontal),
            vertical: PassId(horizontal + 1),
        }
    }

    pub fn get(&self, id: PassId) -> &BlurPass {
        &self.passes[id.0]
    }

    pub fn get_mut(&mut self, id: PassId) -> &mut BlurPass {
        &mut self.passes[id.0]
    }

    pub fn set_texel_offset(&mut self, id: PassId, offset: [f32; 2]) {
        self.passes[id.0].texel_offset = offset;
    }

    pub fn set_visible(&mut self, id: PassId, visible: bool) {
        self.passes[id.0].visible = visible;
    }

    pub fn iter(&self) -> impl Iterator<Item = &BlurPass> {
        self.passes.iter()
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    pub fn max_radius(&self) -> u32 {
        self.max_radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorMode;

    #[derive(Default)]
    struct PreparedPasses {
        prepared: Vec<PassId>,
        hidden: Vec<PassId>,
    }

    impl PassHost for PreparedPasses {
        fn prepare_pass(&mut self, pass: &BlurPass) -> Result<(), BlurError> {
            self.prepared.push(pass.id());
            Ok(())
        }

        fn set_uniform_vec2(&mut self, _pass: PassId, _name: &str, _value: [f32; 2]) {}

        fn set_pass_visible(&mut self, pass: PassId, visible: bool) {
            if !visible {
                self.hidden.push(pass);
            }
        }

        fn set_scene_visible(&mut self, _visible: bool) {}

        fn draw_pass(&mut self, _pass: &BlurPass) {}

        fn viewport(&self) -> Viewport {
            Viewport::new(100.0, 50.0)
        }
    }

    fn bank(config: &BlurConfig) -> (PassBank, PreparedPasses) {
        let mut host = PreparedPasses::default();
        let bank = PassBank::build_uncached(config, &mut host).unwrap();
        (bank, host)
    }

    #[test]
    fn one_pair_per_radius_including_zero() {
        let (bank, host) = bank(&BlurConfig::default());
        assert_eq!(bank.len(), 22);
        assert_eq!(host.prepared.len(), 22);
        assert_eq!(host.hidden.len(), 22);
        assert!(bank.iter().all(|pass| !pass.is_visible()));
    }

    #[test]
    fn vertical_pass_reads_its_horizontal_partner() {
        let (bank, _) = bank(&BlurConfig::default());
        for radius in 0..=bank.max_radius() {
            let pair = bank.select(radius);
            let horizontal = bank.get(pair.horizontal);
            let vertical = bank.get(pair.vertical);
            assert_eq!(horizontal.radius(), radius);
            assert_eq!(horizontal.axis(), Axis::Horizontal);
            assert_eq!(horizontal.input(), InputSource::Scene);
            assert_eq!(vertical.axis(), Axis::Vertical);
            assert_eq!(vertical.input(), InputSource::Pass(pair.horizontal));
            assert!(Arc::ptr_eq(horizontal.shaders(), vertical.shaders()));
        }
    }

    #[test]
    fn radius_zero_is_pass_through() {
        let (bank, _) = bank(&BlurConfig::default().with_mode(GeneratorMode::Optimized));
        let pair = bank.select(0);
        assert!(!bank.get(pair.horizontal).uses_texel_offset());
        assert!(bank.get(bank.select(1).horizontal).uses_texel_offset());
    }

    #[test]
    #[should_panic(expected = "outside the bank's range")]
    fn selecting_past_max_radius_panics() {
        let (bank, _) = bank(&BlurConfig::default().with_max_radius(3));
        bank.select(4);
    }

    #[test]
    fn invalid_config_builds_nothing() {
        let mut host = PreparedPasses::default();
        let config = BlurConfig::default().with_max_radius(1000);
        assert!(PassBank::build_uncached(&config, &mut host).is_err());
        assert!(host.prepared.is_empty());
    }

    #[test]
    fn axis_offsets_follow_the_viewport() {
        let viewport = Viewport::new(200.0, 100.0);
        assert_eq!(Axis::Horizontal.texel_offset(viewport), [0.005, 0.0]);
        assert_eq!(Axis::Vertical.texel_offset(viewport), [0.0, 0.01]);
    }
}
