//! Per-frame driving of the blur pass bank.
//!
//! The driver is either `Idle` (the scene is shown as is) or `Blurring`
//! (the scene is hidden and the two-pass composite is shown). While blurring,
//! each frame maps elapsed time to a strength on a triangle wave, picks the
//! pass pair for the matching radius and chains horizontal → vertical.
//!
//! Nothing here generates shader text or allocates: all of that happens when
//! the bank is built.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use crate::bank::{PassBank, PassPair};
use crate::cache::ShaderCache;
use crate::clock::{Clock, MonotonicClock};
use crate::config::BlurConfig;
use crate::error::BlurError;
use crate::host::PassHost;
use crate::shader::TEXEL_OFFSET_UNIFORM;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlurMode {
    Idle,
    Blurring,
}

/// What the driver did for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub mode: BlurMode,
    /// Blur strength in `[0, 1]`; zero while idle.
    pub strength: f64,
    pub radius_index: u32,
    /// The pair that was drawn, `None` while idle.
    pub passes: Option<PassPair>,
}

impl FrameReport {
    fn idle() -> Self {
        Self {
            mode: BlurMode::Idle,
            strength: 0.0,
            radius_index: 0,
            passes: None,
        }
    }
}

/// Strength at `elapsed`: a triangle wave rising from 0 to 1 over the first
/// half of `period` and falling back to 0 over the second half.
pub fn blur_strength(elapsed: Duration, period: Duration) -> f64 {
    if period.is_zero() {
        return 0.0;
    }

    let phase = (elapsed.as_secs_f64() / period.as_secs_f64()).fract();
    let raw = phase * 2.0;
    if raw > 1.0 {
        2.0 - raw
    } else {
        raw
    }
}

/// Rounds `strength * max_radius` to the nearest radius, halves rounding up.
pub fn radius_index(strength: f64, max_radius: u32) -> u32 {
    let strength = strength.clamp(0.0, 1.0);
    let index = (strength * max_radius as f64 + 0.5).floor() as u32;
    index.min(max_radius)
}

pub struct BlurDriver<H: PassHost, C: Clock = MonotonicClock> {
    config: BlurConfig,
    host: H,
    bank: PassBank,
    cache: ShaderCache,
    clock: C,
    start: Instant,
    mode: BlurMode,
    shown: Option<PassPair>,
}

impl<H: PassHost> BlurDriver<H, MonotonicClock> {
    pub fn new(config: BlurConfig, host: H) -> Result<Self, BlurError> {
        Self::with_clock(config, host, MonotonicClock)
    }
}

impl<H: PassHost, C: Clock> BlurDriver<H, C> {
    /// Validates `config`, builds the pass bank on `host` and starts the
    /// animation clock.
    pub fn with_clock(config: BlurConfig, mut host: H, clock: C) -> Result<Self, BlurError> {
        config.validate()?;

        let capacity =
            NonZeroUsize::new(config.cache_capacity).ok_or(BlurError::ZeroCacheCapacity)?;
        let mut cache = ShaderCache::new(capacity);
        let bank = PassBank::build(&config, &mut cache, &mut host)?;

        let mode = if config.start_enabled {
            BlurMode::Blurring
        } else {
            BlurMode::Idle
        };
        host.set_scene_visible(mode == BlurMode::Idle);

        let start = clock.now();

        Ok(Self {
            config,
            host,
            bank,
            cache,
            clock,
            start,
            mode,
            shown: None,
        })
    }

    /// Renders the frame for the clock's current time.
    pub fn tick(&mut self) -> FrameReport {
        let elapsed = self.clock.now().saturating_duration_since(self.start);
        self.render_elapsed(elapsed)
    }

    /// Renders the frame for `elapsed` time since the driver started.
    pub fn render_elapsed(&mut self, elapsed: Duration) -> FrameReport {
        self.hide_output();
        self.host.set_scene_visible(self.mode == BlurMode::Idle);

        if self.mode == BlurMode::Idle {
            return FrameReport::idle();
        }

        let strength = blur_strength(elapsed, self.config.period);
        let radius_index = radius_index(strength, self.bank.max_radius());
        let pair = self.bank.select(radius_index);

        if radius_index > 0 {
            let viewport = self.host.viewport();
            for id in [pair.horizontal, pair.vertical] {
                let pass = self.bank.get(id);
                if !pass.uses_texel_offset() {
                    continue;
                }
                let offset = pass.axis().texel_offset(viewport);
                self.host.set_uniform_vec2(id, TEXEL_OFFSET_UNIFORM, offset);
                self.bank.set_texel_offset(id, offset);
            }
        }

        self.host.set_scene_visible(true);
        self.host.draw_pass(self.bank.get(pair.horizontal));
        self.host.set_scene_visible(false);

        self.host.draw_pass(self.bank.get(pair.vertical));
        self.set_pass_visible(pair.vertical, true);
        self.shown = Some(pair);

        tracing::trace!(
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            period_ms = self.config.period_ms(),
            strength,
            radius_index,
            "blurred frame"
        );

        FrameReport {
            mode: BlurMode::Blurring,
            strength,
            radius_index,
            passes: Some(pair),
        }
    }

    /// Switches between `Idle` and `Blurring`, returning the new mode.
    pub fn toggle(&mut self) -> BlurMode {
        let next = match self.mode {
            BlurMode::Idle => BlurMode::Blurring,
            BlurMode::Blurring => BlurMode::Idle,
        };
        self.set_mode(next);
        next
    }

    /// Applies the visibility change right away; the next frame draws
    /// according to the new mode.
    pub fn set_mode(&mut self, mode: BlurMode) {
        if mode == self.mode {
            return;
        }
        self.mode = mode;

        match mode {
            BlurMode::Idle => {
                self.hide_output();
                self.host.set_scene_visible(true);
            }
            BlurMode::Blurring => self.host.set_scene_visible(false),
        }

        tracing::debug!(?mode, "blur mode changed");
    }

    pub fn mode(&self) -> BlurMode {
        self.mode
    }

    pub fn config(&self) -> &BlurConfig {
        &self.config
    }

    pub fn bank(&self) -> &PassBank {
        &self.bank
    }

    pub fn cache(&self) -> &ShaderCache {
        &self.cache
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// The pair whose output is currently visible, if any.
    pub fn shown(&self) -> Option<PassPair> {
        self.shown
    }

    pub fn into_host(self) -> H {
        self.host
    }

    fn hide_output(&mut self) {
        if let Some(pair) = self.shown.take() {
            self.set_pass_visible(pair.vertical, false);
        }
    }

    fn set_pass_visible(&mut self, id: crate::bank::PassId, visible: bool) {
        self.bank.set_visible(id, visible);
        self.host.set_pass_visible(id, visible);
    }
}
