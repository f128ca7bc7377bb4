//! Breathing two-pass Gaussian blur.
//!
//! The crate generates blur shaders for every integer radius up to a
//! maximum, binds each to a horizontal and a vertical pass on a host engine,
//! and drives one pair per frame with a strength that oscillates between
//! zero and full blur.
//!
//! ```no_run
//! use blurpass::{BlurConfig, BlurDriver, CpuHost, GeneratorMode, RgbaImage};
//!
//! let scene = RgbaImage::new(320, 240);
//! let config = BlurConfig::default().with_mode(GeneratorMode::Optimized);
//! let mut driver = BlurDriver::new(config, CpuHost::new(scene))?;
//!
//! let report = driver.tick();
//! println!("blurring at radius {}", report.radius_index);
//! # Ok::<(), blurpass::BlurError>(())
//! ```

pub use wgpu;

mod bank;
mod cache;
mod clock;
mod config;
mod cpu;
mod driver;
mod error;
mod gpu;
mod host;
mod id;
mod kernel;
pub mod shader;
mod taps;

pub use bank::{Axis, BlurPass, InputSource, PassBank, PassId, PassPair};
pub use cache::ShaderCache;
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{BlurConfig, GeneratorMode, ShaderDialect, MAX_SUPPORTED_RADIUS};
pub use cpu::{CpuHost, RgbaImage};
pub use driver::{blur_strength, radius_index, BlurDriver, BlurMode, FrameReport};
pub use error::BlurError;
pub use gpu::{WgpuHost, TARGET_FORMAT};
pub use host::{PassHost, Viewport};
pub use kernel::{KernelSpec, WeightTable};
pub use shader::{generate, ShaderPair, TapLayout};
pub use taps::{required_tap_count, OptimizedTapSet, Tap, MAX_VARYING_TAPS};
