//! A reference [`PassHost`] that runs pass layouts on the CPU.
//!
//! Each pass is evaluated from its [`TapLayout`] rather than from shader
//! text: every fetch samples the input with bilinear filtering and
//! clamp-to-edge addressing, which is what a GPU does with a linear sampler.
//! Output is deterministic, so tests can compare frames exactly.

use std::sync::Arc;

use ahash::{HashMap, HashMapExt};

use crate::bank::{BlurPass, InputSource, PassId};
use crate::error::BlurError;
use crate::host::{PassHost, Viewport};
use crate::shader::{ShaderPair, TapLayout, TEXEL_OFFSET_UNIFORM};

/// Fractions closer than this to a texel center sample that texel exactly.
/// Texel offsets round-trip through normalized coordinates and come back a
/// few ulps off.
const TEXEL_SNAP: f32 = 1e-4;

/// Linear RGBA image with `f32` channels in `[0, 1]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RgbaImage {
    width: u32,
    height: u32,
    pixels: Vec<[f32; 4]>,
}

impl RgbaImage {
    /// A transparent black image.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0.0; 4]; width as usize * height as usize],
        }
    }

    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> [f32; 4]) -> Self {
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Decodes tightly packed RGBA8 rows.
    pub fn from_rgba8(width: u32, height: u32, bytes: &[u8]) -> Result<Self, BlurError> {
        let expected = width as usize * height as usize * 4;
        if bytes.len() != expected {
            return Err(BlurError::SceneSizeMismatch {
                expected,
                actual: bytes.len(),
            });
        }

        let pixels = bytes
            .chunks_exact(4)
            .map(|px| {
                [
                    px[0] as f32 / 255.0,
                    px[1] as f32 / 255.0,
                    px[2] as f32 / 255.0,
                    px[3] as f32 / 255.0,
                ]
            })
            .collect();

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|px| px.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8))
            .collect()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[[f32; 4]] {
        &self.pixels
    }

    pub fn get(&self, x: u32, y: u32) -> [f32; 4] {
        self.pixels[(y * self.width + x) as usize]
    }

    fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    fn reset(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels
            .resize(width as usize * height as usize, [0.0; 4]);
    }

    /// Samples at a position in texel space, where texel `(x, y)` has its
    /// center at `(x, y)`.
    fn sample(&self, x: f32, y: f32) -> [f32; 4] {
        let (x0, x1, tx) = filter_taps(x, self.width);
        let (y0, y1, ty) = filter_taps(y, self.height);

        let top = lerp(self.get(x0, y0), self.get(x1, y0), tx);
        let bottom = lerp(self.get(x0, y1), self.get(x1, y1), tx);
        lerp(top, bottom, ty)
    }
}

/// Lower texel, upper texel and blend factor along one axis, clamped to edge.
fn filter_taps(position: f32, extent: u32) -> (u32, u32, f32) {
    let last = extent - 1;
    let position = position.clamp(0.0, last as f32);
    let base = position.floor();
    let mut lower = base as u32;
    let mut fraction = position - base;

    if fraction < TEXEL_SNAP {
        fraction = 0.0;
    } else if fraction > 1.0 - TEXEL_SNAP {
        lower += 1;
        fraction = 0.0;
    }

    let lower = lower.min(last);
    (lower, (lower + 1).min(last), fraction)
}

fn lerp(a: [f32; 4], b: [f32; 4], t: f32) -> [f32; 4] {
    if t == 0.0 {
        return a;
    }
    std::array::from_fn(|i| a[i] + (b[i] - a[i]) * t)
}

/// Convolves `input` along the texel step `step` using `layout`'s fetches.
fn run_layout(input: &RgbaImage, layout: &TapLayout, step: [f32; 2], output: &mut RgbaImage) {
    output.reset(input.width, input.height);
    if input.is_empty() {
        return;
    }

    if layout.is_pass_through() {
        output.pixels.copy_from_slice(&input.pixels);
        return;
    }

    for y in 0..input.height {
        for x in 0..input.width {
            let mut sum = [0.0f32; 4];
            for fetch in layout.fetches() {
                let offset = layout.fetch_offset(fetch);
                let texel = input.sample(
                    x as f32 + offset * step[0],
                    y as f32 + offset * step[1],
                );
                for (acc, channel) in sum.iter_mut().zip(texel) {
                    *acc += channel * fetch.weight;
                }
            }
            output.pixels[(y * input.width + x) as usize] = sum;
        }
    }
}

struct CpuPass {
    shaders: Arc<ShaderPair>,
    texel_offset: [f32; 2],
    visible: bool,
    output: RgbaImage,
}

/// Runs blur passes against an in-memory scene.
pub struct CpuHost {
    scene: RgbaImage,
    scene_visible: bool,
    passes: HashMap<PassId, CpuPass>,
    draws: usize,
}

impl CpuHost {
    pub fn new(scene: RgbaImage) -> Self {
        Self {
            scene,
            scene_visible: true,
            passes: HashMap::new(),
            draws: 0,
        }
    }

    pub fn scene(&self) -> &RgbaImage {
        &self.scene
    }

    /// Replaces the scene. Pass outputs are left as they are until redrawn.
    pub fn set_scene(&mut self, scene: RgbaImage) {
        self.scene = scene;
    }

    pub fn is_scene_visible(&self) -> bool {
        self.scene_visible
    }

    /// Output of `pass` from its last draw.
    pub fn pass_output(&self, pass: PassId) -> Option<&RgbaImage> {
        self.passes.get(&pass).map(|p| &p.output)
    }

    pub fn is_pass_visible(&self, pass: PassId) -> bool {
        self.passes.get(&pass).is_some_and(|p| p.visible)
    }

    /// Number of passes drawn since the host was created.
    pub fn draw_count(&self) -> usize {
        self.draws
    }

    /// What is on screen: the scene when it is visible, otherwise the visible
    /// pass with the highest id, otherwise nothing.
    pub fn frame(&self) -> Option<&RgbaImage> {
        if self.scene_visible {
            return Some(&self.scene);
        }

        self.passes
            .iter()
            .filter(|(_, pass)| pass.visible)
            .max_by_key(|(id, _)| **id)
            .map(|(_, pass)| &pass.output)
    }
}

impl PassHost for CpuHost {
    fn prepare_pass(&mut self, pass: &BlurPass) -> Result<(), BlurError> {
        self.passes.insert(
            pass.id(),
            CpuPass {
                shaders: Arc::clone(pass.shaders()),
                texel_offset: [0.0, 0.0],
                visible: false,
                output: RgbaImage::new(self.scene.width, self.scene.height),
            },
        );
        Ok(())
    }

    fn set_uniform_vec2(&mut self, pass: PassId, name: &str, value: [f32; 2]) {
        if name != TEXEL_OFFSET_UNIFORM {
            tracing::warn!(%pass, name, "ignoring unknown uniform");
            return;
        }
        if let Some(target) = self.passes.get_mut(&pass) {
            target.texel_offset = value;
        }
    }

    fn set_pass_visible(&mut self, pass: PassId, visible: bool) {
        if let Some(target) = self.passes.get_mut(&pass) {
            target.visible = visible;
        }
    }

    fn set_scene_visible(&mut self, visible: bool) {
        self.scene_visible = visible;
    }

    fn draw_pass(&mut self, pass: &BlurPass) {
        let id = pass.id();
        let Some(target) = self.passes.get_mut(&id) else {
            tracing::warn!(pass = %id, "draw of unprepared pass skipped");
            return;
        };

        let mut output = std::mem::take(&mut target.output);
        let shaders = Arc::clone(&target.shaders);
        let step = [
            target.texel_offset[0] * self.scene.width as f32,
            target.texel_offset[1] * self.scene.height as f32,
        ];

        let input = match pass.input() {
            InputSource::Scene => Some(&self.scene),
            InputSource::Pass(source) => self.passes.get(&source).map(|p| &p.output),
        };

        match input {
            Some(input) => run_layout(input, shaders.layout(), step, &mut output),
            None => tracing::warn!(pass = %id, "pass input was never prepared"),
        }

        if let Some(target) = self.passes.get_mut(&id) {
            target.output = output;
        }
        self.draws += 1;
    }

    fn viewport(&self) -> Viewport {
        Viewport::new(self.scene.width as f32, self.scene.height as f32)
    }
}
