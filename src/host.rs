//! The seam between the blur passes and whatever engine draws them.

use crate::bank::{BlurPass, PassId};
use crate::error::BlurError;

/// Size of the render target the passes draw into, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Size of one texel in normalized texture coordinates.
    pub fn texel_size(&self) -> [f32; 2] {
        [1.0 / self.width, 1.0 / self.height]
    }
}

/// Render-target operations a host engine provides to the blur driver.
///
/// Every method runs on the frame thread. Apart from [`PassHost::prepare_pass`],
/// which is called once per pass while the bank is built, none of them may
/// fail: the per-frame path has no recoverable errors.
pub trait PassHost {
    /// Binds the pass's shader pair to a new host-side render target.
    fn prepare_pass(&mut self, pass: &BlurPass) -> Result<(), BlurError>;

    fn set_uniform_vec2(&mut self, pass: PassId, name: &str, value: [f32; 2]);

    fn set_pass_visible(&mut self, pass: PassId, visible: bool);

    /// Shows or hides the unblurred scene.
    fn set_scene_visible(&mut self, visible: bool);

    /// Renders `pass` reading from `pass.input`.
    fn draw_pass(&mut self, pass: &BlurPass);

    fn viewport(&self) -> Viewport;
}
