pub mod expectations;
pub mod scene;

pub use expectations::{check_pixels, PixelExpectation};
pub use scene::{
    bright_dot, build_breathing_scene, checkerboard, horizontal_gradient, peak_blur_expectations,
    CANVAS_HEIGHT, CANVAS_WIDTH,
};
