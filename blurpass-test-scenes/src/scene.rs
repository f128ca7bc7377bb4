use blurpass::RgbaImage;

use crate::expectations::PixelExpectation;

pub const CANVAS_WIDTH: u32 = 64;
pub const CANVAS_HEIGHT: u32 = 48;

/// Columns `0..SOLID_COLUMNS` are solid red, the rest is a checkerboard.
const SOLID_COLUMNS: u32 = 24;

const RED: [f32; 4] = [1.0, 0.0, 0.0, 1.0];
const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
const BLACK: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Opaque black and white squares of `cell` pixels.
pub fn checkerboard(width: u32, height: u32, cell: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        if (x / cell + y / cell) % 2 == 0 {
            WHITE
        } else {
            BLACK
        }
    })
}

/// A single white pixel at `(x, y)` on opaque black.
pub fn bright_dot(width: u32, height: u32, x: u32, y: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |px, py| {
        if (px, py) == (x, y) {
            WHITE
        } else {
            BLACK
        }
    })
}

/// Black at the left edge to white at the right edge.
pub fn horizontal_gradient(width: u32, height: u32) -> RgbaImage {
    let last = width.saturating_sub(1).max(1) as f32;
    RgbaImage::from_fn(width, height, |x, _| {
        let level = x as f32 / last;
        [level, level, level, 1.0]
    })
}

/// Builds the scene the breathing tests and the demo share, with the
/// expectations that hold while it is shown unblurred.
///
/// The left of the canvas is solid red and the right is a one-pixel
/// checkerboard. The red area is wider than any radius the tests use, so its
/// interior survives every blur unchanged; the checkerboard averages to gray.
pub fn build_breathing_scene() -> (RgbaImage, Vec<PixelExpectation>) {
    let board = checkerboard(CANVAS_WIDTH, CANVAS_HEIGHT, 1);
    let scene = RgbaImage::from_fn(CANVAS_WIDTH, CANVAS_HEIGHT, |x, y| {
        if x < SOLID_COLUMNS {
            RED
        } else {
            board.get(x, y)
        }
    });

    let expectations = vec![
        PixelExpectation::opaque(5, 24, 255, 0, 0, "solid interior").exact(),
        PixelExpectation::opaque(44, 24, 255, 255, 255, "checker white").exact(),
        PixelExpectation::opaque(45, 24, 0, 0, 0, "checker black").exact(),
        PixelExpectation::opaque(SOLID_COLUMNS, 0, 255, 255, 255, "checker edge").exact(),
    ];

    (scene, expectations)
}

/// Expectations for [`build_breathing_scene`] blurred at `max_radius <= 10`.
pub fn peak_blur_expectations() -> Vec<PixelExpectation> {
    vec![
        PixelExpectation::opaque(5, 24, 255, 0, 0, "solid interior keeps its color"),
        PixelExpectation::opaque(44, 24, 128, 128, 128, "checker white turns gray")
            .with_tolerance(8),
        PixelExpectation::opaque(45, 24, 128, 128, 128, "checker black turns gray")
            .with_tolerance(8),
    ]
}
