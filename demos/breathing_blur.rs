//! Renders one breathing cycle on the CPU host and writes each frame as a PNG.
//!
//! ```text
//! RUST_LOG=blurpass=debug cargo run --example breathing_blur -- [output_dir] [--optimized]
//! ```
use std::path::PathBuf;

use blurpass::{BlurConfig, BlurDriver, CpuHost, GeneratorMode, ManualClock};
use blurpass_test_scenes::build_breathing_scene;

const FRAMES: u32 = 24;

pub fn main() {
    env_logger::init();

    let mut output_dir = PathBuf::from("target/breathing_blur");
    let mut mode = GeneratorMode::Naive;
    for arg in std::env::args().skip(1) {
        if arg == "--optimized" {
            mode = GeneratorMode::Optimized;
        } else {
            output_dir = PathBuf::from(arg);
        }
    }
    std::fs::create_dir_all(&output_dir).expect("To create the output directory");

    let (scene, _) = build_breathing_scene();
    let (width, height) = (scene.width(), scene.height());

    let config = BlurConfig::default().with_mode(mode);
    let period = config.period;
    let clock = ManualClock::new();
    let mut driver = BlurDriver::with_clock(config, CpuHost::new(scene), clock.clone())
        .expect("To build the blur passes");

    let step = period / FRAMES;
    for frame in 0..=FRAMES {
        let report = driver.tick();
        let pixels = driver
            .host()
            .frame()
            .expect("A visible frame while blurring")
            .to_rgba8();

        let path = output_dir.join(format!("frame_{frame:02}.png"));
        image::RgbaImage::from_raw(width, height, pixels)
            .expect("Frame size to match the scene")
            .save(&path)
            .expect("To write the frame");

        println!(
            "{}: strength {:.3}, radius {}",
            path.display(),
            report.strength,
            report.radius_index
        );
        clock.advance(step);
    }

    // Space toggles the effect in an interactive host; here the last frame is
    // the sharp scene.
    driver.toggle();
    driver.tick();
    let path = output_dir.join("idle.png");
    let pixels = driver
        .host()
        .frame()
        .expect("The scene while idle")
        .to_rgba8();
    image::RgbaImage::from_raw(width, height, pixels)
        .expect("Frame size to match the scene")
        .save(&path)
        .expect("To write the frame");
    println!("{}: idle", path.display());
}
