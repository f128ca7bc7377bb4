/// Headless wgpu runs of the blur passes.
///
/// Every test skips when no adapter is available, so the suite passes on CI
/// machines without a GPU.
///
/// Run with:   cargo test --test gpu_passes
use std::time::Duration;

use blurpass::{
    BlurConfig, BlurDriver, BlurError, CpuHost, GeneratorMode, ManualClock, PassBank, PassId,
    ShaderDialect, WgpuHost,
};
use blurpass_test_scenes::{
    build_breathing_scene, check_pixels, peak_blur_expectations, CANVAS_HEIGHT, CANVAS_WIDTH,
};
use futures::executor::block_on;

fn headless_host() -> Option<WgpuHost> {
    match block_on(WgpuHost::try_new_headless(CANVAS_WIDTH, CANVAS_HEIGHT)) {
        Ok(host) => Some(host),
        Err(BlurError::AdapterNotFound) => {
            eprintln!("no GPU adapter available, skipping");
            None
        }
        Err(e) => panic!("failed to create headless host: {e}"),
    }
}

fn wgsl_config() -> BlurConfig {
    BlurConfig::default()
        .with_dialect(ShaderDialect::Wgsl)
        .with_mode(GeneratorMode::Optimized)
}

fn assert_pixels(frame: &[u8], expectations: &[blurpass_test_scenes::PixelExpectation]) {
    let failures = check_pixels(frame, CANVAS_WIDTH, CANVAS_HEIGHT, expectations);
    if !failures.is_empty() {
        panic!(
            "{} pixel expectation(s) failed:\n{}",
            failures.len(),
            failures.join("\n"),
        );
    }
}

#[test]
fn pass_through_frame_reproduces_the_scene() {
    let Some(mut host) = headless_host() else {
        return;
    };
    let (scene, expectations) = build_breathing_scene();
    host.upload_scene(&scene.to_rgba8()).unwrap();

    let mut driver = BlurDriver::with_clock(wgsl_config(), host, ManualClock::new()).unwrap();
    assert_eq!(driver.render_elapsed(Duration::ZERO).radius_index, 0);

    let frame = driver.host_mut().read_frame().unwrap();
    let loose: Vec<_> = expectations
        .into_iter()
        .map(|e| e.with_tolerance(1))
        .collect();
    assert_pixels(&frame, &loose);
}

#[test]
fn peak_frame_matches_the_cpu_reference() {
    let Some(mut host) = headless_host() else {
        return;
    };
    let (scene, _) = build_breathing_scene();
    host.upload_scene(&scene.to_rgba8()).unwrap();

    let clock = ManualClock::new();
    let mut driver = BlurDriver::with_clock(wgsl_config(), host, clock.clone()).unwrap();
    let mut reference =
        BlurDriver::with_clock(wgsl_config(), CpuHost::new(scene), clock.clone()).unwrap();

    clock.advance(Duration::from_millis(1500));
    assert_eq!(driver.tick().radius_index, 10);
    reference.tick();

    let gpu_frame = driver.host_mut().read_frame().unwrap();
    assert_pixels(&gpu_frame, &peak_blur_expectations());

    let cpu_frame = reference.host().frame().unwrap().to_rgba8();
    let worst = gpu_frame
        .iter()
        .zip(&cpu_frame)
        .map(|(&g, &c)| (g as i16 - c as i16).abs())
        .max()
        .unwrap_or(0);
    assert!(worst <= 4, "GPU and CPU frames differ by up to {worst}");
}

#[test]
fn glsl_passes_are_rejected() {
    let Some(mut host) = headless_host() else {
        return;
    };
    let config = BlurConfig::default().with_max_radius(2);
    let result = PassBank::build_uncached(&config, &mut host);
    assert!(matches!(
        result,
        Err(BlurError::UnsupportedDialect {
            pass: PassId(0),
            dialect: ShaderDialect::Glsl,
        })
    ));
}

#[test]
fn naive_passes_beyond_the_varying_budget_are_rejected() {
    let Some(mut host) = headless_host() else {
        return;
    };
    let config = BlurConfig::default()
        .with_dialect(ShaderDialect::Wgsl)
        .with_max_radius(10);
    let result = PassBank::build_uncached(&config, &mut host);
    // Radius 8 is the first with more than 16 coordinates.
    assert!(matches!(
        result,
        Err(BlurError::TooManyVaryings {
            pass: PassId(16),
            coordinates: 17,
            limit: 16,
        })
    ));
}

#[test]
fn scene_upload_checks_its_size() {
    let Some(mut host) = headless_host() else {
        return;
    };
    assert!(matches!(
        host.upload_scene(&[0; 12]),
        Err(BlurError::SceneSizeMismatch { actual: 12, .. })
    ));
}
