/// Properties of the generated shader text across radii, modes and dialects.
use blurpass::shader::inspect;
use blurpass::{generate, GeneratorMode, KernelSpec, ShaderDialect, MAX_VARYING_TAPS};

const MODES: [GeneratorMode; 2] = [GeneratorMode::Naive, GeneratorMode::Optimized];
const DIALECTS: [ShaderDialect; 2] = [ShaderDialect::Glsl, ShaderDialect::Wgsl];

#[test]
fn naive_shaders_fetch_every_discrete_tap() {
    for radius in 1..=16 {
        for dialect in DIALECTS {
            let pair = generate(KernelSpec::new(radius, 5.0), GeneratorMode::Naive, dialect);
            let taps = 2 * radius as usize + 1;
            assert_eq!(inspect::declared_coordinates(pair.vertex()), Some(taps));
            assert_eq!(inspect::texture_fetches(pair.fragment()), taps);
            assert_eq!(inspect::inline_fetches(pair.fragment()), 0);
        }
    }
}

#[test]
fn optimized_shaders_cap_interpolated_coordinates() {
    for radius in 1..=40 {
        for dialect in DIALECTS {
            let pair = generate(KernelSpec::new(radius, 6.0), GeneratorMode::Optimized, dialect);
            let required = (radius / 2 + radius % 2) as usize;
            let varying = required.min(MAX_VARYING_TAPS);

            assert_eq!(
                inspect::declared_coordinates(pair.vertex()),
                Some(1 + 2 * varying),
                "radius {radius}"
            );
            assert_eq!(inspect::texture_fetches(pair.fragment()), 1 + 2 * required);
            assert_eq!(
                inspect::inline_fetches(pair.fragment()),
                2 * (required - varying)
            );
            assert_eq!(
                inspect::references_texel_offset(pair.fragment()),
                required > varying
            );
        }
    }
}

#[test]
fn degenerate_kernels_never_reference_the_uniform() {
    let kernels = [
        KernelSpec::new(0, 5.0),
        KernelSpec::new(8, 0.0),
        KernelSpec::new(8, -1.0),
    ];
    for kernel in kernels {
        for mode in MODES {
            for dialect in DIALECTS {
                let pair = generate(kernel, mode, dialect);
                assert!(!inspect::references_texel_offset(pair.vertex()));
                assert!(!inspect::references_texel_offset(pair.fragment()));
                assert_eq!(inspect::declared_coordinates(pair.vertex()), Some(1));
                assert_eq!(inspect::texture_fetches(pair.fragment()), 1);
            }
        }
    }
}

#[test]
fn glsl_keeps_the_host_engine_names() {
    let pair = generate(
        KernelSpec::new(3, 2.0),
        GeneratorMode::Naive,
        ShaderDialect::Glsl,
    );
    let vertex = pair.vertex();
    assert!(vertex.starts_with("attribute vec4 a_position;\nattribute vec4 a_texCoord;\n"));
    assert!(vertex.contains("  gl_Position = CC_MVPMatrix * a_position;\n"));
    assert!(vertex.contains("  blurCoordinates[0] = a_texCoord.xy - u_texelOffset * 3.0;\n"));
    assert!(vertex.contains("  blurCoordinates[6] = a_texCoord.xy + u_texelOffset * 3.0;\n"));

    let fragment = pair.fragment();
    assert!(fragment.starts_with("#ifdef GL_ES\nprecision mediump float;\n#endif\n"));
    assert!(fragment.contains("  gl_FragColor = vec4(0.0);\n"));
    assert!(fragment.contains("texture2D(CC_Texture0, blurCoordinates[3])"));
}

#[test]
fn weights_in_text_sum_to_one() {
    let literal = regex::Regex::new(r"\) \* ([0-9.e+-]+);").unwrap();
    for mode in MODES {
        for dialect in DIALECTS {
            let pair = generate(KernelSpec::new(12, 4.0), mode, dialect);
            let total: f64 = literal
                .captures_iter(pair.fragment())
                .map(|c| c[1].parse::<f64>().unwrap())
                .sum();
            assert!((total - 1.0).abs() < 1e-4, "{mode:?} {dialect:?}: {total}");
        }
    }
}

#[test]
fn float_literals_always_carry_a_decimal_point() {
    let bare_integer = regex::Regex::new(r"u_texelOffset \* \d+;").unwrap();
    for radius in 1..=12 {
        for mode in MODES {
            for dialect in DIALECTS {
                let pair = generate(KernelSpec::new(radius, 5.0), mode, dialect);
                assert!(!bare_integer.is_match(pair.vertex()));
                assert!(!bare_integer.is_match(pair.fragment()));
            }
        }
    }
}
