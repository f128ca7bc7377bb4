//! WGSL for [`crate::WgpuHost`]: a fullscreen-triangle vertex stage and a
//! weighted-sum fragment stage sharing one varyings struct.
//!
//! Bindings:
//! - `@group(0) @binding(0)` input texture, `@group(0) @binding(1)` sampler
//! - `@group(1) @binding(0)` texel offset uniform, only in stages that use it

use super::layout::{Fetch, FetchSource, TapLayout};
use super::literal::{float_literal, offset_expression};
use super::TEXEL_OFFSET_UNIFORM;

pub const VERTEX_ENTRY_POINT: &str = "vs_main";
pub const FRAGMENT_ENTRY_POINT: &str = "fs_main";

fn coordinate_name(layout: &TapLayout, slot: usize) -> String {
    match layout {
        TapLayout::PassThrough => "texCoord".to_string(),
        TapLayout::Weighted { .. } => format!("blurCoordinates{slot}"),
    }
}

fn varyings_struct(layout: &TapLayout) -> String {
    let mut source = String::from("struct BlurVaryings {\n");
    source.push_str("    @builtin(position) position: vec4<f32>,\n");
    for slot in 0..layout.coordinate_count() {
        source.push_str(&format!(
            "    @location({slot}) {}: vec2<f32>,\n",
            coordinate_name(layout, slot)
        ));
    }
    source.push_str("};\n");
    source
}

fn texel_offset_binding() -> String {
    format!("@group(1) @binding(0) var<uniform> {TEXEL_OFFSET_UNIFORM}: vec2<f32>;\n")
}

pub(super) fn vertex_source(layout: &TapLayout) -> String {
    let mut source = varyings_struct(layout);
    source.push('\n');
    if layout.uses_texel_offset() {
        source.push_str(&texel_offset_binding());
        source.push('\n');
    }

    source.push_str("@vertex\n");
    source.push_str(&format!(
        "fn {VERTEX_ENTRY_POINT}(@builtin(vertex_index) vi: u32) -> BlurVaryings {{\n"
    ));
    // Fullscreen triangle: 3 vertices cover the whole target
    source.push_str("    let uv = vec2<f32>(f32((vi << 1u) & 2u), f32(vi & 2u));\n");
    source.push_str("    let tex_coord = vec2<f32>(uv.x, 1.0 - uv.y);\n");
    source.push_str("    var out: BlurVaryings;\n");
    source.push_str("    out.position = vec4<f32>(uv * 2.0 - 1.0, 0.0, 1.0);\n");
    for (slot, &offset) in layout.coordinates().iter().enumerate() {
        source.push_str(&format!(
            "    out.{} = {};\n",
            coordinate_name(layout, slot),
            offset_expression("tex_coord", offset)
        ));
    }
    source.push_str("    return out;\n");
    source.push_str("}\n");
    source
}

pub(super) fn fragment_source(layout: &TapLayout) -> String {
    let mut source = varyings_struct(layout);
    source.push('\n');
    source.push_str("@group(0) @binding(0) var t_input: texture_2d<f32>;\n");
    source.push_str("@group(0) @binding(1) var s_input: sampler;\n");
    if layout.inline_fetch_count() > 0 {
        source.push_str(&texel_offset_binding());
    }
    source.push('\n');

    source.push_str("@fragment\n");
    source.push_str(&format!(
        "fn {FRAGMENT_ENTRY_POINT}(in: BlurVaryings) -> @location(0) vec4<f32> {{\n"
    ));

    match layout {
        TapLayout::PassThrough => {
            source.push_str("    return textureSample(t_input, s_input, in.texCoord);\n");
        }
        TapLayout::Weighted { fetches, .. } => {
            source.push_str("    var color = vec4<f32>(0.0);\n");
            for fetch in fetches {
                source.push_str(&format!(
                    "    color += textureSample(t_input, s_input, {}) * {};\n",
                    coordinate_expression(layout, fetch),
                    float_literal(fetch.weight)
                ));
            }
            source.push_str("    return color;\n");
        }
    }

    source.push_str("}\n");
    source
}

fn coordinate_expression(layout: &TapLayout, fetch: &Fetch) -> String {
    match fetch.source {
        FetchSource::Coordinate(slot) => format!("in.{}", coordinate_name(layout, slot)),
        FetchSource::Inline(offset) => {
            offset_expression(&format!("in.{}", coordinate_name(layout, 0)), offset)
        }
    }
}
