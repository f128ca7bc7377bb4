//! `attribute`/`varying` GLSL for hosts that inject `CC_MVPMatrix` and `CC_Texture0`.

use super::layout::{Fetch, FetchSource, TapLayout};
use super::literal::{float_literal, offset_expression};
use super::TEXEL_OFFSET_UNIFORM;

const MVP_MATRIX: &str = "CC_MVPMatrix";
const INPUT_TEXTURE: &str = "CC_Texture0";
const PRECISION_PREAMBLE: &str = "#ifdef GL_ES\nprecision mediump float;\n#endif\n";

pub(super) fn vertex_source(layout: &TapLayout) -> String {
    let mut source = String::new();
    source.push_str("attribute vec4 a_position;\n");
    source.push_str("attribute vec4 a_texCoord;\n");

    match layout {
        TapLayout::PassThrough => {
            source.push_str("varying vec2 texCoord;\n");
            source.push_str("void main()\n{\n");
            source.push_str(&format!("  gl_Position = {MVP_MATRIX} * a_position;\n"));
            source.push_str("  texCoord = a_texCoord.xy;\n");
        }
        TapLayout::Weighted { coordinates, .. } => {
            source.push_str(&format!("uniform vec2 {TEXEL_OFFSET_UNIFORM};\n"));
            source.push_str(&format!(
                "varying vec2 blurCoordinates[{}];\n",
                coordinates.len()
            ));
            source.push_str("void main()\n{\n");
            source.push_str(&format!("  gl_Position = {MVP_MATRIX} * a_position;\n"));
            for (slot, &offset) in coordinates.iter().enumerate() {
                source.push_str(&format!(
                    "  blurCoordinates[{slot}] = {};\n",
                    offset_expression("a_texCoord.xy", offset)
                ));
            }
        }
    }

    source.push_str("}\n");
    source
}

pub(super) fn fragment_source(layout: &TapLayout) -> String {
    let mut source = String::from(PRECISION_PREAMBLE);

    match layout {
        TapLayout::PassThrough => {
            source.push_str("varying vec2 texCoord;\n");
            source.push_str("void main()\n{\n");
            source.push_str(&format!(
                "  gl_FragColor = texture2D({INPUT_TEXTURE}, texCoord);\n"
            ));
        }
        TapLayout::Weighted {
            coordinates,
            fetches,
        } => {
            source.push_str(&format!(
                "varying vec2 blurCoordinates[{}];\n",
                coordinates.len()
            ));
            if layout.inline_fetch_count() > 0 {
                source.push_str(&format!("uniform vec2 {TEXEL_OFFSET_UNIFORM};\n"));
            }
            source.push_str("void main()\n{\n");
            source.push_str("  gl_FragColor = vec4(0.0);\n");
            for fetch in fetches {
                source.push_str(&format!(
                    "  gl_FragColor += texture2D({INPUT_TEXTURE}, {}) * {};\n",
                    coordinate_expression(fetch),
                    float_literal(fetch.weight)
                ));
            }
        }
    }

    source.push_str("}\n");
    source
}

fn coordinate_expression(fetch: &Fetch) -> String {
    match fetch.source {
        FetchSource::Coordinate(slot) => format!("blurCoordinates[{slot}]"),
        FetchSource::Inline(offset) => offset_expression("blurCoordinates[0]", offset),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::KernelSpec;
    use crate::taps::OptimizedTapSet;

    #[test]
    fn pass_through_copies_the_input_texture() {
        let vertex = vertex_source(&TapLayout::PassThrough);
        let fragment = fragment_source(&TapLayout::PassThrough);

        assert_eq!(
            vertex,
            "attribute vec4 a_position;\n\
             attribute vec4 a_texCoord;\n\
             varying vec2 texCoord;\n\
             void main()\n\
             {\n  gl_Position = CC_MVPMatrix * a_position;\n  texCoord = a_texCoord.xy;\n}\n"
        );
        assert!(fragment.ends_with(
            "varying vec2 texCoord;\n\
             void main()\n\
             {\n  gl_FragColor = texture2D(CC_Texture0, texCoord);\n}\n"
        ));
    }

    #[test]
    fn naive_radius_one_layout() {
        let table = KernelSpec::new(1, 1.0).weights().unwrap();
        let layout = TapLayout::naive(&table);
        let vertex = vertex_source(&layout);

        assert!(vertex.contains("uniform vec2 u_texelOffset;\n"));
        assert!(vertex.contains("varying vec2 blurCoordinates[3];\n"));
        assert!(vertex.contains("  blurCoordinates[0] = a_texCoord.xy - u_texelOffset * 1.0;\n"));
        assert!(vertex.contains("  blurCoordinates[1] = a_texCoord.xy;\n"));
        assert!(vertex.contains("  blurCoordinates[2] = a_texCoord.xy + u_texelOffset * 1.0;\n"));

        let fragment = fragment_source(&layout);
        assert!(!fragment.contains("u_texelOffset"));
        let center = format!(
            "  gl_FragColor += texture2D(CC_Texture0, blurCoordinates[1]) * {};\n",
            float_literal(table.center())
        );
        assert!(fragment.contains(&center));
    }

    #[test]
    fn overflow_fetches_offset_the_center_coordinate() {
        let table = KernelSpec::new(16, 5.0).weights().unwrap();
        let taps = OptimizedTapSet::from_weights(&table);
        let layout = TapLayout::optimized(&table, &taps);
        let fragment = fragment_source(&layout);

        assert!(fragment.contains("varying vec2 blurCoordinates[15];\n"));
        assert!(fragment.contains("uniform vec2 u_texelOffset;\n"));
        let overflow = taps.overflow()[0];
        let expected = format!(
            "texture2D(CC_Texture0, blurCoordinates[0] - u_texelOffset * {}) * {};\n",
            float_literal(overflow.offset),
            float_literal(overflow.weight)
        );
        assert!(fragment.contains(&expected));
    }
}
