//! Lightweight regex introspection of generated shader text, for either dialect.
//!
//! Comments are stripped first so that occurrences inside `//` or `/* */`
//! are ignored.

use std::sync::LazyLock;

use regex::Regex;

static BLOCK_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("valid block comment pattern"));
static LINE_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"//[^\n]*").expect("valid line comment pattern"));

static GLSL_COORDINATE_ARRAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"varying\s+vec2\s+blurCoordinates\s*\[\s*(\d+)\s*\]")
        .expect("valid coordinate array pattern")
});
static GLSL_SINGLE_COORDINATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"varying\s+vec2\s+texCoord\s*;").expect("valid single coordinate pattern")
});
static WGSL_COORDINATE_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@location\s*\(\s*\d+\s*\)\s*(?:blurCoordinates\d+|texCoord)\s*:\s*vec2<f32>")
        .expect("valid varyings field pattern")
});
static TEXEL_OFFSET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bu_texelOffset\b").expect("valid uniform pattern"));
static TEXTURE_FETCH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:texture2D|textureSample)\s*\(").expect("valid fetch pattern")
});
static INLINE_FETCH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:texture2D|textureSample)\s*\([^;]*?(?:blurCoordinates\s*\[\s*0\s*\]|in\.blurCoordinates0)\s*[+-]\s*u_texelOffset",
    )
    .expect("valid inline fetch pattern")
});

fn strip_comments(source: &str) -> String {
    let no_block = BLOCK_COMMENT.replace_all(source, "");
    LINE_COMMENT.replace_all(&no_block, "").into_owned()
}

/// Number of interpolated coordinates a stage declares, or `None` if it
/// declares neither the `blurCoordinates` set nor the pass-through `texCoord`.
pub fn declared_coordinates(source: &str) -> Option<usize> {
    let source = strip_comments(source);

    if let Some(captures) = GLSL_COORDINATE_ARRAY.captures(&source) {
        return captures[1].parse().ok();
    }
    if GLSL_SINGLE_COORDINATE.is_match(&source) {
        return Some(1);
    }

    match WGSL_COORDINATE_FIELD.find_iter(&source).count() {
        0 => None,
        fields => Some(fields),
    }
}

/// Whether the stage mentions the texel offset uniform at all.
pub fn references_texel_offset(source: &str) -> bool {
    TEXEL_OFFSET.is_match(&strip_comments(source))
}

pub fn texture_fetches(source: &str) -> usize {
    TEXTURE_FETCH.find_iter(&strip_comments(source)).count()
}

/// Fetches whose coordinate is computed in the stage from the center
/// coordinate and the texel offset uniform.
pub fn inline_fetches(source: &str) -> usize {
    INLINE_FETCH.find_iter(&strip_comments(source)).count()
}
