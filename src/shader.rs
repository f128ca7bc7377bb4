//! Shader text generation for the separable blur passes.
//!
//! Generation is split in two steps:
//! - a [`TapLayout`] describes which coordinates the vertex stage emits and
//!   which weighted fetches the fragment stage sums, built either naively
//!   (one fetch per discrete tap) or from merged bilinear taps;
//! - a dialect emitter renders that layout as GLSL or WGSL text.
//!
//! Generation is a pure function of `(kernel, mode, dialect)`; identical
//! inputs produce byte-identical sources, which is what lets the pass bank
//! share one [`ShaderPair`] between passes and across rebuilds.

mod glsl;
pub mod inspect;
mod layout;
mod literal;
mod wgsl;

pub use layout::{Fetch, FetchSource, TapLayout};
pub use wgsl::{FRAGMENT_ENTRY_POINT, VERTEX_ENTRY_POINT};

use crate::config::{GeneratorMode, ShaderDialect};
use crate::error::BlurError;
use crate::kernel::KernelSpec;
use crate::taps::OptimizedTapSet;

/// Name of the per-pass uniform holding the texel step along the blur axis.
pub const TEXEL_OFFSET_UNIFORM: &str = "u_texelOffset";

/// Vertex and fragment sources generated for one kernel. Never mutated after
/// generation.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderPair {
    vertex: String,
    fragment: String,
    kernel: KernelSpec,
    mode: GeneratorMode,
    dialect: ShaderDialect,
    layout: TapLayout,
}

impl ShaderPair {
    pub fn vertex(&self) -> &str {
        &self.vertex
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    pub fn kernel(&self) -> KernelSpec {
        self.kernel
    }

    pub fn mode(&self) -> GeneratorMode {
        self.mode
    }

    pub fn dialect(&self) -> ShaderDialect {
        self.dialect
    }

    /// The coordinates and fetches the sources encode. Hosts that do not
    /// compile shader text (such as [`crate::CpuHost`]) evaluate this instead.
    pub fn layout(&self) -> &TapLayout {
        &self.layout
    }

    pub fn uses_texel_offset(&self) -> bool {
        self.layout.uses_texel_offset()
    }

    /// Verifies that both stages declare the same number of interpolated coordinates.
    pub fn check_stages(&self) -> Result<(), BlurError> {
        let vertex = inspect::declared_coordinates(&self.vertex);
        let fragment = inspect::declared_coordinates(&self.fragment);

        if vertex.is_none() || vertex != fragment {
            return Err(BlurError::StageMismatch {
                radius: self.kernel.radius(),
                vertex,
                fragment,
            });
        }

        Ok(())
    }
}

/// Generates the shader pair for `kernel`.
///
/// Degenerate kernels (radius 0, or sigma not positive) produce a pass-through
/// copy regardless of `mode`.
pub fn generate(kernel: KernelSpec, mode: GeneratorMode, dialect: ShaderDialect) -> ShaderPair {
    let layout = match kernel.weights() {
        None => TapLayout::PassThrough,
        Some(table) => match mode {
            GeneratorMode::Naive => TapLayout::naive(&table),
            GeneratorMode::Optimized => {
                TapLayout::optimized(&table, &OptimizedTapSet::from_weights(&table))
            }
        },
    };

    let (vertex, fragment) = match dialect {
        ShaderDialect::Glsl => (glsl::vertex_source(&layout), glsl::fragment_source(&layout)),
        ShaderDialect::Wgsl => (wgsl::vertex_source(&layout), wgsl::fragment_source(&layout)),
    };

    ShaderPair {
        vertex,
        fragment,
        kernel,
        mode,
        dialect,
        layout,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODES: [GeneratorMode; 2] = [GeneratorMode::Naive, GeneratorMode::Optimized];
    const DIALECTS: [ShaderDialect; 2] = [ShaderDialect::Glsl, ShaderDialect::Wgsl];

    #[test]
    fn degenerate_kernels_generate_pass_through() {
        for kernel in [KernelSpec::new(0, 5.0), KernelSpec::new(6, 0.0)] {
            for mode in MODES {
                for dialect in DIALECTS {
                    let pair = generate(kernel, mode, dialect);
                    assert!(pair.layout().is_pass_through());
                    assert!(!pair.uses_texel_offset());
                    assert!(!inspect::references_texel_offset(pair.vertex()));
                    assert!(!inspect::references_texel_offset(pair.fragment()));
                    assert_eq!(inspect::texture_fetches(pair.fragment()), 1);
                }
            }
        }
    }

    #[test]
    fn stages_agree_on_coordinate_count() {
        for radius in 0..=24 {
            for mode in MODES {
                for dialect in DIALECTS {
                    let pair = generate(KernelSpec::new(radius, 5.0), mode, dialect);
                    pair.check_stages().unwrap();
                    assert_eq!(
                        inspect::declared_coordinates(pair.vertex()),
                        Some(pair.layout().coordinate_count())
                    );
                }
            }
        }
    }

    #[test]
    fn fetch_count_matches_layout() {
        for radius in 0..=24 {
            for mode in MODES {
                for dialect in DIALECTS {
                    let pair = generate(KernelSpec::new(radius, 5.0), mode, dialect);
                    assert_eq!(
                        inspect::texture_fetches(pair.fragment()),
                        pair.layout().fetch_count()
                    );
                    assert_eq!(
                        inspect::inline_fetches(pair.fragment()),
                        pair.layout().inline_fetch_count()
                    );
                }
            }
        }
    }

    #[test]
    fn generation_is_idempotent() {
        for mode in MODES {
            for dialect in DIALECTS {
                let a = generate(KernelSpec::new(9, 4.5), mode, dialect);
                let b = generate(KernelSpec::new(9, 4.5), mode, dialect);
                assert_eq!(a.vertex(), b.vertex());
                assert_eq!(a.fragment(), b.fragment());
            }
        }
    }

    #[test]
    fn check_stages_reports_mismatch() {
        let mut pair = generate(KernelSpec::new(3, 2.0), GeneratorMode::Naive, ShaderDialect::Glsl);
        pair.fragment = pair
            .fragment
            .replace("blurCoordinates[7]", "blurCoordinates[5]");
        assert!(matches!(
            pair.check_stages(),
            Err(BlurError::StageMismatch {
                radius: 3,
                vertex: Some(7),
                fragment: Some(5),
            })
        ));
    }
}
