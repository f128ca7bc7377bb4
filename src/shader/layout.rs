use crate::kernel::WeightTable;
use crate::taps::OptimizedTapSet;

/// Where a fragment-stage fetch takes its texture coordinate from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FetchSource {
    /// An interpolated coordinate emitted by the vertex stage.
    Coordinate(usize),
    /// Coordinate 0 shifted by this many texels, computed in the fragment stage.
    Inline(f32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fetch {
    pub source: FetchSource,
    pub weight: f32,
}

/// Coordinates and weighted fetches of one blur shader, independent of dialect.
#[derive(Debug, Clone, PartialEq)]
pub enum TapLayout {
    /// One coordinate, one unweighted fetch, no uniforms.
    PassThrough,
    Weighted {
        /// Signed offset along the pass axis, in texels, of each coordinate.
        coordinates: Vec<f32>,
        fetches: Vec<Fetch>,
    },
}

const PASS_THROUGH_COORDINATES: [f32; 1] = [0.0];
const PASS_THROUGH_FETCHES: [Fetch; 1] = [Fetch {
    source: FetchSource::Coordinate(0),
    weight: 1.0,
}];

impl TapLayout {
    /// One coordinate and one fetch per discrete tap, ordered from `-radius` to `+radius`.
    pub fn naive(table: &WeightTable) -> Self {
        let radius = table.radius() as i64;

        let coordinates: Vec<f32> = (-radius..=radius).map(|offset| offset as f32).collect();
        let fetches = (-radius..=radius)
            .enumerate()
            .map(|(slot, offset)| Fetch {
                source: FetchSource::Coordinate(slot),
                weight: table.get(offset.unsigned_abs() as usize),
            })
            .collect();

        TapLayout::Weighted {
            coordinates,
            fetches,
        }
    }

    /// The center coordinate followed by `+offset, -offset` for every varying
    /// tap. Overflow taps become inline fetches around the center.
    pub fn optimized(table: &WeightTable, taps: &OptimizedTapSet) -> Self {
        let mut coordinates = Vec::with_capacity(1 + 2 * taps.varying().len());
        let mut fetches = Vec::with_capacity(1 + 2 * taps.required());

        coordinates.push(0.0);
        fetches.push(Fetch {
            source: FetchSource::Coordinate(0),
            weight: table.center(),
        });

        for tap in taps.varying() {
            for offset in [tap.offset, -tap.offset] {
                fetches.push(Fetch {
                    source: FetchSource::Coordinate(coordinates.len()),
                    weight: tap.weight,
                });
                coordinates.push(offset);
            }
        }

        for tap in taps.overflow() {
            for offset in [tap.offset, -tap.offset] {
                fetches.push(Fetch {
                    source: FetchSource::Inline(offset),
                    weight: tap.weight,
                });
            }
        }

        TapLayout::Weighted {
            coordinates,
            fetches,
        }
    }

    pub fn is_pass_through(&self) -> bool {
        matches!(self, TapLayout::PassThrough)
    }

    pub fn coordinates(&self) -> &[f32] {
        match self {
            TapLayout::PassThrough => &PASS_THROUGH_COORDINATES,
            TapLayout::Weighted { coordinates, .. } => coordinates,
        }
    }

    pub fn fetches(&self) -> &[Fetch] {
        match self {
            TapLayout::PassThrough => &PASS_THROUGH_FETCHES,
            TapLayout::Weighted { fetches, .. } => fetches,
        }
    }

    pub fn coordinate_count(&self) -> usize {
        self.coordinates().len()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches().len()
    }

    pub fn inline_fetch_count(&self) -> usize {
        self.fetches()
            .iter()
            .filter(|fetch| matches!(fetch.source, FetchSource::Inline(_)))
            .count()
    }

    /// Weighted layouts step along the pass axis and need the texel offset uniform.
    pub fn uses_texel_offset(&self) -> bool {
        !self.is_pass_through()
    }

    /// Offset in texels from the pixel being shaded at which `fetch` samples.
    pub fn fetch_offset(&self, fetch: &Fetch) -> f32 {
        let coordinates = self.coordinates();
        match fetch.source {
            FetchSource::Coordinate(slot) => coordinates[slot],
            FetchSource::Inline(offset) => coordinates[0] + offset,
        }
    }

    pub fn total_weight(&self) -> f64 {
        self.fetches().iter().map(|fetch| fetch.weight as f64).sum()
    }
}
