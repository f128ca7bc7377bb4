use crate::bank::PassId;
use crate::config::ShaderDialect;

/// Errors that can occur while building or driving the blur passes.
#[derive(Debug, thiserror::Error)]
pub enum BlurError {
    #[error("max radius {requested} exceeds the supported maximum of {limit}")]
    RadiusTooLarge { requested: u32, limit: u32 },

    #[error("blur period must be non-zero")]
    ZeroPeriod,

    #[error("sigma must be finite, got {0}")]
    NonFiniteSigma(f32),

    #[error("shader cache capacity must be non-zero")]
    ZeroCacheCapacity,

    /// The generated vertex and fragment stages disagree on how many
    /// coordinates are passed between them.
    #[error(
        "shader stages for radius {radius} disagree: vertex declares {vertex:?} coordinates, \
         fragment declares {fragment:?}"
    )]
    StageMismatch {
        radius: u32,
        vertex: Option<usize>,
        fragment: Option<usize>,
    },

    #[error("pass {pass} carries {dialect:?} shaders which this host cannot compile")]
    UnsupportedDialect { pass: PassId, dialect: ShaderDialect },

    #[error("pass {pass} needs {coordinates} interpolated coordinates, the host allows {limit}")]
    TooManyVaryings {
        pass: PassId,
        coordinates: usize,
        limit: usize,
    },

    #[error("pass {pass} reads pass {input}, which has not been prepared")]
    UnpreparedInput { pass: PassId, input: PassId },

    #[error("scene data has {actual} bytes, expected {expected}")]
    SceneSizeMismatch { expected: usize, actual: usize },

    #[error("no suitable GPU adapter found")]
    AdapterNotFound,

    #[error("device error: {0}")]
    Device(String),

    #[error("readback failed: {0}")]
    Readback(String),
}

impl From<wgpu::RequestDeviceError> for BlurError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        BlurError::Device(e.to_string())
    }
}

impl From<wgpu::BufferAsyncError> for BlurError {
    fn from(e: wgpu::BufferAsyncError) -> Self {
        BlurError::Readback(e.to_string())
    }
}
