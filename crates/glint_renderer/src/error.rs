//! Error types for scene construction and rendering.

use thiserror::Error;

/// Invalid input detected while building a scene.
///
/// Degenerate geometry would otherwise turn into NaNs deep inside the
/// integrator, so constructors reject it up front.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("BVH needs at least one primitive")]
    EmptyBvh,

    #[error("Primitive {index} has no bounding box and cannot be placed in a BVH")]
    MissingBoundingBox { index: usize },

    #[error("Sphere radius must be finite and non-zero (got {radius})")]
    DegenerateSphere { radius: f32 },

    #[error("Sphere center must be finite")]
    NonFiniteCenter,

    #[error("Invalid time range: time1 ({time1}) must be greater than time0 ({time0})")]
    InvalidTimeRange { time0: f32, time1: f32 },

    #[error("Degenerate camera: {0}")]
    DegenerateCamera(&'static str),
}

/// Failure to start or finish a render.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Invalid render settings: {0}")]
    InvalidSettings(String),

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("A render worker panicked; the render was aborted")]
    WorkerPanicked,
}

pub type SceneResult<T> = Result<T, SceneError>;
