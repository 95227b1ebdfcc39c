use thiserror::Error;

use crate::scene::{LightId, MaterialId, NodeId, ShapeId, SpectrumId, TextureId};

pub type SceneResult<T> = std::result::Result<T, SceneError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("invalid node handle {0:?}")]
    InvalidNode(NodeId),

    #[error("invalid shape handle {0:?}")]
    InvalidShape(ShapeId),

    #[error("invalid material handle {0:?}")]
    InvalidMaterial(MaterialId),

    #[error("invalid texture handle {0:?}")]
    InvalidTexture(TextureId),

    #[error("invalid spectrum handle {0:?}")]
    InvalidSpectrum(SpectrumId),

    #[error("invalid light handle {0:?}")]
    InvalidLight(LightId),

    #[error("bvh over no objects")]
    EmptyBvh,

    #[error("scene has no geometry")]
    EmptyScene,

    #[error("transform nodes nest deeper than {0}")]
    TransformDepth(usize),

    #[error("mix materials nest deeper than {0} or form a cycle")]
    MixDepth(usize),

    #[error("textures nest deeper than {0} or form a cycle")]
    TextureDepth(usize),

    #[error("area light {0:?} is reachable through more than one instance")]
    InstancedLight(LightId),

    #[error("area light {0:?} is not reachable from the scene root")]
    UnplacedLight(LightId),

    #[error("environment image must be a non-empty square, got {0}x{1}")]
    InvalidEnvironmentImage(usize, usize),

    #[error("light distribution has no energy")]
    DegenerateLightDistribution,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OptionsError {
    #[error("samples per pixel must be positive")]
    ZeroSamples,

    #[error("max depth must be positive")]
    ZeroDepth,

    #[error("russian roulette depth {rr_min_depth} exceeds max depth {max_depth}")]
    RouletteDepth { rr_min_depth: u32, max_depth: u32 },

    #[error("guiding training fraction {0} is outside (0, 1]")]
    TrainingFraction(f32),

    #[error("guiding mixture probability {0} is outside [0, 1)")]
    GuidingProbability(f32),

    #[error("guided paths record at most {limit} vertices, max depth is {max_depth}")]
    GuidedDepth { max_depth: u32, limit: usize },

    #[error("image resolution must be non-zero")]
    EmptyResolution,
}
