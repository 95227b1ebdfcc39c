//! Flat scene storage. Every object is addressed by a tagged handle whose
//! tag selects one of the dense per-variant arrays below.

use crate::bsdf::BSDF;
use crate::color::{AbstractSpectrumEvaluator, SampledSpectrum, SampledWavelengths, Spectra};
use crate::light::sampler::LightSamplers;
use crate::light::Lights;
use crate::material::{MaterialEvalContext, Materials};
use crate::math::*;
use crate::primitive::{BvhNode, Hit, PrimitiveNode, TransformNode};
use crate::shape::Shapes;
use crate::texture::{AbstractTextureEvaluator, Textures};

mod builder;

pub use builder::SceneBuilder;

tagged_id!(
    /// An acceleration structure node: a BVH node, an instance transform,
    /// or a leaf primitive.
    NodeId, NodeType, 2, { Bvh = 0, Transform = 1, Primitive = 2 }
);

tagged_id!(ShapeId, ShapeType, 1, { Sphere = 0, Triangle = 1 });

tagged_id!(
    MaterialId, MaterialType, 3, {
        Diffuse = 0,
        DiffuseTransmit = 1,
        Conductor = 2,
        Dielectric = 3,
        ThinDielectric = 4,
        MetallicWorkflow = 5,
        Mix = 6,
    }
);

tagged_id!(LightId, LightType, 2, { Uniform = 0, Image = 1, Area = 2 });

tagged_id!(TextureId, TextureType, 3, { Constant = 0, Image = 1, Scale = 2, Checkerboard = 3 });

tagged_id!(SpectrumId, SpectrumType, 2, { Constant = 0, Cauchy = 1, PiecewiseLinear = 2 });

tagged_id!(LightSamplerId, LightSamplerType, 1, { Uniform = 0, Power = 1 });

impl LightId {
    /// Marks a primitive that does not emit.
    pub const NONE: LightId = LightId(u32::MAX);

    #[inline]
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    #[inline]
    pub fn is_infinite(self) -> bool {
        !self.is_none() && matches!(self.ty(), LightType::Uniform | LightType::Image)
    }
}

/// A fully built scene. Immutable while rendering.
#[derive(Debug)]
pub struct Scene {
    pub(crate) bvh_nodes: Vec<BvhNode>,
    pub(crate) transform_nodes: Vec<TransformNode>,
    pub(crate) primitive_nodes: Vec<PrimitiveNode>,
    pub(crate) root: NodeId,
    pub(crate) bounds: Bounds3f,

    pub shapes: Shapes,
    pub materials: Materials,
    pub textures: Textures,
    pub spectra: Spectra,
    pub lights: Lights,
    pub light_samplers: LightSamplers,
    pub light_sampler: LightSamplerId,
}

impl Scene {
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// World-space bounds of everything reachable from the root.
    #[inline]
    pub fn bounds(&self) -> Bounds3f {
        self.bounds
    }

    #[inline]
    pub fn bvh_node(&self, id: NodeId) -> &BvhNode {
        &self.bvh_nodes[id.idx()]
    }

    #[inline]
    pub fn transform_node(&self, id: NodeId) -> &TransformNode {
        &self.transform_nodes[id.idx()]
    }

    #[inline]
    pub fn primitive_node(&self, id: NodeId) -> &PrimitiveNode {
        &self.primitive_nodes[id.idx()]
    }
}

impl Scene {
    /// Scattering function at a hit, with mix materials resolved.
    pub fn bsdf(&self, hit: &Hit, lambda: &SampledWavelengths) -> BSDF {
        self.materials.get_bsdf(self, hit.material, &MaterialEvalContext::from(hit), lambda)
    }
}

impl AbstractSpectrumEvaluator for Scene {
    #[inline]
    fn sample(&self, spectrum: SpectrumId, lambda: &SampledWavelengths) -> SampledSpectrum {
        self.spectra.sample(spectrum, lambda)
    }

    #[inline]
    fn is_constant(&self, spectrum: SpectrumId) -> bool {
        self.spectra.is_constant(spectrum)
    }
}

impl AbstractTextureEvaluator for Scene {
    #[inline]
    fn evaluate(&self, texture: TextureId, uv: Point2f, lambda: &SampledWavelengths) -> SampledSpectrum {
        self.textures.evaluate(&self.spectra, texture, uv, lambda)
    }

    #[inline]
    fn evaluate_float(&self, texture: TextureId, uv: Point2f) -> Float {
        self.textures.evaluate_float(&self.spectra, texture, uv)
    }
}
