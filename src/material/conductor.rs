use crate::bsdf::BSDF;
use crate::bxdf::{BxDF, ConductorBxDF};
use crate::color::SampledWavelengths;
use crate::material::{AbstractMaterial, MaterialEvalContext, MaterialEvaluator};
use crate::math::scattering::TrowbridgeReitzDistribution;
use crate::scene::TextureId;

/// Complex IOR `ior_re + i ior_im`. Roughness values are used as the
/// microfacet alpha directly.
#[derive(Debug, Clone)]
pub struct ConductorMaterial {
    pub ior_re: TextureId,
    pub ior_im: TextureId,
    pub u_roughness: TextureId,
    pub v_roughness: TextureId,
}

impl AbstractMaterial for ConductorMaterial {
    type ConcreteBxDF = ConductorBxDF;

    fn get_bxdf<E: MaterialEvaluator>(
        &self,
        eval: &E,
        ctx: &MaterialEvalContext,
        lambda: &SampledWavelengths,
    ) -> Self::ConcreteBxDF {
        let eta = eval.evaluate(self.ior_re, ctx.uv, lambda);
        let k = eval.evaluate(self.ior_im, ctx.uv, lambda);
        let u_rough = eval.evaluate_float(self.u_roughness, ctx.uv);
        let v_rough = eval.evaluate_float(self.v_roughness, ctx.uv);

        ConductorBxDF::new(TrowbridgeReitzDistribution::new(u_rough, v_rough), eta, k)
    }

    fn get_bsdf<E: MaterialEvaluator>(
        &self,
        eval: &E,
        ctx: &MaterialEvalContext,
        lambda: &SampledWavelengths,
    ) -> BSDF {
        let bxdf = self.get_bxdf(eval, ctx, lambda);
        BSDF::new(ctx.ns, ctx.tangent, BxDF::Conductor(bxdf))
    }
}
