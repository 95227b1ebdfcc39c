use crate::bsdf::BSDF;
use crate::bxdf::{BxDF, MetallicWorkflowBxDF};
use crate::color::SampledWavelengths;
use crate::material::{AbstractMaterial, MaterialEvalContext, MaterialEvaluator};
use crate::math::scattering::TrowbridgeReitzDistribution;
use crate::math::*;
use crate::scene::TextureId;

/// Perceptual roughness; the microfacet alpha is its square.
#[derive(Debug, Clone)]
pub struct MetallicWorkflowMaterial {
    pub base_color: TextureId,
    pub metallic: TextureId,
    pub u_roughness: TextureId,
    pub v_roughness: TextureId,
}

impl AbstractMaterial for MetallicWorkflowMaterial {
    type ConcreteBxDF = MetallicWorkflowBxDF;

    fn get_bxdf<E: MaterialEvaluator>(
        &self,
        eval: &E,
        ctx: &MaterialEvalContext,
        lambda: &SampledWavelengths,
    ) -> Self::ConcreteBxDF {
        let base_color = eval.evaluate(self.base_color, ctx.uv, lambda).clamp_zero();
        let metallic = eval.evaluate_float(self.metallic, ctx.uv);
        let u_alpha = sqr(eval.evaluate_float(self.u_roughness, ctx.uv));
        let v_alpha = sqr(eval.evaluate_float(self.v_roughness, ctx.uv));

        MetallicWorkflowBxDF::new(base_color, metallic, TrowbridgeReitzDistribution::new(u_alpha, v_alpha))
    }

    fn get_bsdf<E: MaterialEvaluator>(
        &self,
        eval: &E,
        ctx: &MaterialEvalContext,
        lambda: &SampledWavelengths,
    ) -> BSDF {
        let bxdf = self.get_bxdf(eval, ctx, lambda);
        BSDF::new(ctx.ns, ctx.tangent, BxDF::MetallicWorkflow(bxdf))
    }
}
