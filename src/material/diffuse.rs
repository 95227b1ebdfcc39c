use crate::bsdf::BSDF;
use crate::bxdf::{BxDF, DiffuseBxDF};
use crate::color::SampledWavelengths;
use crate::material::{AbstractMaterial, MaterialEvalContext, MaterialEvaluator};
use crate::scene::TextureId;

#[derive(Debug, Clone)]
pub struct DiffuseMaterial {
    pub reflectance: TextureId,
}

impl AbstractMaterial for DiffuseMaterial {
    type ConcreteBxDF = DiffuseBxDF;

    fn get_bxdf<E: MaterialEvaluator>(
        &self,
        eval: &E,
        ctx: &MaterialEvalContext,
        lambda: &SampledWavelengths,
    ) -> Self::ConcreteBxDF {
        let r = eval.evaluate(self.reflectance, ctx.uv, lambda).clamp_zero();
        DiffuseBxDF::new(r)
    }

    fn get_bsdf<E: MaterialEvaluator>(
        &self,
        eval: &E,
        ctx: &MaterialEvalContext,
        lambda: &SampledWavelengths,
    ) -> BSDF {
        let bxdf = self.get_bxdf(eval, ctx, lambda);
        BSDF::new(ctx.ns, ctx.tangent, BxDF::Diffuse(bxdf))
    }
}
