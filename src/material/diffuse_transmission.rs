use crate::bsdf::BSDF;
use crate::bxdf::{BxDF, DiffuseTransmissionBxDF};
use crate::color::SampledWavelengths;
use crate::material::{AbstractMaterial, MaterialEvalContext, MaterialEvaluator};
use crate::math::*;
use crate::scene::TextureId;

#[derive(Debug, Clone)]
pub struct DiffuseTransmissionMaterial {
    pub reflectance: TextureId,
    pub transmittance: TextureId,
    pub scale: Float,
}

impl AbstractMaterial for DiffuseTransmissionMaterial {
    type ConcreteBxDF = DiffuseTransmissionBxDF;

    fn get_bxdf<E: MaterialEvaluator>(
        &self,
        eval: &E,
        ctx: &MaterialEvalContext,
        lambda: &SampledWavelengths,
    ) -> Self::ConcreteBxDF {
        let r = (eval.evaluate(self.reflectance, ctx.uv, lambda) * self.scale).clamp_zero();
        let t = (eval.evaluate(self.transmittance, ctx.uv, lambda) * self.scale).clamp_zero();
        DiffuseTransmissionBxDF::new(r, t)
    }

    fn get_bsdf<E: MaterialEvaluator>(
        &self,
        eval: &E,
        ctx: &MaterialEvalContext,
        lambda: &SampledWavelengths,
    ) -> BSDF {
        let bxdf = self.get_bxdf(eval, ctx, lambda);
        BSDF::new(ctx.ns, ctx.tangent, BxDF::DiffuseTransmission(bxdf))
    }
}
