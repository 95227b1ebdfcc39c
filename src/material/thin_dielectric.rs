use crate::bsdf::BSDF;
use crate::bxdf::{BxDF, ThinDielectricBxDF};
use crate::color::SampledWavelengths;
use crate::material::{AbstractMaterial, MaterialEvalContext, MaterialEvaluator};
use crate::scene::SpectrumId;

#[derive(Debug, Clone)]
pub struct ThinDielectricMaterial {
    pub ior: SpectrumId,
}

impl AbstractMaterial for ThinDielectricMaterial {
    type ConcreteBxDF = ThinDielectricBxDF;

    fn get_bxdf<E: MaterialEvaluator>(
        &self,
        eval: &E,
        _ctx: &MaterialEvalContext,
        lambda: &SampledWavelengths,
    ) -> Self::ConcreteBxDF {
        let mut eta = eval.sample(self.ior, lambda)[0];
        if eta == 0.0 {
            eta = 1.0;
        }
        ThinDielectricBxDF::new(eta)
    }

    fn get_bsdf<E: MaterialEvaluator>(
        &self,
        eval: &E,
        ctx: &MaterialEvalContext,
        lambda: &SampledWavelengths,
    ) -> BSDF {
        let bxdf = self.get_bxdf(eval, ctx, lambda);
        BSDF::new(ctx.ns, ctx.tangent, BxDF::ThinDielectric(bxdf)).with_terminate_secondary(!eval.is_constant(self.ior))
    }
}
