use crate::bsdf::BSDF;
use crate::bxdf::{BxDF, DielectricBxDF};
use crate::color::SampledWavelengths;
use crate::material::{AbstractMaterial, MaterialEvalContext, MaterialEvaluator};
use crate::math::scattering::TrowbridgeReitzDistribution;
use crate::scene::{SpectrumId, TextureId};

/// A dielectric whose IOR may vary with wavelength. Varying IORs are
/// taken at the hero wavelength and end the secondary wavelengths.
#[derive(Debug, Clone)]
pub struct DielectricMaterial {
    pub ior: SpectrumId,
    pub u_roughness: TextureId,
    pub v_roughness: TextureId,
}

impl AbstractMaterial for DielectricMaterial {
    type ConcreteBxDF = DielectricBxDF;

    fn get_bxdf<E: MaterialEvaluator>(
        &self,
        eval: &E,
        ctx: &MaterialEvalContext,
        lambda: &SampledWavelengths,
    ) -> Self::ConcreteBxDF {
        let mut eta = eval.sample(self.ior, lambda)[0];
        if eta == 0.0 {
            eta = 1.0;
        }

        let u_rough = eval.evaluate_float(self.u_roughness, ctx.uv);
        let v_rough = eval.evaluate_float(self.v_roughness, ctx.uv);

        DielectricBxDF::new(eta, TrowbridgeReitzDistribution::new(u_rough, v_rough))
    }

    fn get_bsdf<E: MaterialEvaluator>(
        &self,
        eval: &E,
        ctx: &MaterialEvalContext,
        lambda: &SampledWavelengths,
    ) -> BSDF {
        let bxdf = self.get_bxdf(eval, ctx, lambda);
        BSDF::new(ctx.ns, ctx.tangent, BxDF::Dielectric(bxdf)).with_terminate_secondary(!eval.is_constant(self.ior))
    }
}
