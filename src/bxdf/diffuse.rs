use crate::bxdf::{AbstractBxDF, BSDFSample, BxDFFlags};
use crate::color::SampledSpectrum;
use crate::math::sampling::{cosine_hemisphere_pdf, sample_cosine_hemisphere};
use crate::math::*;

/// Lambertian reflection.
#[derive(Debug, Clone)]
pub struct DiffuseBxDF {
    r: SampledSpectrum,
}

impl DiffuseBxDF {
    pub fn new(r: SampledSpectrum) -> DiffuseBxDF {
        DiffuseBxDF { r }
    }
}

impl AbstractBxDF for DiffuseBxDF {
    fn f(&self, wo: Vec3f, wi: Vec3f) -> SampledSpectrum {
        if !same_hemisphere(wo, wi) {
            return SampledSpectrum::from_const(0.0);
        }

        self.r * FRAC_1_PI
    }

    fn sample_f(&self, wo: Vec3f, _uc: Float, u: Point2f) -> Option<BSDFSample> {
        let mut wi = sample_cosine_hemisphere(u);
        if wo.z < 0.0 {
            wi.z *= -1.0;
        }

        let pdf = cosine_hemisphere_pdf(abs_cos_theta(wi));

        Some(BSDFSample::new(self.r * FRAC_1_PI, wi, pdf, BxDFFlags::DIFFUSE_REFLECTION))
    }

    fn pdf(&self, wo: Vec3f, wi: Vec3f) -> Float {
        if !same_hemisphere(wo, wi) {
            0.0
        } else {
            cosine_hemisphere_pdf(abs_cos_theta(wi))
        }
    }

    fn flags(&self) -> BxDFFlags {
        if self.r.is_zero() {
            BxDFFlags::UNSET
        } else {
            BxDFFlags::DIFFUSE_REFLECTION
        }
    }
}
