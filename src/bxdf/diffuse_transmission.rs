use crate::bxdf::{lobe_split, AbstractBxDF, BSDFSample, BxDFFlags};
use crate::color::SampledSpectrum;
use crate::math::sampling::{cosine_hemisphere_pdf, sample_cosine_hemisphere};
use crate::math::*;

/// Lambertian reflection and transmission. Lobes are chosen in proportion
/// to the largest channel of each.
#[derive(Debug, Clone)]
pub struct DiffuseTransmissionBxDF {
    r: SampledSpectrum,
    t: SampledSpectrum,
}

impl DiffuseTransmissionBxDF {
    pub fn new(r: SampledSpectrum, t: SampledSpectrum) -> DiffuseTransmissionBxDF {
        DiffuseTransmissionBxDF { r, t }
    }

    fn split(&self) -> Option<(Float, Float)> {
        lobe_split(self.r.max_component_value(), self.t.max_component_value())
    }
}

impl AbstractBxDF for DiffuseTransmissionBxDF {
    fn f(&self, wo: Vec3f, wi: Vec3f) -> SampledSpectrum {
        if same_hemisphere(wo, wi) {
            self.r * FRAC_1_PI
        } else {
            self.t * FRAC_1_PI
        }
    }

    fn sample_f(&self, wo: Vec3f, uc: Float, u: Point2f) -> Option<BSDFSample> {
        let (pr, pt) = self.split()?;

        let mut wi = sample_cosine_hemisphere(u);
        if uc < pr {
            if wo.z < 0.0 {
                wi.z = -wi.z;
            }
            let pdf = cosine_hemisphere_pdf(abs_cos_theta(wi)) * pr;
            Some(BSDFSample::new(self.f(wo, wi), wi, pdf, BxDFFlags::DIFFUSE_REFLECTION))
        } else {
            if wo.z > 0.0 {
                wi.z = -wi.z;
            }
            let pdf = cosine_hemisphere_pdf(abs_cos_theta(wi)) * pt;
            Some(BSDFSample::new(self.f(wo, wi), wi, pdf, BxDFFlags::DIFFUSE_TRANSMISSION))
        }
    }

    fn pdf(&self, wo: Vec3f, wi: Vec3f) -> Float {
        let Some((pr, pt)) = self.split() else {
            return 0.0;
        };

        if same_hemisphere(wo, wi) {
            pr * cosine_hemisphere_pdf(abs_cos_theta(wi))
        } else {
            pt * cosine_hemisphere_pdf(abs_cos_theta(wi))
        }
    }

    fn flags(&self) -> BxDFFlags {
        let mut flags = BxDFFlags::DIFFUSE;

        if !self.r.is_zero() {
            flags |= BxDFFlags::REFLECTION;
        }

        if !self.t.is_zero() {
            flags |= BxDFFlags::TRANSMISSION;
        }

        flags
    }
}
