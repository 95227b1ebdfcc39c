use crate::bxdf::{lobe_split, AbstractBxDF, BSDFSample, BxDFFlags};
use crate::color::SampledSpectrum;
use crate::math::scattering::fr_dielectric;
use crate::math::*;

/// An infinitesimally thin slab. Internal bounces are summed into the
/// reflectance; transmission continues straight through.
#[derive(Debug, Clone)]
pub struct ThinDielectricBxDF {
    eta: Float,
}

impl ThinDielectricBxDF {
    pub fn new(eta: Float) -> ThinDielectricBxDF {
        ThinDielectricBxDF { eta }
    }
}

impl AbstractBxDF for ThinDielectricBxDF {
    fn f(&self, _wo: Vec3f, _wi: Vec3f) -> SampledSpectrum {
        SampledSpectrum::from_const(0.0)
    }

    fn sample_f(&self, wo: Vec3f, uc: Float, _u: Point2f) -> Option<BSDFSample> {
        let mut r = fr_dielectric(abs_cos_theta(wo), self.eta);
        let mut t = 1.0 - r;

        if r < 1.0 {
            r += sqr(t) * r / (1.0 - sqr(r));
            t = 1.0 - r;
        }

        let (pr, pt) = lobe_split(r, t)?;

        if uc < pr {
            let wi = Vec3f::new(-wo.x, -wo.y, wo.z);
            let fr = SampledSpectrum::from_const(r / abs_cos_theta(wi));
            Some(BSDFSample::new(fr, wi, pr, BxDFFlags::SPECULAR_REFLECTION))
        } else {
            let wi = -wo;
            let ft = SampledSpectrum::from_const(t / abs_cos_theta(wi));
            Some(BSDFSample::new(ft, wi, pt, BxDFFlags::SPECULAR_TRANSMISSION))
        }
    }

    fn pdf(&self, _wo: Vec3f, _wi: Vec3f) -> Float {
        0.0
    }

    fn flags(&self) -> BxDFFlags {
        BxDFFlags::REFLECTION | BxDFFlags::TRANSMISSION | BxDFFlags::SPECULAR
    }
}
