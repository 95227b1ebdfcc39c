use crate::bxdf::{AbstractBxDF, BSDFSample, BxDF, BxDFFlags};
use crate::color::SampledSpectrum;
use crate::math::*;

/// A resolved reflectance model placed in the shading frame of a hit.
#[derive(Debug, Clone)]
pub struct BSDF {
    bxdf: BxDF,
    shading_frame: Frame,
    terminate_secondary: bool,
}

impl BSDF {
    /// Degenerate tangents fall back to an arbitrary perpendicular.
    pub fn new(ns: Normal3f, tangent: Vec3f, bxdf: BxDF) -> BSDF {
        BSDF {
            bxdf,
            shading_frame: Frame::from_shading(ns, tangent),
            terminate_secondary: false,
        }
    }

    /// Marks a model whose parameters were taken at the hero wavelength.
    pub fn with_terminate_secondary(mut self, terminate: bool) -> BSDF {
        self.terminate_secondary = terminate;
        self
    }

    pub fn terminates_secondary(&self) -> bool {
        self.terminate_secondary
    }

    pub fn bxdf(&self) -> &BxDF {
        &self.bxdf
    }

    pub fn flags(&self) -> BxDFFlags {
        self.bxdf.flags()
    }

    /// Whether every lobe is a delta distribution, so light sampling can
    /// never contribute.
    pub fn is_specular(&self) -> bool {
        let flags = self.flags();
        flags.is_specular() && !flags.is_non_specular()
    }

    pub fn render_to_local(&self, v: Vec3f) -> Vec3f {
        self.shading_frame.localize(v)
    }

    pub fn local_to_render(&self, v: Vec3f) -> Vec3f {
        self.shading_frame.globalize(v)
    }

    pub fn f(&self, wo_render: Vec3f, wi_render: Vec3f) -> SampledSpectrum {
        let wi = self.render_to_local(wi_render);
        let wo = self.render_to_local(wo_render);

        if wo.z == 0.0 {
            return SampledSpectrum::from_const(0.0);
        }

        self.bxdf.f(wo, wi)
    }

    pub fn sample_f(&self, wo_render: Vec3f, u: Float, u2: Point2f) -> Option<BSDFSample> {
        let wo = self.render_to_local(wo_render);
        if wo.z == 0.0 || self.bxdf.flags() == BxDFFlags::UNSET {
            return None;
        }

        let mut bs = self.bxdf.sample_f(wo, u, u2)?;
        if bs.f.is_zero() || bs.pdf == 0.0 || bs.wi.z == 0.0 {
            return None;
        }

        debug_assert!(bs.pdf >= 0.0);

        bs.wi = self.local_to_render(bs.wi);
        bs.terminate_secondary = self.terminate_secondary;
        Some(bs)
    }

    pub fn pdf(&self, wo_render: Vec3f, wi_render: Vec3f) -> Float {
        let wo = self.render_to_local(wo_render);
        let wi = self.render_to_local(wi_render);
        if wo.z == 0.0 {
            return 0.0;
        }

        self.bxdf.pdf(wo, wi)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::bxdf::DiffuseBxDF;

    #[test]
    fn world_and_local_agree() {
        let n = Normal3f::new(0.0, 1.0, 0.0);
        let bsdf = BSDF::new(n, Vec3f::new(1.0, 0.0, 0.0), BxDF::Diffuse(DiffuseBxDF::new(SampledSpectrum::from_const(0.5))));

        let wo = Vec3f::new(0.0, 1.0, 1.0).normalize();
        let bs = bsdf.sample_f(wo, 0.5, Point2f::new(0.3, 0.6)).unwrap();
        assert!(bs.wi.y > 0.0);
        assert_abs_diff_eq!(bsdf.pdf(wo, bs.wi), bs.pdf, epsilon = 1e-5);
        assert_abs_diff_eq!(bsdf.f(wo, bs.wi)[0], 0.5 * FRAC_1_PI, epsilon = 1e-6);

        // Below the surface nothing is reflected.
        assert!(bsdf.f(wo, Vec3f::new(0.0, -1.0, 0.0)).is_zero());
    }

    #[test]
    fn degenerate_tangent() {
        let n = Normal3f::new(0.0, 0.0, 1.0);
        let bsdf = BSDF::new(n, Vec3f::new(0.0, 0.0, 2.0), BxDF::Diffuse(DiffuseBxDF::new(SampledSpectrum::from_const(0.5))));
        let local = bsdf.render_to_local(Vec3f::new(0.0, 0.0, 1.0));
        assert_abs_diff_eq!(local, Vec3f::new(0.0, 0.0, 1.0), epsilon = 1e-5);
    }
}
