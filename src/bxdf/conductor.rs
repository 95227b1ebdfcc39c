use crate::bxdf::{AbstractBxDF, BSDFSample, BxDFFlags};
use crate::color::SampledSpectrum;
use crate::math::scattering::{fresnel_complex_spectral, reflect, TrowbridgeReitzDistribution};
use crate::math::*;

/// Metal with a complex index of refraction `eta + i k`, smooth or rough.
#[derive(Debug, Clone)]
pub struct ConductorBxDF {
    mf_distribution: TrowbridgeReitzDistribution,
    eta: SampledSpectrum,
    k: SampledSpectrum,
}

impl ConductorBxDF {
    pub fn new(mf_distribution: TrowbridgeReitzDistribution, eta: SampledSpectrum, k: SampledSpectrum) -> ConductorBxDF {
        ConductorBxDF { mf_distribution, eta, k }
    }

    fn microfacet_f(&self, wo: Vec3f, wi: Vec3f, wm: Vec3f) -> SampledSpectrum {
        let cos_theta_o = abs_cos_theta(wo);
        let cos_theta_i = abs_cos_theta(wi);
        if cos_theta_i == 0.0 || cos_theta_o == 0.0 {
            return SampledSpectrum::from_const(0.0);
        }

        let f = fresnel_complex_spectral(wo.dot(wm).abs(), self.eta, self.k);
        f * (self.mf_distribution.d(wm) * self.mf_distribution.g(wo, wi) / (4.0 * cos_theta_o * cos_theta_i))
    }
}

impl AbstractBxDF for ConductorBxDF {
    fn f(&self, wo: Vec3f, wi: Vec3f) -> SampledSpectrum {
        if !same_hemisphere(wo, wi) || self.mf_distribution.effectively_smooth() {
            return SampledSpectrum::from_const(0.0);
        }

        let wm = wi + wo;
        if wm.length_squared() == 0.0 {
            return SampledSpectrum::from_const(0.0);
        }

        self.microfacet_f(wo, wi, wm.normalize())
    }

    fn sample_f(&self, wo: Vec3f, _uc: Float, u: Point2f) -> Option<BSDFSample> {
        if self.mf_distribution.effectively_smooth() {
            let wi = Vec3f::new(-wo.x, -wo.y, wo.z);
            let f = fresnel_complex_spectral(abs_cos_theta(wi), self.eta, self.k) / abs_cos_theta(wi);
            return Some(BSDFSample::new(f, wi, 1.0, BxDFFlags::SPECULAR_REFLECTION));
        }

        if wo.z == 0.0 {
            return None;
        }

        // Sample in the upper hemisphere and mirror back for `wo.z < 0`.
        let flip = if wo.z < 0.0 { -1.0 } else { 1.0 };
        let wo_up = wo * flip;
        let wm = self.mf_distribution.sample_wm(wo_up, u);
        let wi_up = reflect(wo_up, wm);
        if wi_up.z <= 0.0 {
            return None;
        }

        let pdf = self.mf_distribution.pdf(wo_up, wm) / (4.0 * wo_up.dot(wm).abs());
        let f = self.microfacet_f(wo_up, wi_up, wm);

        Some(BSDFSample::new(f, wi_up * flip, pdf, BxDFFlags::GLOSSY_REFLECTION))
    }

    fn pdf(&self, wo: Vec3f, wi: Vec3f) -> Float {
        if !same_hemisphere(wo, wi) || self.mf_distribution.effectively_smooth() {
            return 0.0;
        }

        let wm = wo + wi;
        if wm.length_squared() == 0.0 {
            return 0.0;
        }

        let flip = if wo.z < 0.0 { -1.0 } else { 1.0 };
        let wm = wm.normalize() * flip;
        self.mf_distribution.pdf(wo * flip, wm) / (4.0 * wo.dot(wm).abs())
    }

    fn flags(&self) -> BxDFFlags {
        if self.mf_distribution.effectively_smooth() {
            BxDFFlags::SPECULAR_REFLECTION
        } else {
            BxDFFlags::GLOSSY_REFLECTION
        }
    }
}
