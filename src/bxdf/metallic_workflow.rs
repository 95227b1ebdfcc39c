use crate::bxdf::{AbstractBxDF, BSDFSample, BxDFFlags};
use crate::color::SampledSpectrum;
use crate::math::sampling::{cosine_hemisphere_pdf, sample_cosine_hemisphere};
use crate::math::scattering::{fresnel_schlick, reflect, TrowbridgeReitzDistribution};
use crate::math::*;

/// Reflectance at normal incidence of the dielectric base.
const DIELECTRIC_F0: Float = 0.04;

/// Base color plus metalness: a GGX specular lobe with Schlick Fresnel
/// over a Lambertian lobe that fades out as `metallic` grows. The
/// specular lobe is picked with probability `(1 + metallic) / 2`.
#[derive(Debug, Clone)]
pub struct MetallicWorkflowBxDF {
    base_color: SampledSpectrum,
    metallic: Float,
    mf_distribution: TrowbridgeReitzDistribution,
}

impl MetallicWorkflowBxDF {
    pub fn new(base_color: SampledSpectrum, metallic: Float, mf_distribution: TrowbridgeReitzDistribution) -> Self {
        MetallicWorkflowBxDF { base_color, metallic: metallic.clamp(0.0, 1.0), mf_distribution }
    }

    fn f0(&self) -> SampledSpectrum {
        SampledSpectrum::from_const(DIELECTRIC_F0).lerp(&self.base_color, self.metallic)
    }

    #[inline]
    fn specular_probability(&self) -> Float {
        0.5 * (1.0 + self.metallic)
    }

    fn diffuse(&self, wo: Vec3f) -> SampledSpectrum {
        let f = fresnel_schlick(abs_cos_theta(wo), self.f0());
        self.base_color * ((1.0 - self.metallic) * (1.0 - f.max_component_value()) * FRAC_1_PI)
    }

    fn specular(&self, wo: Vec3f, wi: Vec3f) -> SampledSpectrum {
        let cos_theta_o = abs_cos_theta(wo);
        let cos_theta_i = abs_cos_theta(wi);
        let wm = wo + wi;
        if cos_theta_i == 0.0 || cos_theta_o == 0.0 || wm.length_squared() == 0.0 {
            return SampledSpectrum::from_const(0.0);
        }
        let wm = wm.normalize();

        let f = fresnel_schlick(wo.dot(wm).abs(), self.f0());
        f * (self.mf_distribution.d(wm) * self.mf_distribution.g(wo, wi) / (4.0 * cos_theta_o * cos_theta_i))
    }

    fn specular_pdf(&self, wo: Vec3f, wi: Vec3f) -> Float {
        let wm = wo + wi;
        if wm.length_squared() == 0.0 {
            return 0.0;
        }
        let flip = if wo.z < 0.0 { -1.0 } else { 1.0 };
        let wm = wm.normalize() * flip;
        self.mf_distribution.pdf(wo * flip, wm) / (4.0 * wo.dot(wm).abs())
    }
}

impl AbstractBxDF for MetallicWorkflowBxDF {
    fn f(&self, wo: Vec3f, wi: Vec3f) -> SampledSpectrum {
        if !same_hemisphere(wo, wi) {
            return SampledSpectrum::from_const(0.0);
        }

        let diffuse = self.diffuse(wo);
        if self.mf_distribution.effectively_smooth() {
            return diffuse;
        }
        diffuse + self.specular(wo, wi)
    }

    fn sample_f(&self, wo: Vec3f, uc: Float, u: Point2f) -> Option<BSDFSample> {
        if wo.z == 0.0 {
            return None;
        }
        let p_spec = self.specular_probability();
        let flip = if wo.z < 0.0 { -1.0 } else { 1.0 };

        if uc < p_spec && self.mf_distribution.effectively_smooth() {
            let wi = Vec3f::new(-wo.x, -wo.y, wo.z);
            let f = fresnel_schlick(abs_cos_theta(wo), self.f0()) / abs_cos_theta(wi);
            return Some(BSDFSample::new(f, wi, p_spec, BxDFFlags::SPECULAR_REFLECTION));
        }

        let (wi, flags) = if uc < p_spec {
            let wo_up = wo * flip;
            let wm = self.mf_distribution.sample_wm(wo_up, u);
            let wi_up = reflect(wo_up, wm);
            if wi_up.z <= 0.0 {
                return None;
            }
            (wi_up * flip, BxDFFlags::GLOSSY_REFLECTION)
        } else {
            let wi = sample_cosine_hemisphere(u) * flip;
            (wi, BxDFFlags::DIFFUSE_REFLECTION)
        };

        let pdf = self.pdf(wo, wi);
        if pdf == 0.0 {
            return None;
        }
        Some(BSDFSample::new(self.f(wo, wi), wi, pdf, flags))
    }

    fn pdf(&self, wo: Vec3f, wi: Vec3f) -> Float {
        if !same_hemisphere(wo, wi) {
            return 0.0;
        }

        let p_spec = self.specular_probability();
        let diffuse = (1.0 - p_spec) * cosine_hemisphere_pdf(abs_cos_theta(wi));
        if self.mf_distribution.effectively_smooth() {
            return diffuse;
        }
        diffuse + p_spec * self.specular_pdf(wo, wi)
    }

    fn flags(&self) -> BxDFFlags {
        let specular = if self.mf_distribution.effectively_smooth() {
            BxDFFlags::SPECULAR
        } else {
            BxDFFlags::GLOSSY
        };
        BxDFFlags::DIFFUSE_REFLECTION | specular
    }
}
