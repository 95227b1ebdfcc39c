use crate::bxdf::{lobe_split, AbstractBxDF, BSDFSample, BxDFFlags};
use crate::color::SampledSpectrum;
use crate::math::scattering::{fr_dielectric, reflect, refract, TrowbridgeReitzDistribution};
use crate::math::*;

/// Interface between two dielectrics with relative IOR `eta`, smooth or
/// rough. Wavelength dependent IORs are resolved at the hero wavelength by
/// the material before this is built.
#[derive(Debug, Clone)]
pub struct DielectricBxDF {
    eta: Float,
    mf_distribution: TrowbridgeReitzDistribution,
}

/// Generalized half vector of a rough dielectric pair, oriented to `+z`.
struct HalfVector {
    wm: Vec3f,
    etap: Float,
    reflect: bool,
}

impl DielectricBxDF {
    pub fn new(eta: Float, mf_distribution: TrowbridgeReitzDistribution) -> DielectricBxDF {
        DielectricBxDF { eta, mf_distribution }
    }

    fn half_vector(&self, wo: Vec3f, wi: Vec3f) -> Option<HalfVector> {
        let cos_theta_o = cos_theta(wo);
        let cos_theta_i = cos_theta(wi);
        let reflect = cos_theta_i * cos_theta_o > 0.0;
        let etap = match (reflect, cos_theta_o > 0.0) {
            (true, _) => 1.0,
            (false, true) => self.eta,
            (false, false) => 1.0 / self.eta,
        };

        let wm = wi * etap + wo;
        if cos_theta_i == 0.0 || cos_theta_o == 0.0 || wm.length_squared() == 0.0 {
            return None;
        }
        let wm = wm.normalize().facing(Vec3f::new(0.0, 0.0, 1.0));

        // Discard back-facing microfacets.
        if wm.dot(wi) * cos_theta_i < 0.0 || wm.dot(wo) * cos_theta_o < 0.0 {
            return None;
        }

        Some(HalfVector { wm, etap, reflect })
    }

    fn is_smooth(&self) -> bool {
        self.eta == 1.0 || self.mf_distribution.effectively_smooth()
    }

    fn sample_smooth(&self, wo: Vec3f, uc: Float) -> Option<BSDFSample> {
        let r = fr_dielectric(cos_theta(wo), self.eta);
        let (pr, _) = lobe_split(r, 1.0 - r)?;

        if uc < pr {
            let wi = Vec3f::new(-wo.x, -wo.y, wo.z);
            let fr = SampledSpectrum::from_const(r / abs_cos_theta(wi));
            Some(BSDFSample::new(fr, wi, pr, BxDFFlags::SPECULAR_REFLECTION))
        } else {
            let (wi, etap) = refract(wo, Vec3f::new(0.0, 0.0, 1.0), self.eta)?;
            let ft = SampledSpectrum::from_const((1.0 - r) / abs_cos_theta(wi) / sqr(etap));
            Some(BSDFSample::new_with_eta(ft, wi, 1.0 - pr, BxDFFlags::SPECULAR_TRANSMISSION, etap))
        }
    }
}

impl AbstractBxDF for DielectricBxDF {
    fn f(&self, wo: Vec3f, wi: Vec3f) -> SampledSpectrum {
        if self.is_smooth() {
            return SampledSpectrum::from_const(0.0);
        }
        let Some(HalfVector { wm, etap, reflect }) = self.half_vector(wo, wi) else {
            return SampledSpectrum::from_const(0.0);
        };

        let f = fr_dielectric(wo.dot(wm), self.eta);
        let (cos_theta_o, cos_theta_i) = (cos_theta(wo), cos_theta(wi));
        let d = self.mf_distribution.d(wm);
        let g = self.mf_distribution.g(wo, wi);
        if reflect {
            SampledSpectrum::from_const(d * g * f / (4.0 * cos_theta_i * cos_theta_o).abs())
        } else {
            let denom = sqr(wi.dot(wm) + wo.dot(wm) / etap) * cos_theta_i * cos_theta_o;
            let ft = d * (1.0 - f) * g * (wi.dot(wm) * wo.dot(wm) / denom).abs();
            SampledSpectrum::from_const(ft / sqr(etap))
        }
    }

    fn sample_f(&self, wo: Vec3f, uc: Float, u: Point2f) -> Option<BSDFSample> {
        if self.is_smooth() {
            return self.sample_smooth(wo, uc);
        }

        // Visible normals are sampled for the upper hemisphere and mirrored.
        let flip = if wo.z < 0.0 { -1.0 } else { 1.0 };
        let wm = self.mf_distribution.sample_wm(wo * flip, u) * flip;
        let r = fr_dielectric(wo.dot(wm), self.eta);
        let (pr, _) = lobe_split(r, 1.0 - r)?;

        let wi = if uc < pr {
            let wi = reflect(wo, wm);
            if !same_hemisphere(wo, wi) {
                return None;
            }
            wi
        } else {
            let (wi, _) = refract(wo, wm, self.eta)?;
            if same_hemisphere(wo, wi) || wi.z == 0.0 {
                return None;
            }
            wi
        };

        let HalfVector { etap, reflect, .. } = self.half_vector(wo, wi)?;
        let pdf = self.pdf(wo, wi);
        if pdf == 0.0 {
            return None;
        }
        let f = self.f(wo, wi);
        debug_assert!(!pdf.is_nan());

        if reflect {
            Some(BSDFSample::new(f, wi, pdf, BxDFFlags::GLOSSY_REFLECTION))
        } else {
            Some(BSDFSample::new_with_eta(f, wi, pdf, BxDFFlags::GLOSSY_TRANSMISSION, etap))
        }
    }

    fn pdf(&self, wo: Vec3f, wi: Vec3f) -> Float {
        if self.is_smooth() {
            return 0.0;
        }
        let Some(HalfVector { wm, etap, reflect }) = self.half_vector(wo, wi) else {
            return 0.0;
        };

        let r = fr_dielectric(wo.dot(wm), self.eta);
        let Some((pr, pt)) = lobe_split(r, 1.0 - r) else {
            return 0.0;
        };

        // The visible normal density is evaluated on the side of `wo`.
        let flip = if wo.z < 0.0 { -1.0 } else { 1.0 };
        let pdf_wm = self.mf_distribution.pdf(wo * flip, wm);
        if reflect {
            pdf_wm / (4.0 * wo.dot(wm).abs()) * pr
        } else {
            let denom = sqr(wi.dot(wm) + wo.dot(wm) / etap);
            let dwm_dwi = wi.dot(wm).abs() / denom;
            pdf_wm * dwm_dwi * pt
        }
    }

    fn flags(&self) -> BxDFFlags {
        // Index matched interfaces pass light straight through at any
        // roughness.
        if self.eta == 1.0 {
            return BxDFFlags::SPECULAR_TRANSMISSION;
        }
        let flags = BxDFFlags::REFLECTION | BxDFFlags::TRANSMISSION;

        let mf = if self.mf_distribution.effectively_smooth() {
            BxDFFlags::SPECULAR
        } else {
            BxDFFlags::GLOSSY
        };

        flags | mf
    }
}
