use crate::color::SampledSpectrum;
use crate::math::*;

pub mod conductor;
pub mod dielectric;
pub mod diffuse;
pub mod diffuse_transmission;
pub mod metallic_workflow;
pub mod thin_dielectric;

pub use conductor::ConductorBxDF;
pub use dielectric::DielectricBxDF;
pub use diffuse::DiffuseBxDF;
pub use diffuse_transmission::DiffuseTransmissionBxDF;
pub use metallic_workflow::MetallicWorkflowBxDF;
pub use thin_dielectric::ThinDielectricBxDF;

/// A reflectance model in its local shading frame, normal along `+z`.
/// Radiance transport only.
pub trait AbstractBxDF {
    fn f(&self, wo: Vec3f, wi: Vec3f) -> SampledSpectrum;

    fn sample_f(&self, wo: Vec3f, uc: Float, u: Point2f) -> Option<BSDFSample>;

    /// Solid angle density of [`AbstractBxDF::sample_f`] producing `wi`.
    /// Zero for directions only a specular lobe reaches.
    fn pdf(&self, wo: Vec3f, wi: Vec3f) -> Float;

    fn flags(&self) -> BxDFFlags;
}

#[derive(Debug, Clone)]
pub enum BxDF {
    Diffuse(DiffuseBxDF),
    DiffuseTransmission(DiffuseTransmissionBxDF),
    Conductor(ConductorBxDF),
    Dielectric(DielectricBxDF),
    ThinDielectric(ThinDielectricBxDF),
    MetallicWorkflow(MetallicWorkflowBxDF),
}

impl AbstractBxDF for BxDF {
    fn f(&self, wo: Vec3f, wi: Vec3f) -> SampledSpectrum {
        match self {
            BxDF::Diffuse(v) => v.f(wo, wi),
            BxDF::DiffuseTransmission(v) => v.f(wo, wi),
            BxDF::Conductor(v) => v.f(wo, wi),
            BxDF::Dielectric(v) => v.f(wo, wi),
            BxDF::ThinDielectric(v) => v.f(wo, wi),
            BxDF::MetallicWorkflow(v) => v.f(wo, wi),
        }
    }

    fn sample_f(&self, wo: Vec3f, uc: Float, u: Point2f) -> Option<BSDFSample> {
        match self {
            BxDF::Diffuse(v) => v.sample_f(wo, uc, u),
            BxDF::DiffuseTransmission(v) => v.sample_f(wo, uc, u),
            BxDF::Conductor(v) => v.sample_f(wo, uc, u),
            BxDF::Dielectric(v) => v.sample_f(wo, uc, u),
            BxDF::ThinDielectric(v) => v.sample_f(wo, uc, u),
            BxDF::MetallicWorkflow(v) => v.sample_f(wo, uc, u),
        }
    }

    fn pdf(&self, wo: Vec3f, wi: Vec3f) -> Float {
        match self {
            BxDF::Diffuse(v) => v.pdf(wo, wi),
            BxDF::DiffuseTransmission(v) => v.pdf(wo, wi),
            BxDF::Conductor(v) => v.pdf(wo, wi),
            BxDF::Dielectric(v) => v.pdf(wo, wi),
            BxDF::ThinDielectric(v) => v.pdf(wo, wi),
            BxDF::MetallicWorkflow(v) => v.pdf(wo, wi),
        }
    }

    fn flags(&self) -> BxDFFlags {
        match self {
            BxDF::Diffuse(v) => v.flags(),
            BxDF::DiffuseTransmission(v) => v.flags(),
            BxDF::Conductor(v) => v.flags(),
            BxDF::Dielectric(v) => v.flags(),
            BxDF::ThinDielectric(v) => v.flags(),
            BxDF::MetallicWorkflow(v) => v.flags(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BSDFSample {
    pub f: SampledSpectrum,
    pub wi: Vec3f,
    pub pdf: Float,
    pub flags: BxDFFlags,
    /// Relative IOR along a transmitted path, 1 otherwise
    pub eta: Float,
    /// The outcome depended on the hero wavelength alone.
    pub terminate_secondary: bool,
}

impl BSDFSample {
    pub fn new(f: SampledSpectrum, wi: Vec3f, pdf: Float, flags: BxDFFlags) -> BSDFSample {
        BSDFSample { f, wi, pdf, flags, eta: 1.0, terminate_secondary: false }
    }

    pub fn new_with_eta(f: SampledSpectrum, wi: Vec3f, pdf: Float, flags: BxDFFlags, eta: Float) -> BSDFSample {
        BSDFSample { f, wi, pdf, flags, eta, terminate_secondary: false }
    }

    pub fn is_reflection(&self) -> bool {
        self.flags.is_reflective()
    }

    pub fn is_transmission(&self) -> bool {
        self.flags.is_transmissive()
    }

    pub fn is_specular(&self) -> bool {
        self.flags.is_specular()
    }
}

bitflags::bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct BxDFFlags: u8 {
        const UNSET = 0;
        const REFLECTION = 1 << 0;
        const TRANSMISSION = 1 << 1;
        const DIFFUSE = 1 << 2;
        const GLOSSY = 1 << 3;
        const SPECULAR = 1 << 4;
        const DIFFUSE_REFLECTION = Self::DIFFUSE.bits() | Self::REFLECTION.bits();
        const DIFFUSE_TRANSMISSION = Self::DIFFUSE.bits() | Self::TRANSMISSION.bits();
        const GLOSSY_REFLECTION = Self::GLOSSY.bits() | Self::REFLECTION.bits();
        const GLOSSY_TRANSMISSION = Self::GLOSSY.bits() | Self::TRANSMISSION.bits();
        const SPECULAR_REFLECTION = Self::SPECULAR.bits() | Self::REFLECTION.bits();
        const SPECULAR_TRANSMISSION = Self::SPECULAR.bits() | Self::TRANSMISSION.bits();
    }
}

impl BxDFFlags {
    pub fn is_reflective(&self) -> bool {
        self.intersects(Self::REFLECTION)
    }

    pub fn is_transmissive(&self) -> bool {
        self.intersects(Self::TRANSMISSION)
    }

    pub fn is_diffuse(&self) -> bool {
        self.intersects(Self::DIFFUSE)
    }

    pub fn is_glossy(&self) -> bool {
        self.intersects(Self::GLOSSY)
    }

    pub fn is_specular(&self) -> bool {
        self.intersects(Self::SPECULAR)
    }

    pub fn is_non_specular(&self) -> bool {
        self.intersects(Self::DIFFUSE | Self::GLOSSY)
    }
}

/// Probabilities of choosing reflection over transmission, normalized.
/// [`None`] when both are zero.
#[inline]
pub(crate) fn lobe_split(pr: Float, pt: Float) -> Option<(Float, Float)> {
    let sum = pr + pt;
    if sum <= 0.0 {
        return None;
    }
    Some((pr / sum, pt / sum))
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::math::sampling::{sample_uniform_sphere, uniform_sphere_pdf};
    use crate::math::scattering::TrowbridgeReitzDistribution;

    fn models() -> Vec<(&'static str, BxDF)> {
        let s = SampledSpectrum::from_const;
        let tr = TrowbridgeReitzDistribution::new;
        vec![
            ("diffuse", BxDF::Diffuse(DiffuseBxDF::new(s(0.8)))),
            ("diffuse_transmission", BxDF::DiffuseTransmission(DiffuseTransmissionBxDF::new(s(0.4), s(0.5)))),
            ("rough_conductor", BxDF::Conductor(ConductorBxDF::new(tr(0.3, 0.3), s(0.2), s(3.9)))),
            ("anisotropic_conductor", BxDF::Conductor(ConductorBxDF::new(tr(0.1, 0.5), s(1.1), s(2.5)))),
            ("smooth_conductor", BxDF::Conductor(ConductorBxDF::new(tr(0.0, 0.0), s(0.2), s(3.9)))),
            ("rough_dielectric", BxDF::Dielectric(DielectricBxDF::new(1.5, tr(0.3, 0.3)))),
            ("smooth_dielectric", BxDF::Dielectric(DielectricBxDF::new(1.5, tr(0.0, 0.0)))),
            ("thin_dielectric", BxDF::ThinDielectric(ThinDielectricBxDF::new(1.5))),
            ("rough_metallic", BxDF::MetallicWorkflow(MetallicWorkflowBxDF::new(s(0.7), 0.3, tr(0.4, 0.4)))),
            ("smooth_metallic", BxDF::MetallicWorkflow(MetallicWorkflowBxDF::new(s(0.7), 0.6, tr(0.0, 0.0)))),
        ]
    }

    fn outgoing(rng: &mut SmallRng) -> Vec3f {
        loop {
            let w = sample_uniform_sphere(Point2f::new(rng.gen(), rng.gen()));
            if w.z.abs() > 0.05 {
                return w;
            }
        }
    }

    #[test]
    fn sampled_pdf_matches_pdf() {
        let mut rng = SmallRng::seed_from_u64(7);
        for (name, bxdf) in models() {
            for _ in 0..2000 {
                let wo = outgoing(&mut rng);
                let Some(bs) = bxdf.sample_f(wo, rng.gen(), Point2f::new(rng.gen(), rng.gen())) else {
                    continue;
                };
                assert!(bs.pdf > 0.0, "{name}: non-positive pdf");
                assert!(!bs.f.has_nan(), "{name}: NaN value");
                if bs.is_specular() {
                    assert_eq!(bxdf.pdf(wo, bs.wi), 0.0, "{name}: specular direction has density");
                    continue;
                }
                let pdf = bxdf.pdf(wo, bs.wi);
                assert!(
                    (pdf - bs.pdf).abs() <= 1e-3 * bs.pdf.max(1.0),
                    "{name}: pdf {pdf} != sampled {}",
                    bs.pdf
                );
                let f = bxdf.f(wo, bs.wi);
                assert!(
                    (f[0] - bs.f[0]).abs() <= 1e-3 * bs.f[0].max(1.0),
                    "{name}: f {} != sampled {}",
                    f[0],
                    bs.f[0]
                );
            }
        }
    }

    #[test]
    fn weak_energy_conservation() {
        let mut rng = SmallRng::seed_from_u64(11);
        for (name, bxdf) in models() {
            for _ in 0..8 {
                // Radiance leaving a dense medium is scaled up by 1/eta^2,
                // so only the outside hemisphere is bounded by one.
                let wo = outgoing(&mut rng);
                let wo = Vec3f::new(wo.x, wo.y, wo.z.abs());
                let n = 20_000;
                let mut sum = 0.0;
                for _ in 0..n {
                    if let Some(bs) = bxdf.sample_f(wo, rng.gen(), Point2f::new(rng.gen(), rng.gen())) {
                        sum += bs.f[0] * abs_cos_theta(bs.wi) / bs.pdf;
                    }
                }
                let albedo = sum / n as Float;
                assert!(albedo <= 1.02, "{name}: albedo {albedo} for wo {wo:?}");
            }
        }
    }

    #[test]
    fn uniform_estimate_agrees_with_importance_estimate() {
        let mut rng = SmallRng::seed_from_u64(3);
        let wo = Vec3f::new(0.3, -0.2, 0.9).normalize();
        for (name, bxdf) in models() {
            if bxdf.flags().is_specular() || matches!(name, "anisotropic_conductor" | "rough_dielectric") {
                continue;
            }
            let n = 200_000;
            let mut uniform = 0.0;
            let mut importance = 0.0;
            for _ in 0..n {
                let wi = sample_uniform_sphere(Point2f::new(rng.gen(), rng.gen()));
                uniform += bxdf.f(wo, wi)[0] * abs_cos_theta(wi) / uniform_sphere_pdf();
                if let Some(bs) = bxdf.sample_f(wo, rng.gen(), Point2f::new(rng.gen(), rng.gen())) {
                    importance += bs.f[0] * abs_cos_theta(bs.wi) / bs.pdf;
                }
            }
            let (uniform, importance) = (uniform / n as Float, importance / n as Float);
            assert!((uniform - importance).abs() < 0.03, "{name}: {uniform} vs {importance}");
        }
    }

    #[test]
    fn flags() {
        let f = BxDFFlags::GLOSSY_TRANSMISSION;
        assert!(f.is_transmissive() && f.is_glossy() && f.is_non_specular());
        assert!(!f.is_reflective() && !f.is_specular());
        assert_eq!(lobe_split(0.0, 0.0), None);
        assert_eq!(lobe_split(1.0, 3.0), Some((0.25, 0.75)));
    }

    #[test]
    fn index_matched_dielectric_passes_straight_through() {
        let rough = BxDF::Dielectric(DielectricBxDF::new(1.0, TrowbridgeReitzDistribution::new(0.5, 0.5)));
        assert_eq!(rough.flags(), BxDFFlags::SPECULAR_TRANSMISSION);

        let wo = Vec3f::new(0.3, -0.2, 0.8).normalize();
        let bs = rough.sample_f(wo, 0.7, Point2f::new(0.4, 0.9)).unwrap();
        assert!(bs.is_specular());
        assert!((bs.wi + wo).length() < 1e-5);
        assert_eq!(rough.pdf(wo, bs.wi), 0.0);
    }
}
