use crate::bsdf::BSDF;
use crate::bxdf::AbstractBxDF;
use crate::color::{AbstractSpectrumEvaluator, SampledWavelengths, Spectra};
use crate::error::{SceneError, SceneResult};
use crate::math::hashing::{hash_point_pair, hash_to_unit};
use crate::math::*;
use crate::primitive::Hit;
use crate::scene::{MaterialId, MaterialType, SpectrumId, TextureId};
use crate::texture::{AbstractTextureEvaluator, Textures};

pub mod conductor;
pub mod dielectric;
pub mod diffuse;
pub mod diffuse_transmission;
pub mod metallic_workflow;
pub mod mix;
pub mod thin_dielectric;

pub use conductor::ConductorMaterial;
pub use dielectric::DielectricMaterial;
pub use diffuse::DiffuseMaterial;
pub use diffuse_transmission::DiffuseTransmissionMaterial;
pub use metallic_workflow::MetallicWorkflowMaterial;
pub use mix::MixMaterial;
pub use thin_dielectric::ThinDielectricMaterial;

/// Longest chain of nested mix materials a lookup resolves.
pub const MAX_MIX_DEPTH: usize = 16;

/// Everything texture and spectrum lookups need.
pub trait MaterialEvaluator: AbstractTextureEvaluator + AbstractSpectrumEvaluator {}

impl<T: AbstractTextureEvaluator + AbstractSpectrumEvaluator> MaterialEvaluator for T {}

pub trait AbstractMaterial {
    type ConcreteBxDF: AbstractBxDF;

    fn get_bxdf<E: MaterialEvaluator>(
        &self,
        eval: &E,
        ctx: &MaterialEvalContext,
        lambda: &SampledWavelengths,
    ) -> Self::ConcreteBxDF;

    fn get_bsdf<E: MaterialEvaluator>(
        &self,
        eval: &E,
        ctx: &MaterialEvalContext,
        lambda: &SampledWavelengths,
    ) -> BSDF;
}

#[derive(Debug, Clone, Copy)]
pub struct MaterialEvalContext {
    pub p: Point3f,
    pub uv: Point2f,
    pub ns: Normal3f,
    pub tangent: Vec3f,
}

impl From<&Hit> for MaterialEvalContext {
    fn from(hit: &Hit) -> Self {
        MaterialEvalContext { p: hit.p, uv: hit.uv, ns: hit.n, tangent: hit.tangent }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Materials {
    diffuse: Vec<DiffuseMaterial>,
    diffuse_transmission: Vec<DiffuseTransmissionMaterial>,
    conductor: Vec<ConductorMaterial>,
    dielectric: Vec<DielectricMaterial>,
    thin_dielectric: Vec<ThinDielectricMaterial>,
    metallic_workflow: Vec<MetallicWorkflowMaterial>,
    mix: Vec<MixMaterial>,
}

macro_rules! add_material {
    ($fn:ident, $field:ident, $ty:ident, $variant:ident) => {
        pub fn $fn(&mut self, material: $ty) -> MaterialId {
            let id = MaterialId::new(MaterialType::$variant, self.$field.len());
            self.$field.push(material);
            id
        }
    };
}

impl Materials {
    add_material!(add_diffuse, diffuse, DiffuseMaterial, Diffuse);
    add_material!(add_diffuse_transmission, diffuse_transmission, DiffuseTransmissionMaterial, DiffuseTransmit);
    add_material!(add_conductor, conductor, ConductorMaterial, Conductor);
    add_material!(add_dielectric, dielectric, DielectricMaterial, Dielectric);
    add_material!(add_thin_dielectric, thin_dielectric, ThinDielectricMaterial, ThinDielectric);
    add_material!(add_metallic_workflow, metallic_workflow, MetallicWorkflowMaterial, MetallicWorkflow);
    add_material!(add_mix, mix, MixMaterial, Mix);

    pub fn contains(&self, material: MaterialId) -> bool {
        let len = match material.ty() {
            MaterialType::Diffuse => self.diffuse.len(),
            MaterialType::DiffuseTransmit => self.diffuse_transmission.len(),
            MaterialType::Conductor => self.conductor.len(),
            MaterialType::Dielectric => self.dielectric.len(),
            MaterialType::ThinDielectric => self.thin_dielectric.len(),
            MaterialType::MetallicWorkflow => self.metallic_workflow.len(),
            MaterialType::Mix => self.mix.len(),
        };
        material.idx() < len
    }

    pub fn mix(&self, material: MaterialId) -> Option<&MixMaterial> {
        match material.ty() {
            MaterialType::Mix => self.mix.get(material.idx()),
            _ => None,
        }
    }

    /// Follows mix materials down to a concrete one. Each mix picks a side
    /// by comparing its amount with a hash of the hit point and both
    /// candidates, so the choice is stable for a given point.
    pub fn resolve<E: MaterialEvaluator>(&self, eval: &E, material: MaterialId, p: Point3f, uv: Point2f) -> MaterialId {
        let mut current = material;
        for _ in 0..MAX_MIX_DEPTH {
            let Some(mix) = self.mix(current) else {
                return current;
            };
            let u = hash_to_unit(hash_point_pair(p, mix.materials[0].raw(), mix.materials[1].raw()));
            current = mix.choose(eval, uv, u);
        }
        assert!(self.mix(current).is_none(), "mix materials nest deeper than {MAX_MIX_DEPTH}");
        current
    }

    /// The scattering function at a hit. Mixes are resolved first.
    pub fn get_bsdf<E: MaterialEvaluator>(
        &self,
        eval: &E,
        material: MaterialId,
        ctx: &MaterialEvalContext,
        lambda: &SampledWavelengths,
    ) -> BSDF {
        let material = self.resolve(eval, material, ctx.p, ctx.uv);
        let idx = material.idx();
        match material.ty() {
            MaterialType::Diffuse => self.diffuse[idx].get_bsdf(eval, ctx, lambda),
            MaterialType::DiffuseTransmit => self.diffuse_transmission[idx].get_bsdf(eval, ctx, lambda),
            MaterialType::Conductor => self.conductor[idx].get_bsdf(eval, ctx, lambda),
            MaterialType::Dielectric => self.dielectric[idx].get_bsdf(eval, ctx, lambda),
            MaterialType::ThinDielectric => self.thin_dielectric[idx].get_bsdf(eval, ctx, lambda),
            MaterialType::MetallicWorkflow => self.metallic_workflow[idx].get_bsdf(eval, ctx, lambda),
            MaterialType::Mix => unreachable!("mix materials are resolved above"),
        }
    }

    /// Checks every texture and spectrum a material refers to, and that mix
    /// chains are acyclic and no deeper than [`MAX_MIX_DEPTH`].
    pub(crate) fn validate(&self, textures: &Textures, spectra: &Spectra) -> SceneResult<()> {
        let texture = |t: TextureId| if textures.contains(t) { Ok(()) } else { Err(SceneError::InvalidTexture(t)) };
        let spectrum = |s: SpectrumId| if spectra.contains(s) { Ok(()) } else { Err(SceneError::InvalidSpectrum(s)) };

        for m in &self.diffuse {
            texture(m.reflectance)?;
        }
        for m in &self.diffuse_transmission {
            texture(m.reflectance)?;
            texture(m.transmittance)?;
        }
        for m in &self.conductor {
            [m.ior_re, m.ior_im, m.u_roughness, m.v_roughness].into_iter().try_for_each(texture)?;
        }
        for m in &self.dielectric {
            spectrum(m.ior)?;
            texture(m.u_roughness)?;
            texture(m.v_roughness)?;
        }
        for m in &self.thin_dielectric {
            spectrum(m.ior)?;
        }
        for m in &self.metallic_workflow {
            [m.base_color, m.metallic, m.u_roughness, m.v_roughness].into_iter().try_for_each(texture)?;
        }

        for (i, m) in self.mix.iter().enumerate() {
            texture(m.amount)?;
            let mut pending: Vec<(MaterialId, usize)> = vec![(MaterialId::new(MaterialType::Mix, i), 0)];
            while let Some((id, depth)) = pending.pop() {
                if !self.contains(id) {
                    return Err(SceneError::InvalidMaterial(id));
                }
                if let Some(mix) = self.mix(id) {
                    if depth >= MAX_MIX_DEPTH {
                        return Err(SceneError::MixDepth(MAX_MIX_DEPTH));
                    }
                    pending.extend(mix.materials.iter().map(|&m| (m, depth + 1)));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::SampledSpectrum;

    #[derive(Default)]
    struct Eval {
        spectra: Spectra,
        textures: Textures,
    }

    impl Eval {
        fn constant(&mut self, value: Float) -> TextureId {
            let s = self.spectra.add_constant(value);
            self.textures.add_constant(s)
        }
    }

    impl AbstractSpectrumEvaluator for Eval {
        fn sample(&self, spectrum: SpectrumId, lambda: &SampledWavelengths) -> SampledSpectrum {
            self.spectra.sample(spectrum, lambda)
        }

        fn is_constant(&self, spectrum: SpectrumId) -> bool {
            self.spectra.is_constant(spectrum)
        }
    }

    impl AbstractTextureEvaluator for Eval {
        fn evaluate(&self, texture: TextureId, uv: Point2f, lambda: &SampledWavelengths) -> SampledSpectrum {
            self.textures.evaluate(&self.spectra, texture, uv, lambda)
        }

        fn evaluate_float(&self, texture: TextureId, uv: Point2f) -> Float {
            self.textures.evaluate_float(&self.spectra, texture, uv)
        }
    }

    fn ctx(p: Point3f) -> MaterialEvalContext {
        MaterialEvalContext {
            p,
            uv: Point2f::new(0.5, 0.5),
            ns: Normal3f::new(0.0, 0.0, 1.0),
            tangent: Vec3f::new(1.0, 0.0, 0.0),
        }
    }

    fn nested_mix(eval: &mut Eval, materials: &mut Materials, depth: usize) -> MaterialId {
        let red = eval.constant(0.8);
        let half = eval.constant(0.5);
        let mut m = materials.add_diffuse(DiffuseMaterial { reflectance: red });
        for _ in 0..depth {
            let other = materials.add_diffuse(DiffuseMaterial { reflectance: half });
            m = materials.add_mix(MixMaterial { materials: [m, other], amount: half });
        }
        m
    }

    #[test]
    fn resolve_never_returns_mix() {
        let mut eval = Eval::default();
        let mut materials = Materials::default();
        let root = nested_mix(&mut eval, &mut materials, MAX_MIX_DEPTH);

        for i in 0..200 {
            let p = Point3f::new(i as Float * 0.37, (i % 7) as Float, -(i as Float) * 0.11);
            let m = materials.resolve(&eval, root, p, Point2f::new(0.5, 0.5));
            assert_ne!(m.ty(), MaterialType::Mix);
            assert!(materials.contains(m));
        }
    }

    #[test]
    fn resolve_is_deterministic_per_point() {
        let mut eval = Eval::default();
        let mut materials = Materials::default();
        let root = nested_mix(&mut eval, &mut materials, 4);

        let p = Point3f::new(0.25, -1.5, 3.0);
        let first = materials.resolve(&eval, root, p, Point2f::new(0.5, 0.5));
        for _ in 0..10 {
            assert_eq!(materials.resolve(&eval, root, p, Point2f::new(0.5, 0.5)), first);
        }
    }

    #[test]
    fn mix_picks_both_sides_at_half() {
        let mut eval = Eval::default();
        let mut materials = Materials::default();
        let root = nested_mix(&mut eval, &mut materials, 1);
        let Some(mix) = materials.mix(root).cloned() else { panic!("expected a mix") };

        let mut second = 0;
        let n = 2000;
        for i in 0..n {
            let p = Point3f::new(i as Float, 0.5 * i as Float, 1.0);
            if materials.resolve(&eval, root, p, Point2f::new(0.5, 0.5)) == mix.materials[1] {
                second += 1;
            }
        }
        let frac = second as Float / n as Float;
        assert!((frac - 0.5).abs() < 0.05, "fraction {frac}");
    }

    #[test]
    fn mix_amount_extremes() {
        let mut eval = Eval::default();
        let mut materials = Materials::default();
        let zero = eval.constant(0.0);
        let one = eval.constant(1.0);
        let a = materials.add_diffuse(DiffuseMaterial { reflectance: one });
        let b = materials.add_diffuse(DiffuseMaterial { reflectance: zero });

        let mix = MixMaterial { materials: [a, b], amount: zero };
        assert_eq!(mix.choose(&eval, Point2f::new(0.0, 0.0), 0.0), a);
        let mix = MixMaterial { materials: [a, b], amount: one };
        assert_eq!(mix.choose(&eval, Point2f::new(0.0, 0.0), 0.999), b);
    }

    #[test]
    fn dispersive_dielectric_terminates_secondary() {
        let mut eval = Eval::default();
        let mut materials = Materials::default();
        let smooth = eval.constant(0.0);
        let glass = eval.spectra.add_constant(1.5);
        let prism = eval.spectra.add_cauchy(1.5, 0.01);

        let plain = materials.add_dielectric(DielectricMaterial { ior: glass, u_roughness: smooth, v_roughness: smooth });
        let dispersive = materials.add_dielectric(DielectricMaterial { ior: prism, u_roughness: smooth, v_roughness: smooth });

        let lambda = SampledWavelengths::sample_visible(0.3);
        let c = ctx(Point3f::new(0.0, 0.0, 0.0));
        assert!(!materials.get_bsdf(&eval, plain, &c, &lambda).terminates_secondary());
        assert!(materials.get_bsdf(&eval, dispersive, &c, &lambda).terminates_secondary());
    }

    #[test]
    fn diffuse_bsdf_uses_reflectance() {
        let mut eval = Eval::default();
        let mut materials = Materials::default();
        let r = eval.constant(0.5);
        let m = materials.add_diffuse(DiffuseMaterial { reflectance: r });

        let lambda = SampledWavelengths::sample_visible(0.5);
        let bsdf = materials.get_bsdf(&eval, m, &ctx(Point3f::new(1.0, 2.0, 3.0)), &lambda);
        let wo = Vec3f::new(0.0, 0.0, 1.0);
        let wi = Vec3f::new(0.6, 0.0, 0.8);
        let f = bsdf.f(wo, wi);
        for i in 0..f.len() {
            approx::assert_relative_eq!(f[i], 0.5 * FRAC_1_PI, epsilon = 1e-5);
        }
    }

    #[test]
    fn validate_bounds_mix_depth() {
        let mut eval = Eval::default();
        let mut materials = Materials::default();
        nested_mix(&mut eval, &mut materials, MAX_MIX_DEPTH);
        assert!(materials.validate(&eval.textures, &eval.spectra).is_ok());

        let mut materials = Materials::default();
        nested_mix(&mut eval, &mut materials, MAX_MIX_DEPTH + 1);
        assert_eq!(
            materials.validate(&eval.textures, &eval.spectra),
            Err(SceneError::MixDepth(MAX_MIX_DEPTH)),
        );
    }
}
