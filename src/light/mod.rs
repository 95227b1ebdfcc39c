use crate::color::{SampledSpectrum, SampledWavelengths};
use crate::math::*;
use crate::primitive::Hit;
use crate::scene::{LightId, LightType, Scene, SpectrumId};

pub mod area;
pub mod image_infinite;
pub mod sampler;
pub mod uniform_infinite;

pub use area::AreaLight;
pub use image_infinite::ImageInfiniteLight;
pub use uniform_infinite::UniformInfiniteLight;

/// Emitters. Spectra, shapes and transforms are resolved through the
/// scene they were registered in.
pub trait AbstractLight {
    /// Scalar emitted power, used to weight light selection.
    fn phi(&self, scene: &Scene) -> Float;

    /// Samples an incident direction at `p_ref` towards the light. The pdf
    /// is with respect to solid angle at `p_ref`.
    fn sample_li(
        &self,
        scene: &Scene,
        p_ref: Point3f,
        u: Point2f,
        lambda: &SampledWavelengths,
    ) -> Option<LightLiSample>;

    /// Solid angle density of [`AbstractLight::sample_li`] choosing `wi`.
    /// Area lights need the hit the direction lands on.
    fn pdf_li(&self, scene: &Scene, p_ref: Point3f, wi: Vec3f, hit: Option<&Hit>) -> Float;

    /// Radiance leaving the light back along `ray`. `hit` is the surface the
    /// ray ended on, or [`None`] when it escaped the scene.
    fn emission(
        &self,
        scene: &Scene,
        ray: &Ray,
        hit: Option<&Hit>,
        lambda: &SampledWavelengths,
    ) -> SampledSpectrum;

    /// Slot of this light in the light samplers' tables.
    fn sampling_path(&self) -> u32;
}

#[derive(Debug, Clone, Copy)]
pub struct LightLiSample {
    pub l: SampledSpectrum,
    pub wi: Vec3f,
    /// Point on the light, for the shadow ray
    pub p_light: Point3f,
    /// Normal at `p_light`, [`None`] for lights at infinity
    pub n_light: Option<Normal3f>,
    pub pdf: Float,
}

#[derive(Debug, Clone, Copy)]
pub enum Light<'a> {
    Area(&'a AreaLight),
    Uniform(&'a UniformInfiniteLight),
    Image(&'a ImageInfiniteLight),
}

impl AbstractLight for Light<'_> {
    fn phi(&self, scene: &Scene) -> Float {
        match self {
            Light::Area(l) => l.phi(scene),
            Light::Uniform(l) => l.phi(scene),
            Light::Image(l) => l.phi(scene),
        }
    }

    fn sample_li(
        &self,
        scene: &Scene,
        p_ref: Point3f,
        u: Point2f,
        lambda: &SampledWavelengths,
    ) -> Option<LightLiSample> {
        match self {
            Light::Area(l) => l.sample_li(scene, p_ref, u, lambda),
            Light::Uniform(l) => l.sample_li(scene, p_ref, u, lambda),
            Light::Image(l) => l.sample_li(scene, p_ref, u, lambda),
        }
    }

    fn pdf_li(&self, scene: &Scene, p_ref: Point3f, wi: Vec3f, hit: Option<&Hit>) -> Float {
        match self {
            Light::Area(l) => l.pdf_li(scene, p_ref, wi, hit),
            Light::Uniform(l) => l.pdf_li(scene, p_ref, wi, hit),
            Light::Image(l) => l.pdf_li(scene, p_ref, wi, hit),
        }
    }

    fn emission(
        &self,
        scene: &Scene,
        ray: &Ray,
        hit: Option<&Hit>,
        lambda: &SampledWavelengths,
    ) -> SampledSpectrum {
        match self {
            Light::Area(l) => l.emission(scene, ray, hit, lambda),
            Light::Uniform(l) => l.emission(scene, ray, hit, lambda),
            Light::Image(l) => l.emission(scene, ray, hit, lambda),
        }
    }

    fn sampling_path(&self) -> u32 {
        match self {
            Light::Area(l) => l.sampling_path(),
            Light::Uniform(l) => l.sampling_path(),
            Light::Image(l) => l.sampling_path(),
        }
    }
}

/// Dense per-variant light storage plus the registration order the light
/// samplers index by.
#[derive(Debug, Clone, Default)]
pub struct Lights {
    area: Vec<AreaLight>,
    uniform: Vec<UniformInfiniteLight>,
    image: Vec<ImageInfiniteLight>,
    all: Vec<LightId>,
}

impl Lights {
    pub fn add_area(&mut self, light: AreaLight) -> LightId {
        let id = LightId::new(LightType::Area, self.area.len());
        self.area.push(light);
        self.all.push(id);
        id
    }

    pub fn add_uniform(&mut self, light: UniformInfiniteLight) -> LightId {
        let id = LightId::new(LightType::Uniform, self.uniform.len());
        self.uniform.push(light);
        self.all.push(id);
        id
    }

    pub fn add_image(&mut self, light: ImageInfiniteLight) -> LightId {
        let id = LightId::new(LightType::Image, self.image.len());
        self.image.push(light);
        self.all.push(id);
        id
    }

    #[inline]
    pub fn get(&self, light: LightId) -> Light<'_> {
        match light.ty() {
            LightType::Area => Light::Area(&self.area[light.idx()]),
            LightType::Uniform => Light::Uniform(&self.uniform[light.idx()]),
            LightType::Image => Light::Image(&self.image[light.idx()]),
        }
    }

    pub fn contains(&self, light: LightId) -> bool {
        !light.is_none()
            && match light.ty() {
                LightType::Area => light.idx() < self.area.len(),
                LightType::Uniform => light.idx() < self.uniform.len(),
                LightType::Image => light.idx() < self.image.len(),
            }
    }

    /// Every light, in sampling path order.
    #[inline]
    pub fn all(&self) -> &[LightId] {
        &self.all
    }

    pub fn infinite(&self) -> impl Iterator<Item = LightId> + '_ {
        self.all.iter().copied().filter(|l| l.is_infinite())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.all.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    /// Radiance spectrum of any light.
    pub fn spectrum(&self, light: LightId) -> SpectrumId {
        match light.ty() {
            LightType::Area => self.area[light.idx()].spectrum,
            LightType::Uniform => self.uniform[light.idx()].spectrum,
            LightType::Image => self.image[light.idx()].spectrum,
        }
    }

    pub(crate) fn area_mut(&mut self, light: LightId) -> &mut AreaLight {
        &mut self.area[light.idx()]
    }

    /// Records each light's position in [`Lights::all`] and hands infinite
    /// lights the scene radius they place their shadow ray targets at.
    pub(crate) fn preprocess(&mut self, scene_bounds: &Bounds3f) {
        let radius = if scene_bounds.is_empty() { 1.0 } else { 0.5 * scene_bounds.diagonal().length().max(1e-3) };
        for (path, id) in self.all.iter().enumerate() {
            let path = path as u32;
            match id.ty() {
                LightType::Area => self.area[id.idx()].sampling_path = path,
                LightType::Uniform => {
                    let l = &mut self.uniform[id.idx()];
                    l.sampling_path = path;
                    l.scene_radius = radius;
                }
                LightType::Image => {
                    let l = &mut self.image[id.idx()];
                    l.sampling_path = path;
                    l.scene_radius = radius;
                }
            }
        }
    }
}
