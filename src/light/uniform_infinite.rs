use crate::color::{AbstractSpectrumEvaluator, SampledSpectrum, SampledWavelengths};
use crate::light::{AbstractLight, LightLiSample};
use crate::math::sampling::{sample_uniform_sphere, uniform_sphere_pdf};
use crate::math::*;
use crate::primitive::Hit;
use crate::scene::{Scene, SpectrumId};

/// Constant radiance from every direction.
#[derive(Debug, Clone)]
pub struct UniformInfiniteLight {
    pub spectrum: SpectrumId,
    pub(super) scene_radius: Float,
    pub(super) sampling_path: u32,
}

impl UniformInfiniteLight {
    pub fn new(spectrum: SpectrumId) -> UniformInfiniteLight {
        UniformInfiniteLight { spectrum, scene_radius: 1.0, sampling_path: 0 }
    }
}

impl AbstractLight for UniformInfiniteLight {
    /// Infinite lights take their selection weight from the finite lights;
    /// see the scene builder.
    fn phi(&self, _scene: &Scene) -> Float {
        0.0
    }

    fn sample_li(
        &self,
        scene: &Scene,
        p_ref: Point3f,
        u: Point2f,
        lambda: &SampledWavelengths,
    ) -> Option<LightLiSample> {
        let wi = sample_uniform_sphere(u);
        Some(LightLiSample {
            l: scene.sample(self.spectrum, lambda),
            wi,
            p_light: p_ref + wi * (2.0 * self.scene_radius),
            n_light: None,
            pdf: uniform_sphere_pdf(),
        })
    }

    fn pdf_li(&self, _scene: &Scene, _p_ref: Point3f, _wi: Vec3f, _hit: Option<&Hit>) -> Float {
        uniform_sphere_pdf()
    }

    fn emission(
        &self,
        scene: &Scene,
        _ray: &Ray,
        hit: Option<&Hit>,
        lambda: &SampledWavelengths,
    ) -> SampledSpectrum {
        if hit.is_some() {
            return SampledSpectrum::from_const(0.0);
        }
        scene.sample(self.spectrum, lambda)
    }

    fn sampling_path(&self) -> u32 {
        self.sampling_path
    }
}
