use crate::color::{AbstractSpectrumEvaluator, SampledSpectrum, SampledWavelengths};
use crate::light::{AbstractLight, LightLiSample};
use crate::math::sampling::PiecewiseConstant2D;
use crate::math::*;
use crate::primitive::Hit;
use crate::scene::{Scene, SpectrumId};
use crate::texture::Image;

/// An environment map stored over the equal-area octahedral square. The
/// image scales `spectrum`; directions are importance sampled by texel
/// value.
#[derive(Debug, Clone)]
pub struct ImageInfiniteLight {
    image: Image,
    pub spectrum: SpectrumId,
    scale: Float,
    /// Light to world
    transform: Transform,
    distribution: PiecewiseConstant2D,
    pub(super) scene_radius: Float,
    pub(super) sampling_path: u32,
}

impl ImageInfiniteLight {
    /// [`None`] unless the image is square, as the octahedral mapping
    /// requires.
    pub fn new(image: Image, spectrum: SpectrumId, scale: Float, transform: Transform) -> Option<ImageInfiniteLight> {
        if image.width() != image.height() {
            return None;
        }
        let distribution = PiecewiseConstant2D::new(image.data(), image.width(), image.height());
        Some(ImageInfiniteLight {
            image,
            spectrum,
            scale,
            transform,
            distribution,
            scene_radius: 1.0,
            sampling_path: 0,
        })
    }

    pub fn image(&self) -> &Image {
        &self.image
    }

    fn image_le(&self, scene: &Scene, uv: Point2f, lambda: &SampledWavelengths) -> SampledSpectrum {
        let texel = self.image.lookup_nearest(uv).max(0.0);
        scene.sample(self.spectrum, lambda) * (texel * self.scale)
    }
}

impl AbstractLight for ImageInfiniteLight {
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
        let (uv, map_pdf) = self.distribution.sample(u);
        if map_pdf == 0.0 {
            return None;
        }

        let w_light = equal_area_square_to_sphere(uv);
        let wi = self.transform.apply_vector(w_light).normalize();

        Some(LightLiSample {
            l: self.image_le(scene, uv, lambda),
            wi,
            p_light: p_ref + wi * (2.0 * self.scene_radius),
            n_light: None,
            pdf: map_pdf * FRAC_1_4PI,
        })
    }

    fn pdf_li(&self, _scene: &Scene, _p_ref: Point3f, wi: Vec3f, _hit: Option<&Hit>) -> Float {
        let w_light = self.transform.apply_inverse_vector(wi).normalize();
        let uv = equal_area_sphere_to_square(w_light);
        self.distribution.pdf(uv) * FRAC_1_4PI
    }

    fn emission(
        &self,
        scene: &Scene,
        ray: &Ray,
        hit: Option<&Hit>,
        lambda: &SampledWavelengths,
    ) -> SampledSpectrum {
        if hit.is_some() {
            return SampledSpectrum::from_const(0.0);
        }
        let w_light = self.transform.apply_inverse_vector(ray.direction).normalize();
        self.image_le(scene, equal_area_sphere_to_square(w_light), lambda)
    }

    fn sampling_path(&self) -> u32 {
        self.sampling_path
    }
}
