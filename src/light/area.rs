use crate::color::{AbstractSpectrumEvaluator, SampledSpectrum, SampledWavelengths};
use crate::light::{AbstractLight, LightLiSample};
use crate::math::*;
use crate::primitive::Hit;
use crate::scene::{NodeId, Scene, ShapeId, SpectrumId};
use crate::shape::{AbstractShape, Shape};

/// A diffuse emitter attached to one primitive. `transform_node` places the
/// shape in the world; the scene builder fills it in once the instance
/// hierarchy is known.
#[derive(Debug, Clone)]
pub struct AreaLight {
    pub spectrum: SpectrumId,
    pub shape: ShapeId,
    pub transform_node: Option<NodeId>,
    pub two_sided: bool,
    pub(super) sampling_path: u32,
}

impl AreaLight {
    pub fn new(spectrum: SpectrumId, shape: ShapeId, two_sided: bool) -> AreaLight {
        AreaLight { spectrum, shape, transform_node: None, two_sided, sampling_path: 0 }
    }

    fn transform<'a>(&self, scene: &'a Scene) -> Option<&'a Transform> {
        self.transform_node.map(|n| &scene.transform_node(n).transform)
    }

    #[inline]
    fn faces(&self, n: Normal3f, w: Vec3f) -> bool {
        self.two_sided || n.dot(w) > 0.0
    }

    /// Surface area of the shape after placement.
    pub fn world_area(&self, scene: &Scene) -> Float {
        let shape = scene.shapes.get(self.shape);
        let Some(t) = self.transform(scene) else {
            return shape.area();
        };
        match shape {
            Shape::Triangle(tri) => {
                let [p0, p1, p2] = tri.v.map(|v| t.apply_point(v.p));
                0.5 * (p1 - p0).cross(p2 - p0).length()
            }
            // Exact for similarity transforms.
            Shape::Sphere(s) => s.area() * t.m.determinant_3x3().abs().powf(2.0 / 3.0),
        }
    }

    /// World to object area ratio at a world space point with normal `n`.
    fn area_scale(&self, scene: &Scene, n: Normal3f) -> Float {
        match self.transform(scene) {
            Some(t) => {
                let n_obj = t.inverse().apply_normal(n).normalize();
                t.area_scale(n_obj)
            }
            None => 1.0,
        }
    }
}

impl AbstractLight for AreaLight {
    fn phi(&self, scene: &Scene) -> Float {
        let sides = if self.two_sided { 2.0 } else { 1.0 };
        scene.spectra.max_value(self.spectrum) * self.world_area(scene) * PI * sides
    }

    fn sample_li(
        &self,
        scene: &Scene,
        p_ref: Point3f,
        u: Point2f,
        lambda: &SampledWavelengths,
    ) -> Option<LightLiSample> {
        let shape = scene.shapes.get(self.shape);
        let t = self.transform(scene);

        let p_obj = t.map_or(p_ref, |t| t.apply_inverse_point(p_ref));
        let ss = shape.sample(p_obj, u)?;
        let (p, n, pdf_area) = match t {
            Some(t) => (t.apply_point(ss.p), t.apply_normal(ss.n).normalize(), ss.pdf / t.area_scale(ss.n)),
            None => (ss.p, ss.n, ss.pdf),
        };

        let wi = p - p_ref;
        let dist2 = wi.length_squared();
        if dist2 == 0.0 || pdf_area == 0.0 {
            return None;
        }
        let wi = wi.normalize();
        let cos = n.dot(-wi);
        if cos == 0.0 || !self.faces(n, -wi) {
            return None;
        }

        Some(LightLiSample {
            l: scene.sample(self.spectrum, lambda),
            wi,
            p_light: p,
            n_light: Some(n),
            pdf: pdf_area * dist2 / cos.abs(),
        })
    }

    fn pdf_li(&self, scene: &Scene, p_ref: Point3f, wi: Vec3f, hit: Option<&Hit>) -> Float {
        let Some(hit) = hit else {
            return 0.0;
        };
        let shape = scene.shapes.get(self.shape);
        let t = self.transform(scene);

        let pdf_obj = shape.pdf(
            t.map_or(p_ref, |t| t.apply_inverse_point(p_ref)),
            t.map_or(hit.p, |t| t.apply_inverse_point(hit.p)),
        );
        let pdf_area = pdf_obj / self.area_scale(scene, hit.n_geo);

        let cos = hit.n_geo.dot(wi.normalize()).abs();
        if cos == 0.0 {
            return 0.0;
        }
        pdf_area * p_ref.distance_squared(hit.p) / cos
    }

    fn emission(
        &self,
        scene: &Scene,
        ray: &Ray,
        hit: Option<&Hit>,
        lambda: &SampledWavelengths,
    ) -> SampledSpectrum {
        match hit {
            Some(hit) if self.faces(hit.n_geo, -ray.direction) => scene.sample(self.spectrum, lambda),
            _ => SampledSpectrum::from_const(0.0),
        }
    }

    fn sampling_path(&self) -> u32 {
        self.sampling_path
    }
}
