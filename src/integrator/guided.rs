use arrayvec::ArrayVec;

use crate::color::{SampledSpectrum, SampledWavelengths};
use crate::guiding::{SdLeaf, SdTree};
use crate::math::ray::spawn_ray;
use crate::math::sampling::ONE_MINUS_EPSILON;
use crate::math::*;
use crate::sampler::AbstractSampler;
use crate::scene::Scene;

use super::{emitted, sample_direct, AbstractRayIntegrator, PathState};

/// Most scattering vertices a guided path remembers for learning.
pub const MAX_GUIDE_VERTICES: usize = 10;

/// A scattering vertex whose incident radiance is learned once the path
/// has ended.
#[derive(Debug, Clone, Copy)]
struct GuideVertex {
    leaf: SdLeaf,
    p: Point3f,
    wi: Vec3f,
    /// Side of the quadtree cell `wi` fell in
    footprint: Float,
    /// Throughput of the path continuing along `wi`
    throughput: SampledSpectrum,
    /// Radiance gathered before anything arriving along `wi`
    l_before: SampledSpectrum,
}

/// The NEE path tracer with directions drawn from a one-sample mixture of
/// the BSDF and the learned guide at non-specular vertices.
#[derive(Debug)]
pub struct GuidedPathIntegrator {
    pub max_depth: u32,
    pub rr_min_depth: u32,
    /// Chance of drawing a direction from the guide rather than the BSDF
    pub guiding_probability: Float,
    /// Whether finished paths are splatted into the train trees
    pub learning: bool,
    pub tree: SdTree,
}

impl GuidedPathIntegrator {
    pub fn new(max_depth: u32, rr_min_depth: u32, guiding_probability: Float, tree: SdTree) -> GuidedPathIntegrator {
        assert!(
            max_depth as usize <= MAX_GUIDE_VERTICES,
            "guided paths record at most {MAX_GUIDE_VERTICES} vertices"
        );
        assert!(
            (0.0..1.0).contains(&guiding_probability),
            "guiding probability {guiding_probability} leaves no samples for the BSDF"
        );
        GuidedPathIntegrator { max_depth, rr_min_depth, guiding_probability, learning: true, tree }
    }

    /// Splats the radiance each vertex received along its continuation.
    /// Each splat is split between the vertex's own leaf and a leaf found
    /// by jittering the position over one leaf extent, and is spread over a
    /// cell-sized neighbourhood of the direction.
    fn learn<S: AbstractSampler>(
        &self,
        vertices: &[GuideVertex],
        l: SampledSpectrum,
        hero_only: bool,
        sampler: &mut S,
    ) {
        for v in vertices {
            let li = (l - v.l_before).safe_div(&v.throughput);
            let flux = if hero_only { li[0] } else { li.average() };
            if !(flux > 0.0 && flux.is_finite()) {
                continue;
            }

            let u = sampler.get_3d();
            let offset = Vec3f::new(
                (u.x - 0.5) * v.leaf.extent.x,
                (u.y - 0.5) * v.leaf.extent.y,
                (u.z - 0.5) * v.leaf.extent.z,
            );
            let neighbour = self.tree.leaf_at(v.p + offset);

            let square = equal_area_sphere_to_square(v.wi);
            for leaf in [v.leaf, neighbour] {
                let d = sampler.get_2d();
                let jitter = |c: Float, u: Float| (c + (u - 0.5) * v.footprint).clamp(0.0, ONE_MINUS_EPSILON);
                let p = Point2f::new(jitter(square.x, d.x), jitter(square.y, d.y));
                self.tree.splat_square(&leaf, p, 0.5 * flux);
            }
        }
    }
}

impl AbstractRayIntegrator for GuidedPathIntegrator {
    fn li<S: AbstractSampler>(
        &self,
        scene: &Scene,
        ray: Ray,
        lambda: &mut SampledWavelengths,
        sampler: &mut S,
    ) -> SampledSpectrum {
        let mut ray = ray;
        let mut path = PathState::new();
        let mut vertices: ArrayVec<GuideVertex, MAX_GUIDE_VERTICES> = ArrayVec::new();

        loop {
            let hit = scene.intersect(&ray, Float::INFINITY);
            path.l += path.beta * emitted(scene, &ray, hit.as_ref(), lambda, path.prev);

            let Some(hit) = hit else { break };
            if path.depth == self.max_depth {
                break;
            }
            path.depth += 1;

            let bsdf = scene.bsdf(&hit, lambda);
            if path.terminate_secondary(&bsdf, lambda) {
                for v in vertices.iter_mut() {
                    v.l_before = v.l_before.collapse_to_hero();
                    v.throughput = v.throughput.collapse_to_hero();
                }
            }
            let wo = -ray.direction;

            // Specular BSDFs are sampled on their own.
            let leaf = (!bsdf.is_specular()).then(|| self.tree.locate(hit.p));
            let alpha = if leaf.is_some() { self.guiding_probability } else { 0.0 };
            let mixture_pdf = |wi: Vec3f| match &leaf {
                Some(leaf) => alpha * self.tree.pdf(leaf, wi).0 + (1.0 - alpha) * bsdf.pdf(wo, wi),
                None => bsdf.pdf(wo, wi),
            };

            path.l += path.beta * sample_direct(scene, &hit, wo, &bsdf, lambda, sampler, &mixture_pdf);
            let l_before = path.l;

            let u = sampler.get_1d();
            let u2 = sampler.get_2d();
            let (wi, f, pdf, specular, footprint) = match &leaf {
                Some(leaf) if u < alpha => {
                    let gs = self.tree.sample(leaf, u2);
                    let pdf = alpha * gs.pdf + (1.0 - alpha) * bsdf.pdf(wo, gs.wi);
                    (gs.wi, bsdf.f(wo, gs.wi), pdf, false, gs.footprint)
                }
                _ => {
                    let u = ((u - alpha) / (1.0 - alpha)).min(ONE_MINUS_EPSILON);
                    let Some(bs) = bsdf.sample_f(wo, u, u2) else { break };
                    if bs.is_specular() {
                        (bs.wi, bs.f, (1.0 - alpha) * bs.pdf, true, 0.0)
                    } else {
                        let (guide_pdf, footprint) = leaf.as_ref().map_or((0.0, 0.0), |l| self.tree.pdf(l, bs.wi));
                        (bs.wi, bs.f, alpha * guide_pdf + (1.0 - alpha) * bs.pdf, false, footprint)
                    }
                }
            };
            if f.is_zero() || pdf <= 0.0 {
                break;
            }

            path.beta *= f * (wi.dot(hit.n).abs() / pdf);
            path.prev = (!specular).then_some((hit.p, pdf));
            if let (Some(leaf), false) = (leaf, specular) {
                vertices.push(GuideVertex { leaf, p: hit.p, wi, footprint, throughput: path.beta, l_before });
            }
            ray = spawn_ray(hit.p, hit.n_geo, wi);

            if path.beta.is_zero() || !path.russian_roulette(self.rr_min_depth, sampler.get_1d()) {
                break;
            }
        }

        if self.learning {
            self.learn(&vertices, path.l, lambda.secondary_terminated(), sampler);
        }
        path.l
    }
}
