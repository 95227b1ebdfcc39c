//! Path tracers. Each estimates the radiance arriving along a camera ray for
//! the wavelengths a path carries.

use crate::bsdf::BSDF;
use crate::color::{SampledSpectrum, SampledWavelengths};
use crate::guiding::SdTree;
use crate::light::sampler::AbstractLightSampler;
use crate::light::{AbstractLight, LightLiSample};
use crate::math::ray::spawn_ray_to;
use crate::math::sampling::balance_heuristic;
use crate::math::*;
use crate::options::{IntegratorKind, Options};
use crate::primitive::Hit;
use crate::sampler::AbstractSampler;
use crate::scene::{LightId, Scene};

pub mod guided;
pub mod random_walk;
pub mod simple_path;

pub use guided::{GuidedPathIntegrator, MAX_GUIDE_VERTICES};
pub use random_walk::RandomWalkIntegrator;
pub use simple_path::SimplePathIntegrator;

/// Shadow rays stop this far short of the light sample.
pub const SHADOW_EPSILON: Float = 0.0001;

pub trait AbstractRayIntegrator {
    /// Radiance arriving along `ray`. May terminate the secondary
    /// wavelengths in `lambda`, in which case only channel 0 of the result
    /// carries the estimate.
    fn li<S: AbstractSampler>(
        &self,
        scene: &Scene,
        ray: Ray,
        lambda: &mut SampledWavelengths,
        sampler: &mut S,
    ) -> SampledSpectrum;
}

#[derive(Debug)]
pub enum RayIntegrator {
    RandomWalk(RandomWalkIntegrator),
    SimplePath(SimplePathIntegrator),
    Guided(GuidedPathIntegrator),
}

impl RayIntegrator {
    pub fn new(options: &Options, scene: &Scene) -> RayIntegrator {
        match options.integrator {
            IntegratorKind::RandomWalk => RayIntegrator::RandomWalk(RandomWalkIntegrator {
                max_depth: options.max_depth,
            }),
            IntegratorKind::SimplePath => RayIntegrator::SimplePath(SimplePathIntegrator {
                max_depth: options.max_depth,
                rr_min_depth: options.rr_min_depth,
            }),
            IntegratorKind::Guided => RayIntegrator::Guided(GuidedPathIntegrator::new(
                options.max_depth,
                options.rr_min_depth,
                options.guiding_probability,
                SdTree::new(scene.bounds()),
            )),
        }
    }

    /// The learned guide, for integrators that have one.
    pub fn guide_mut(&mut self) -> Option<&mut SdTree> {
        match self {
            RayIntegrator::Guided(g) => Some(&mut g.tree),
            _ => None,
        }
    }
}

impl AbstractRayIntegrator for RayIntegrator {
    fn li<S: AbstractSampler>(
        &self,
        scene: &Scene,
        ray: Ray,
        lambda: &mut SampledWavelengths,
        sampler: &mut S,
    ) -> SampledSpectrum {
        match self {
            RayIntegrator::RandomWalk(i) => i.li(scene, ray, lambda, sampler),
            RayIntegrator::SimplePath(i) => i.li(scene, ray, lambda, sampler),
            RayIntegrator::Guided(i) => i.li(scene, ray, lambda, sampler),
        }
    }
}

/// Radiance and throughput of a path under construction.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PathState {
    pub l: SampledSpectrum,
    pub beta: SampledSpectrum,
    pub depth: u32,
    /// Last scattering point and the solid angle density its outgoing
    /// direction was drawn with. [`None`] for camera rays and after
    /// specular bounces, where emission is counted without MIS.
    pub prev: Option<(Point3f, Float)>,
}

impl PathState {
    pub fn new() -> PathState {
        PathState {
            l: SampledSpectrum::from_const(0.0),
            beta: SampledSpectrum::from_const(1.0),
            depth: 0,
            prev: None,
        }
    }

    /// Drops the secondary wavelengths if `bsdf` was evaluated at the hero
    /// wavelength only. Returns whether that happened now.
    pub fn terminate_secondary(&mut self, bsdf: &BSDF, lambda: &mut SampledWavelengths) -> bool {
        if !bsdf.terminates_secondary() || lambda.secondary_terminated() {
            return false;
        }
        self.beta = self.beta.collapse_to_hero();
        self.l = self.l.collapse_to_hero();
        lambda.terminate_secondary();
        true
    }

    /// Returns whether the path survives. Survivors are reweighted.
    pub fn russian_roulette(&mut self, rr_min_depth: u32, u: Float) -> bool {
        let max = self.beta.max_component_value();
        if self.depth > rr_min_depth && max < 1.0 {
            let q = (1.0 - max).max(0.0);
            if u < q {
                return false;
            }
            self.beta /= 1.0 - q;
        }
        true
    }
}

/// Probability of the scene's light sampler choosing `light`.
#[inline]
pub fn light_pmf(scene: &Scene, light: LightId) -> Float {
    scene.light_samplers.get(scene.light_sampler).pmf(&scene.lights, light)
}

/// Emission reaching the path along `ray`: the emitter at `hit`, or every
/// infinite light when the ray escaped. With `prev` set the emission is
/// balance-heuristic weighted against sampling the light from there.
pub fn emitted(
    scene: &Scene,
    ray: &Ray,
    hit: Option<&Hit>,
    lambda: &SampledWavelengths,
    prev: Option<(Point3f, Float)>,
) -> SampledSpectrum {
    let weighted = |light: LightId| {
        let le = scene.lights.get(light).emission(scene, ray, hit, lambda);
        match prev {
            Some((p, scatter_pdf)) if !le.is_zero() => {
                let light_pdf = light_pmf(scene, light) * scene.lights.get(light).pdf_li(scene, p, ray.direction, hit);
                le * balance_heuristic(scatter_pdf, light_pdf)
            }
            _ => le,
        }
    };

    match hit {
        Some(hit) if hit.light.is_none() => SampledSpectrum::from_const(0.0),
        Some(hit) => weighted(hit.light),
        None => scene
            .lights
            .infinite()
            .fold(SampledSpectrum::from_const(0.0), |acc, light| acc + weighted(light)),
    }
}

/// Whether nothing blocks the segment from `hit` to the light sample.
pub fn unoccluded(scene: &Scene, hit: &Hit, ls: &LightLiSample) -> bool {
    let ray = spawn_ray_to(hit.p, hit.n_geo, ls.p_light, ls.n_light);
    !scene.intersect_predicate(&ray, 1.0 - SHADOW_EPSILON)
}

/// One light sample at `hit`, not yet scaled by the path throughput. The
/// result is balance-heuristic weighted against `scatter_pdf`, the density
/// the path's own direction sampling has for the light direction. Specular
/// BSDFs never receive light this way.
pub fn sample_direct<S: AbstractSampler>(
    scene: &Scene,
    hit: &Hit,
    wo: Vec3f,
    bsdf: &BSDF,
    lambda: &SampledWavelengths,
    sampler: &mut S,
    scatter_pdf: impl Fn(Vec3f) -> Float,
) -> SampledSpectrum {
    let zero = SampledSpectrum::from_const(0.0);
    let u_light = sampler.get_1d();
    let u = sampler.get_2d();
    if bsdf.is_specular() {
        return zero;
    }

    let Some(sampled) = scene.light_samplers.get(scene.light_sampler).sample(u_light) else {
        return zero;
    };
    let Some(ls) = scene.lights.get(sampled.light).sample_li(scene, hit.p, u, lambda) else {
        return zero;
    };
    if ls.l.is_zero() || ls.pdf <= 0.0 {
        return zero;
    }

    let f = bsdf.f(wo, ls.wi) * ls.wi.dot(hit.n).abs();
    if f.is_zero() || !unoccluded(scene, hit, &ls) {
        return zero;
    }

    let light_pdf = sampled.p * ls.pdf;
    f * ls.l * (balance_heuristic(light_pdf, scatter_pdf(ls.wi)) / light_pdf)
}
