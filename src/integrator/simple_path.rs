use crate::color::{SampledSpectrum, SampledWavelengths};
use crate::math::ray::spawn_ray;
use crate::math::*;
use crate::sampler::AbstractSampler;
use crate::scene::Scene;

use super::{emitted, sample_direct, AbstractRayIntegrator, PathState};

/// Next event estimation combined with BSDF sampling by multiple importance
/// sampling, with Russian roulette past `rr_min_depth` bounces.
#[derive(Debug, Clone)]
pub struct SimplePathIntegrator {
    pub max_depth: u32,
    pub rr_min_depth: u32,
}

impl AbstractRayIntegrator for SimplePathIntegrator {
    fn li<S: AbstractSampler>(
        &self,
        scene: &Scene,
        ray: Ray,
        lambda: &mut SampledWavelengths,
        sampler: &mut S,
    ) -> SampledSpectrum {
        let mut ray = ray;
        let mut path = PathState::new();

        loop {
            let hit = scene.intersect(&ray, Float::INFINITY);
            path.l += path.beta * emitted(scene, &ray, hit.as_ref(), lambda, path.prev);

            let Some(hit) = hit else { break };
            if path.depth == self.max_depth {
                break;
            }
            path.depth += 1;

            let bsdf = scene.bsdf(&hit, lambda);
            path.terminate_secondary(&bsdf, lambda);
            let wo = -ray.direction;

            let direct = sample_direct(scene, &hit, wo, &bsdf, lambda, sampler, |wi| bsdf.pdf(wo, wi));
            path.l += path.beta * direct;

            let u = sampler.get_1d();
            let Some(bs) = bsdf.sample_f(wo, u, sampler.get_2d()) else { break };

            path.beta *= bs.f * (bs.wi.dot(hit.n).abs() / bs.pdf);
            path.prev = (!bs.is_specular()).then_some((hit.p, bs.pdf));
            ray = spawn_ray(hit.p, hit.n_geo, bs.wi);

            if path.beta.is_zero() || !path.russian_roulette(self.rr_min_depth, sampler.get_1d()) {
                break;
            }
        }

        path.l
    }
}
