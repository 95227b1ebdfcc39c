use crate::color::{SampledSpectrum, SampledWavelengths};
use crate::math::ray::spawn_ray;
use crate::math::*;
use crate::sampler::AbstractSampler;
use crate::scene::Scene;

use super::{emitted, AbstractRayIntegrator, PathState};

/// Follows BSDF samples only and adds emission wherever the path lands.
#[derive(Debug, Clone)]
pub struct RandomWalkIntegrator {
    pub max_depth: u32,
}

impl AbstractRayIntegrator for RandomWalkIntegrator {
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
            path.l += path.beta * emitted(scene, &ray, hit.as_ref(), lambda, None);

            let Some(hit) = hit else { break };
            if path.depth == self.max_depth {
                break;
            }
            path.depth += 1;

            let bsdf = scene.bsdf(&hit, lambda);
            path.terminate_secondary(&bsdf, lambda);
            let wo = -ray.direction;
            let u = sampler.get_1d();
            let Some(bs) = bsdf.sample_f(wo, u, sampler.get_2d()) else { break };

            path.beta *= bs.f * (bs.wi.dot(hit.n).abs() / bs.pdf);
            if path.beta.is_zero() {
                break;
            }
            ray = spawn_ray(hit.p, hit.n_geo, bs.wi);
        }

        path.l
    }
}
