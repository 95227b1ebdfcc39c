use std::cell::RefCell;
use std::time::{Duration, Instant};

use indicatif::{ParallelProgressIterator, ProgressBar};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use thread_local::ThreadLocal;
use tracing::{debug, info, warn};

use crate::camera::{AbstractCamera, AbstractFilm};
use crate::color::{SampledSpectrum, SampledWavelengths};
use crate::integrator::{AbstractRayIntegrator, RayIntegrator};
use crate::math::*;
use crate::options::Options;
use crate::sampler::{AbstractSampler, IndependentSampler};
use crate::scene::Scene;

/// Samples per pixel before the guide is first refined. Each later learning
/// pass is twice as long as the one before.
pub const INITIAL_GUIDE_SAMPLES: u32 = 4;

/// Decides before which samples the guide is refined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuideSchedule {
    iteration: u32,
    next: u32,
    stop: u32,
}

impl GuideSchedule {
    /// No refinement starts once `training_fraction` of `spp` is spent.
    pub fn new(spp: u32, training_fraction: Float) -> GuideSchedule {
        GuideSchedule {
            iteration: 0,
            next: INITIAL_GUIDE_SAMPLES,
            stop: (spp as f64 * training_fraction as f64) as u32,
        }
    }

    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    /// Whether the guide is refined before rendering sample `sample`.
    pub fn refine_before(&mut self, sample: u32) -> bool {
        if sample == self.next && sample < self.stop {
            self.iteration += 1;
            self.next += INITIAL_GUIDE_SAMPLES << self.iteration;
            true
        } else {
            false
        }
    }

    /// Whether what is learned from now on reaches a guide.
    pub fn learning(&self) -> bool {
        self.next < self.stop
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RenderReport {
    pub elapsed: Duration,
    /// Samples per pixel that reached the film after the last reset
    pub samples: u32,
    pub guide_iterations: u32,
}

impl RenderReport {
    pub fn time_per_sample(&self) -> f64 {
        self.elapsed.as_secs_f64() / self.samples.max(1) as f64
    }
}

/// Renders `options.spp` passes of one sample per pixel. Between passes the
/// guide, if the integrator has one, is refined on schedule, and the film
/// is reset so it only holds samples taken with the final guide.
pub fn render<C, F>(
    scene: &Scene,
    camera: &C,
    integrator: &mut RayIntegrator,
    film: &mut F,
    options: &Options,
    progress: &ProgressBar,
) -> RenderReport
where
    C: AbstractCamera + Sync,
    F: AbstractFilm,
{
    let (width, height) = (options.width as usize, options.height as usize);
    let samplers = ThreadLocal::new();
    let mut schedule = GuideSchedule::new(options.spp, options.training_fraction);
    let mut start = Instant::now();
    let mut first_sample = 0;

    info!(width, height, spp = options.spp, integrator = ?options.integrator, "rendering");

    for sample in 0..options.spp {
        if schedule.refine_before(sample) {
            if let Some(tree) = integrator.guide_mut() {
                tree.refine();
                film.reset();
                start = Instant::now();
                first_sample = sample;
                debug!(sample, iteration = schedule.iteration(), "film reset after guide refinement");
            }
        }
        if let RayIntegrator::Guided(guided) = integrator {
            guided.learning = schedule.learning();
        }

        let integrator = &*integrator;
        let estimates: Vec<Option<(SampledSpectrum, SampledWavelengths)>> = (0..width * height)
            .into_par_iter()
            .progress_with(progress.clone())
            .map(|pixel| {
                let mut sampler = samplers
                    .get_or(|| RefCell::new(IndependentSampler::new(options.seed)))
                    .borrow_mut();
                sampler.start_sample(pixel as u64, sample as u64);

                let mut lambda = SampledWavelengths::sample_visible(sampler.get_1d());
                let u = sampler.get_2d();
                let p_film = Point2f::new(
                    ((pixel % width) as Float + u.x) / width as Float,
                    ((pixel / width) as Float + u.y) / height as Float,
                );
                let ray = camera.generate_ray(p_film);
                let l = integrator.li(scene, ray, &mut lambda, &mut *sampler);

                if l.has_nan() || l.values.iter().any(|v| v.is_infinite()) {
                    warn!(pixel, sample, "discarding non-finite radiance sample");
                    return None;
                }
                Some((l, lambda))
            })
            .collect();

        for (pixel, estimate) in estimates.into_iter().enumerate() {
            if let Some((l, lambda)) = estimate {
                film.add_sample(pixel, &l, &lambda);
            }
        }
    }

    RenderReport {
        elapsed: start.elapsed(),
        samples: options.spp - first_sample,
        guide_iterations: schedule.iteration(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn learning_passes_double() {
        let mut schedule = GuideSchedule::new(1000, 0.15);
        let refined: Vec<u32> = (0..1000).filter(|&s| schedule.refine_before(s)).collect();
        assert_eq!(refined, vec![4, 12, 28, 60, 124]);
        assert_eq!(schedule.iteration(), 5);
        assert!(!schedule.learning());
    }

    #[test]
    fn tiny_budgets_never_refine() {
        let mut schedule = GuideSchedule::new(16, 0.15);
        assert!(!schedule.learning());
        assert!((0..16).all(|s| !schedule.refine_before(s)));
    }
}
