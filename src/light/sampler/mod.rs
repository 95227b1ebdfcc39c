use crate::light::{AbstractLight, Lights};
use crate::math::*;
use crate::scene::{LightId, LightSamplerId, LightSamplerType};

pub mod power;
pub mod uniform;

pub use power::PowerLightSampler;
pub use uniform::UniformLightSampler;

pub trait AbstractLightSampler {
    fn sample(&self, u: Float) -> Option<SampledLight>;

    /// Probability of [`AbstractLightSampler::sample`] choosing `light`.
    fn pmf(&self, lights: &Lights, light: LightId) -> Float;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampledLight {
    pub light: LightId,
    /// Discrete probability for this light to be sampled
    pub p: Float,
}

#[derive(Debug, Clone, Copy)]
pub enum LightSampler<'a> {
    Uniform(&'a UniformLightSampler),
    Power(&'a PowerLightSampler),
}

impl AbstractLightSampler for LightSampler<'_> {
    fn sample(&self, u: Float) -> Option<SampledLight> {
        match self {
            LightSampler::Uniform(s) => s.sample(u),
            LightSampler::Power(s) => s.sample(u),
        }
    }

    fn pmf(&self, lights: &Lights, light: LightId) -> Float {
        match self {
            LightSampler::Uniform(s) => s.pmf(lights, light),
            LightSampler::Power(s) => s.pmf(lights, light),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LightSamplers {
    uniform: Vec<UniformLightSampler>,
    power: Vec<PowerLightSampler>,
}

impl LightSamplers {
    pub fn add_uniform(&mut self, sampler: UniformLightSampler) -> LightSamplerId {
        let id = LightSamplerId::new(LightSamplerType::Uniform, self.uniform.len());
        self.uniform.push(sampler);
        id
    }

    pub fn add_power(&mut self, sampler: PowerLightSampler) -> LightSamplerId {
        let id = LightSamplerId::new(LightSamplerType::Power, self.power.len());
        self.power.push(sampler);
        id
    }

    #[inline]
    pub fn get(&self, sampler: LightSamplerId) -> LightSampler<'_> {
        match sampler.ty() {
            LightSamplerType::Uniform => LightSampler::Uniform(&self.uniform[sampler.idx()]),
            LightSamplerType::Power => LightSampler::Power(&self.power[sampler.idx()]),
        }
    }
}

/// Sampling path slot of `light`, or [`None`] for unregistered handles.
#[inline]
pub(super) fn sampling_path(lights: &Lights, light: LightId) -> Option<usize> {
    lights.contains(light).then(|| lights.get(light).sampling_path() as usize)
}
