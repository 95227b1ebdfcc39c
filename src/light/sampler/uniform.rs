use crate::light::sampler::{sampling_path, AbstractLightSampler, SampledLight};
use crate::light::Lights;
use crate::math::*;
use crate::scene::LightId;

#[derive(Debug, Clone)]
pub struct UniformLightSampler {
    lights: Vec<LightId>,
}

impl UniformLightSampler {
    pub fn new(lights: &[LightId]) -> UniformLightSampler {
        UniformLightSampler { lights: lights.to_vec() }
    }
}

impl AbstractLightSampler for UniformLightSampler {
    fn sample(&self, u: Float) -> Option<SampledLight> {
        if self.lights.is_empty() {
            return None;
        }

        let light_index = usize::min((u * self.lights.len() as Float) as usize, self.lights.len() - 1);

        Some(SampledLight {
            light: self.lights[light_index],
            p: 1.0 / self.lights.len() as Float,
        })
    }

    fn pmf(&self, lights: &Lights, light: LightId) -> Float {
        match sampling_path(lights, light) {
            Some(path) if path < self.lights.len() => 1.0 / self.lights.len() as Float,
            _ => 0.0,
        }
    }
}
