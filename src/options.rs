use crate::error::OptionsError;
use crate::integrator::MAX_GUIDE_VERTICES;
use crate::math::*;
use crate::scene::LightSamplerType;

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegratorKind {
    RandomWalk,
    SimplePath,
    Guided,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightSamplerKind {
    Uniform,
    Power,
}

impl From<LightSamplerKind> for LightSamplerType {
    fn from(kind: LightSamplerKind) -> Self {
        match kind {
            LightSamplerKind::Uniform => LightSamplerType::Uniform,
            LightSamplerKind::Power => LightSamplerType::Power,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Options {
    pub integrator: IntegratorKind,
    pub light_sampler: LightSamplerKind,
    pub max_depth: u32,
    /// Bounces before Russian roulette may end a path
    pub rr_min_depth: u32,
    pub spp: u32,
    pub seed: u64,
    pub width: u32,
    pub height: u32,
    /// Chance of sampling the guide at non-specular vertices
    pub guiding_probability: Float,
    /// Share of the sample budget during which the guide keeps learning
    pub training_fraction: Float,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            integrator: IntegratorKind::SimplePath,
            light_sampler: LightSamplerKind::Power,
            max_depth: 8,
            rr_min_depth: 3,
            spp: 64,
            seed: 0,
            width: 64,
            height: 64,
            guiding_probability: 0.5,
            training_fraction: 0.15,
        }
    }
}

impl Options {
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.spp == 0 {
            return Err(OptionsError::ZeroSamples);
        }
        if self.max_depth == 0 {
            return Err(OptionsError::ZeroDepth);
        }
        if self.rr_min_depth > self.max_depth {
            return Err(OptionsError::RouletteDepth {
                rr_min_depth: self.rr_min_depth,
                max_depth: self.max_depth,
            });
        }
        if self.width == 0 || self.height == 0 {
            return Err(OptionsError::EmptyResolution);
        }
        if !(0.0..1.0).contains(&self.guiding_probability) {
            return Err(OptionsError::GuidingProbability(self.guiding_probability));
        }
        if !(self.training_fraction > 0.0 && self.training_fraction <= 1.0) {
            return Err(OptionsError::TrainingFraction(self.training_fraction));
        }
        if self.integrator == IntegratorKind::Guided && self.max_depth as usize > MAX_GUIDE_VERTICES {
            return Err(OptionsError::GuidedDepth { max_depth: self.max_depth, limit: MAX_GUIDE_VERTICES });
        }
        Ok(())
    }
}
