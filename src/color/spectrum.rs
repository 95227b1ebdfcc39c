use crate::color::{SampledSpectrum, SampledWavelengths, NUM_SPECTRUM_SAMPLES};
use crate::math::*;
use crate::scene::{SpectrumId, SpectrumType};

/// Minimum wavelength of visible light. Nanometers
pub const LAMBDA_MIN: Float = 360.0;
/// Maximum wavelength of visible light. Nanometers
pub const LAMBDA_MAX: Float = 830.0;

/// Resolves a spectrum handle at the wavelengths carried by a path.
pub trait AbstractSpectrumEvaluator {
    fn sample(&self, spectrum: SpectrumId, lambda: &SampledWavelengths) -> SampledSpectrum;

    /// Whether the spectrum takes the same value at every wavelength. A
    /// varying index of refraction makes a dielectric dispersive.
    fn is_constant(&self, spectrum: SpectrumId) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantSpectrum {
    pub value: Float,
}

/// Cauchy's dispersion formula, `a + b / λ²` with λ in micrometers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CauchySpectrum {
    pub a: Float,
    pub b: Float,
}

impl CauchySpectrum {
    #[inline]
    pub fn get(&self, lambda: Float) -> Float {
        let um = lambda * 1e-3;
        self.a + self.b / (um * um)
    }
}

/// Linear interpolation between `(λ, value)` samples sorted by λ, clamped
/// to the end values outside of them.
#[derive(Debug, Clone, PartialEq)]
pub struct PiecewiseLinearSpectrum {
    lambdas: Vec<Float>,
    values: Vec<Float>,
}

impl PiecewiseLinearSpectrum {
    pub fn new(samples: &[(Float, Float)]) -> Option<Self> {
        if samples.is_empty() || samples.windows(2).any(|w| w[0].0 >= w[1].0) {
            return None;
        }
        Some(Self {
            lambdas: samples.iter().map(|s| s.0).collect(),
            values: samples.iter().map(|s| s.1).collect(),
        })
    }

    pub fn get(&self, lambda: Float) -> Float {
        let n = self.lambdas.len();
        if lambda <= self.lambdas[0] {
            return self.values[0];
        }
        if lambda >= self.lambdas[n - 1] {
            return self.values[n - 1];
        }

        let o = find_interval(n, |i| self.lambdas[i] <= lambda);
        let t = (lambda - self.lambdas[o]) / (self.lambdas[o + 1] - self.lambdas[o]);
        lerp(self.values[o], self.values[o + 1], t)
    }

    pub fn max_value(&self) -> Float {
        self.values.iter().fold(Float::NEG_INFINITY, |a, &b| a.max(b))
    }
}

/// Dense per-variant storage behind `SpectrumId`.
#[derive(Debug, Clone, Default)]
pub struct Spectra {
    constant: Vec<ConstantSpectrum>,
    cauchy: Vec<CauchySpectrum>,
    piecewise_linear: Vec<PiecewiseLinearSpectrum>,
}

impl Spectra {
    pub fn add_constant(&mut self, value: Float) -> SpectrumId {
        let id = SpectrumId::new(SpectrumType::Constant, self.constant.len());
        self.constant.push(ConstantSpectrum { value });
        id
    }

    pub fn add_cauchy(&mut self, a: Float, b: Float) -> SpectrumId {
        let id = SpectrumId::new(SpectrumType::Cauchy, self.cauchy.len());
        self.cauchy.push(CauchySpectrum { a, b });
        id
    }

    pub fn add_piecewise_linear(&mut self, spectrum: PiecewiseLinearSpectrum) -> SpectrumId {
        let id = SpectrumId::new(SpectrumType::PiecewiseLinear, self.piecewise_linear.len());
        self.piecewise_linear.push(spectrum);
        id
    }

    pub fn contains(&self, spectrum: SpectrumId) -> bool {
        match spectrum.ty() {
            SpectrumType::Constant => spectrum.idx() < self.constant.len(),
            SpectrumType::Cauchy => spectrum.idx() < self.cauchy.len(),
            SpectrumType::PiecewiseLinear => spectrum.idx() < self.piecewise_linear.len(),
        }
    }

    /// Value at a single wavelength.
    pub fn get(&self, spectrum: SpectrumId, lambda: Float) -> Float {
        match spectrum.ty() {
            SpectrumType::Constant => self.constant[spectrum.idx()].value,
            SpectrumType::Cauchy => self.cauchy[spectrum.idx()].get(lambda),
            SpectrumType::PiecewiseLinear => self.piecewise_linear[spectrum.idx()].get(lambda),
        }
    }

    /// Upper bound of the spectrum over the visible range, used to weigh
    /// emitters by power.
    pub fn max_value(&self, spectrum: SpectrumId) -> Float {
        match spectrum.ty() {
            SpectrumType::Constant => self.constant[spectrum.idx()].value,
            SpectrumType::Cauchy => self.cauchy[spectrum.idx()].get(LAMBDA_MIN),
            SpectrumType::PiecewiseLinear => self.piecewise_linear[spectrum.idx()].max_value(),
        }
    }
}

impl AbstractSpectrumEvaluator for Spectra {
    fn sample(&self, spectrum: SpectrumId, lambda: &SampledWavelengths) -> SampledSpectrum {
        match spectrum.ty() {
            SpectrumType::Constant => SampledSpectrum::from_const(self.constant[spectrum.idx()].value),
            SpectrumType::Cauchy => {
                let s = &self.cauchy[spectrum.idx()];
                SampledSpectrum::new(std::array::from_fn::<_, NUM_SPECTRUM_SAMPLES, _>(|i| s.get(lambda[i])))
            }
            SpectrumType::PiecewiseLinear => {
                let s = &self.piecewise_linear[spectrum.idx()];
                SampledSpectrum::new(std::array::from_fn::<_, NUM_SPECTRUM_SAMPLES, _>(|i| s.get(lambda[i])))
            }
        }
    }

    fn is_constant(&self, spectrum: SpectrumId) -> bool {
        match spectrum.ty() {
            SpectrumType::Constant => true,
            SpectrumType::Cauchy => self.cauchy[spectrum.idx()].b == 0.0,
            SpectrumType::PiecewiseLinear => {
                let s = &self.piecewise_linear[spectrum.idx()];
                s.values.iter().all(|&v| v == s.values[0])
            }
        }
    }
}
