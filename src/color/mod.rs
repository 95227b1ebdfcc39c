pub mod sampled;
pub mod spectrum;
pub mod wavelengths;

pub use sampled::{SampledSpectrum, NUM_SPECTRUM_SAMPLES};
pub use spectrum::{AbstractSpectrumEvaluator, Spectra, LAMBDA_MAX, LAMBDA_MIN};
pub use wavelengths::SampledWavelengths;
