use std::ops::Index;

use crate::color::{SampledSpectrum, LAMBDA_MAX, LAMBDA_MIN, NUM_SPECTRUM_SAMPLES};
use crate::math::*;

/// The wavelengths a path carries, with the density each was drawn from.
/// Channel 0 is the hero wavelength.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampledWavelengths {
    lambda: [Float; NUM_SPECTRUM_SAMPLES],
    pdf: [Float; NUM_SPECTRUM_SAMPLES],
}

impl SampledWavelengths {
    pub fn sample_uniform(u: Float) -> SampledWavelengths {
        debug_assert!((0.0..=1.0).contains(&u));

        let mut lambda = [0.0; NUM_SPECTRUM_SAMPLES];
        lambda[0] = lerp(LAMBDA_MIN, LAMBDA_MAX, u);

        let delta = (LAMBDA_MAX - LAMBDA_MIN) / NUM_SPECTRUM_SAMPLES as Float;
        for i in 1..NUM_SPECTRUM_SAMPLES {
            lambda[i] = lambda[i - 1] + delta;
            if lambda[i] > LAMBDA_MAX {
                lambda[i] = LAMBDA_MIN + (lambda[i] - LAMBDA_MAX);
            }
        }

        let pdf = [1.0 / (LAMBDA_MAX - LAMBDA_MIN); NUM_SPECTRUM_SAMPLES];
        SampledWavelengths { lambda, pdf }
    }

    /// Stratified samples from a density roughly following the visual
    /// response, offset by `1 / N` per channel.
    pub fn sample_visible(u: Float) -> SampledWavelengths {
        let mut lambda = [0.0; NUM_SPECTRUM_SAMPLES];
        let mut pdf = [0.0; NUM_SPECTRUM_SAMPLES];

        for i in 0..NUM_SPECTRUM_SAMPLES {
            let mut up = u + i as Float / NUM_SPECTRUM_SAMPLES as Float;
            if up > 1.0 {
                up -= 1.0;
            }
            lambda[i] = sample_visible_wavelengths(up);
            pdf[i] = visible_wavelengths_pdf(lambda[i]);
        }
        SampledWavelengths { lambda, pdf }
    }

    #[inline]
    pub fn lambda(&self) -> &[Float; NUM_SPECTRUM_SAMPLES] {
        &self.lambda
    }

    pub fn pdf(&self) -> SampledSpectrum {
        SampledSpectrum::new(self.pdf)
    }

    /// Drops the secondary wavelengths. Callers collapse their throughput
    /// onto the hero channel at the same time.
    pub fn terminate_secondary(&mut self) {
        for pdf in self.pdf.iter_mut().skip(1) {
            *pdf = 0.0;
        }
    }

    pub fn secondary_terminated(&self) -> bool {
        self.pdf.iter().skip(1).all(|&p| p == 0.0)
    }
}

impl Index<usize> for SampledWavelengths {
    type Output = Float;

    fn index(&self, index: usize) -> &Self::Output {
        self.lambda.index(index)
    }
}

pub fn sample_visible_wavelengths(u: Float) -> Float {
    538.0 - 138.888889 * Float::atanh(0.85691062 - 1.82750197 * u)
}

pub fn visible_wavelengths_pdf(lambda: Float) -> Float {
    if !(LAMBDA_MIN..=LAMBDA_MAX).contains(&lambda) {
        return 0.0;
    }
    let x = Float::cosh(0.0072 * (lambda - 538.0));
    0.0039398042 / (x * x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visible_samples_in_range() {
        for i in 0..32 {
            let wl = SampledWavelengths::sample_visible((i as Float + 0.5) / 32.0);
            for c in 0..NUM_SPECTRUM_SAMPLES {
                assert!((LAMBDA_MIN..=LAMBDA_MAX).contains(&wl[c]));
                assert!(wl.pdf()[c] > 0.0);
            }
        }
    }

    #[test]
    fn terminate_keeps_hero() {
        let mut wl = SampledWavelengths::sample_visible(0.3);
        let hero_pdf = wl.pdf()[0];
        assert!(!wl.secondary_terminated());
        wl.terminate_secondary();
        assert!(wl.secondary_terminated());
        assert_eq!(wl.pdf()[0], hero_pdf);
        assert_eq!(wl.pdf()[1], 0.0);
    }
}
