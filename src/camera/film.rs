use crate::color::{SampledSpectrum, SampledWavelengths};
use crate::math::*;

/// Receives the estimates a render produces.
pub trait AbstractFilm {
    fn add_sample(&mut self, pixel: usize, l: &SampledSpectrum, lambda: &SampledWavelengths);

    /// Forgets everything added so far.
    fn reset(&mut self);
}

/// Running mean and variance of a scalar estimate per pixel, updated with
/// Welford's method.
#[derive(Debug, Clone)]
pub struct EstimateFilm {
    width: usize,
    height: usize,
    count: Vec<u32>,
    mean: Vec<f64>,
    m2: Vec<f64>,
}

/// Image-wide statistics, averaged over pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilmStats {
    pub mean: f64,
    /// Sample variance relative to the pixel mean
    pub relative_variance: f64,
    /// Standard error relative to the pixel mean
    pub relative_error: f64,
}

impl EstimateFilm {
    pub fn new(width: usize, height: usize) -> EstimateFilm {
        let n = width * height;
        EstimateFilm { width, height, count: vec![0; n], mean: vec![0.0; n], m2: vec![0.0; n] }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn count(&self, pixel: usize) -> u32 {
        self.count[pixel]
    }

    pub fn mean(&self, pixel: usize) -> f64 {
        self.mean[pixel]
    }

    /// Unbiased sample variance, infinite below two samples.
    pub fn variance(&self, pixel: usize) -> f64 {
        match self.count[pixel] {
            0 | 1 => f64::INFINITY,
            n => self.m2[pixel] / (n - 1) as f64,
        }
    }

    pub fn add(&mut self, pixel: usize, value: Float) {
        let value = value as f64;
        self.count[pixel] += 1;
        let delta = value - self.mean[pixel];
        self.mean[pixel] += delta / self.count[pixel] as f64;
        self.m2[pixel] += delta * (value - self.mean[pixel]);
    }

    /// Pixels whose relative variance is not finite, such as black pixels,
    /// count as zero.
    pub fn stats(&self) -> FilmStats {
        let n = self.mean.len().max(1) as f64;
        let mut mean = 0.0;
        let mut rel_var = 0.0;
        let mut rel_err = 0.0;
        for pixel in 0..self.mean.len() {
            mean += self.mean[pixel];
            let v = self.variance(pixel) / self.mean[pixel];
            if v.is_finite() {
                rel_var += v;
                rel_err += v / self.count[pixel] as f64;
            }
        }
        FilmStats {
            mean: mean / n,
            relative_variance: rel_var / n,
            relative_error: (rel_err / n).sqrt(),
        }
    }
}

impl AbstractFilm for EstimateFilm {
    /// The hero and secondary wavelengths are averaged. A path that dropped
    /// its secondaries carries the hero scaled up to match.
    fn add_sample(&mut self, pixel: usize, l: &SampledSpectrum, _lambda: &SampledWavelengths) {
        self.add(pixel, l.average());
    }

    fn reset(&mut self) {
        self.count.fill(0);
        self.mean.fill(0.0);
        self.m2.fill(0.0);
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn welford_matches_two_pass() {
        let values = [1.0, 4.0, 2.5, 0.5, 3.0];
        let mut film = EstimateFilm::new(1, 1);
        for v in values {
            film.add(0, v);
        }
        let mean = values.iter().sum::<Float>() as f64 / 5.0;
        let var = values.iter().map(|&v| (v as f64 - mean).powi(2)).sum::<f64>() / 4.0;
        assert_relative_eq!(film.mean(0), mean, epsilon = 1e-12);
        assert_relative_eq!(film.variance(0), var, epsilon = 1e-12);

        let stats = film.stats();
        assert_relative_eq!(stats.relative_variance, var / mean, epsilon = 1e-12);
        assert_relative_eq!(stats.relative_error, (var / mean / 5.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn reset_clears() {
        let mut film = EstimateFilm::new(2, 1);
        let lambda = SampledWavelengths::sample_visible(0.5);
        film.add_sample(1, &SampledSpectrum::from_const(2.0), &lambda);
        film.reset();
        assert_eq!(film.count(1), 0);
        assert_eq!(film.mean(1), 0.0);
        assert!(film.variance(1).is_infinite());
        // Black and single-sample pixels do not poison the average.
        assert_eq!(film.stats().relative_variance, 0.0);
    }
}
