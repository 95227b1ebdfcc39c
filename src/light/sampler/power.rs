use crate::light::sampler::{sampling_path, AbstractLightSampler, SampledLight};
use crate::light::Lights;
use crate::math::*;
use crate::scene::LightId;

#[derive(Debug, Clone, Copy, PartialEq)]
struct AliasBucket {
    light: LightId,
    /// Probability of the bucket's own light
    pmf: Float,
    /// Threshold below which the bucket keeps its own light
    q: Float,
    alias: u32,
}

/// Chooses lights proportionally to their power with Walker's alias method.
/// Bucket `i` belongs to the light whose sampling path is `i`, so the
/// reverse lookup is a single index.
#[derive(Debug, Clone)]
pub struct PowerLightSampler {
    buckets: Vec<AliasBucket>,
}

impl PowerLightSampler {
    /// `lights` pairs each handle with its power, in sampling path order.
    /// All-zero power falls back to uniform selection.
    pub fn new(lights: &[(LightId, Float)]) -> PowerLightSampler {
        let n = lights.len();
        let total: Float = lights.iter().map(|&(_, p)| p.max(0.0)).sum();
        let pmf: Vec<Float> = if total > 0.0 {
            lights.iter().map(|&(_, p)| p.max(0.0) / total).collect()
        } else {
            vec![1.0 / n as Float; n]
        };

        let mut buckets: Vec<AliasBucket> = lights
            .iter()
            .zip(&pmf)
            .enumerate()
            .map(|(i, (&(light, _), &pmf))| AliasBucket { light, pmf, q: 1.0, alias: i as u32 })
            .collect();

        let mut scaled: Vec<Float> = pmf.iter().map(|p| p * n as Float).collect();
        let (mut under, mut over): (Vec<usize>, Vec<usize>) = (0..n).partition(|&i| scaled[i] < 1.0);

        while let (Some(&u), Some(&o)) = (under.last(), over.last()) {
            under.pop();
            over.pop();

            buckets[u].q = scaled[u];
            buckets[u].alias = o as u32;

            scaled[o] -= 1.0 - scaled[u];
            if scaled[o] < 1.0 {
                under.push(o);
            } else {
                over.push(o);
            }
        }

        // Whatever is left is within rounding of one.
        for i in under.into_iter().chain(over) {
            buckets[i].q = 1.0;
            buckets[i].alias = i as u32;
        }

        PowerLightSampler { buckets }
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

impl AbstractLightSampler for PowerLightSampler {
    fn sample(&self, u: Float) -> Option<SampledLight> {
        if self.buckets.is_empty() {
            return None;
        }

        let n = self.buckets.len();
        let scaled = u * n as Float;
        let idx = usize::min(scaled as usize, n - 1);
        let up = (scaled - idx as Float).min(1.0);

        let bucket = &self.buckets[idx];
        let chosen = if up < bucket.q { bucket } else { &self.buckets[bucket.alias as usize] };
        if chosen.pmf == 0.0 {
            return None;
        }

        Some(SampledLight { light: chosen.light, p: chosen.pmf })
    }

    fn pmf(&self, lights: &Lights, light: LightId) -> Float {
        sampling_path(lights, light)
            .and_then(|path| self.buckets.get(path))
            .filter(|b| b.light == light)
            .map_or(0.0, |b| b.pmf)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::scene::LightType;

    fn lights(powers: &[Float]) -> Vec<(LightId, Float)> {
        powers.iter().enumerate().map(|(i, &p)| (LightId::new(LightType::Area, i), p)).collect()
    }

    #[test]
    fn alias_table_reproduces_pmf() {
        let powers = [1.0, 5.0, 0.5, 3.5, 0.0, 10.0];
        let sampler = PowerLightSampler::new(&lights(&powers));
        let total: Float = powers.iter().sum();

        let n = 60_000;
        let mut counts = [0usize; 6];
        for i in 0..n {
            let s = sampler.sample((i as Float + 0.5) / n as Float).unwrap();
            assert_abs_diff_eq!(s.p, powers[s.light.idx()] / total, epsilon = 1e-6);
            counts[s.light.idx()] += 1;
        }
        for (i, &c) in counts.iter().enumerate() {
            assert_abs_diff_eq!(c as Float / n as Float, powers[i] / total, epsilon = 2e-3);
        }
        assert_eq!(counts[4], 0);

        let sum: Float = sampler.buckets.iter().map(|b| b.pmf).sum();
        assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn zero_power_is_uniform() {
        let sampler = PowerLightSampler::new(&lights(&[0.0, 0.0]));
        assert_eq!(sampler.sample(0.25).unwrap().p, 0.5);
        assert_eq!(sampler.sample(0.75).unwrap().light.idx(), 1);
    }

    #[test]
    fn empty_sampler() {
        let sampler = PowerLightSampler::new(&[]);
        assert!(sampler.sample(0.5).is_none());
    }
}
