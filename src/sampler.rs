use rand::{rngs::SmallRng, Rng, SeedableRng};

use crate::math::hashing::mix_bits;
use crate::math::sampling::ONE_MINUS_EPSILON;
use crate::math::*;

/// A stream of uniform numbers in `[0, 1)` for one path.
pub trait AbstractSampler {
    /// Restarts the stream for sample `sample_index` of work item `item`.
    fn start_sample(&mut self, item: u64, sample_index: u64);

    fn get_1d(&mut self) -> Float;

    fn get_2d(&mut self) -> Point2f;

    fn get_3d(&mut self) -> Point3f {
        let u = self.get_2d();
        Point3f::new(u.x, u.y, self.get_1d())
    }
}

/// Uncorrelated samples. The stream depends only on the seed, the work item
/// and the sample index, so a render repeats exactly.
#[derive(Debug, Clone)]
pub struct IndependentSampler {
    seed: u64,
    rng: SmallRng,
}

impl IndependentSampler {
    pub fn new(seed: u64) -> IndependentSampler {
        IndependentSampler { seed, rng: SmallRng::seed_from_u64(mix_bits(seed)) }
    }
}

impl AbstractSampler for IndependentSampler {
    fn start_sample(&mut self, item: u64, sample_index: u64) {
        let key = mix_bits(self.seed ^ mix_bits(item.wrapping_mul(0x9e37_79b9_7f4a_7c15) ^ sample_index));
        self.rng = SmallRng::seed_from_u64(key);
    }

    fn get_1d(&mut self) -> Float {
        self.rng.gen::<Float>().min(ONE_MINUS_EPSILON)
    }

    fn get_2d(&mut self) -> Point2f {
        Point2f::new(self.get_1d(), self.get_1d())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeats_per_sample() {
        let mut a = IndependentSampler::new(7);
        let mut b = IndependentSampler::new(7);
        a.start_sample(3, 11);
        b.start_sample(3, 11);
        for _ in 0..16 {
            assert_eq!(a.get_1d(), b.get_1d());
        }

        a.start_sample(3, 12);
        b.start_sample(4, 11);
        assert_ne!(a.get_2d(), b.get_2d());
    }

    #[test]
    fn stays_in_unit_interval() {
        let mut s = IndependentSampler::new(0);
        s.start_sample(0, 0);
        for _ in 0..10_000 {
            let u = s.get_1d();
            assert!((0.0..1.0).contains(&u));
        }
    }
}
