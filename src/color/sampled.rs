use std::ops::{Deref, Index, IndexMut};

use auto_ops::{impl_op_ex, impl_op_ex_commutative};

use crate::math::*;

/// Number of wavelengths carried by a path: one hero plus three secondaries.
pub const NUM_SPECTRUM_SAMPLES: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct SampledSpectrum {
    pub values: [Float; NUM_SPECTRUM_SAMPLES],
}

impl SampledSpectrum {
    #[inline]
    pub const fn new(values: [Float; NUM_SPECTRUM_SAMPLES]) -> SampledSpectrum {
        SampledSpectrum { values }
    }

    #[inline]
    pub const fn from_const(c: Float) -> SampledSpectrum {
        SampledSpectrum { values: [c; NUM_SPECTRUM_SAMPLES] }
    }

    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|x| *x == 0.0)
    }

    pub fn has_nan(&self) -> bool {
        self.values.has_nan()
    }

    pub fn safe_div(&self, other: &SampledSpectrum) -> SampledSpectrum {
        let mut result = [0.0; NUM_SPECTRUM_SAMPLES];
        for (i, res) in result.iter_mut().enumerate() {
            *res = if other[i] != 0.0 { self[i] / other[i] } else { 0.0 };
        }
        debug_assert!(!result.has_nan());
        SampledSpectrum::new(result)
    }

    pub fn clamp_zero(&self) -> SampledSpectrum {
        SampledSpectrum::new(self.values.map(|v| v.max(0.0)))
    }

    pub fn sqrt(&self) -> SampledSpectrum {
        SampledSpectrum::new(self.values.map(safe::sqrt))
    }

    pub fn lerp(&self, other: &SampledSpectrum, t: Float) -> SampledSpectrum {
        (1.0 - t) * self + t * other
    }

    pub fn average(&self) -> Float {
        self.values.iter().sum::<Float>() / NUM_SPECTRUM_SAMPLES as Float
    }

    pub fn min_component_value(&self) -> Float {
        debug_assert!(!self.values.has_nan());
        self.values.iter().fold(Float::INFINITY, |a, &b| a.min(b))
    }

    pub fn max_component_value(&self) -> Float {
        debug_assert!(!self.values.has_nan());
        self.values.iter().fold(Float::NEG_INFINITY, |a, &b| a.max(b))
    }

    /// Keeps only the hero channel, scaled by the number of channels so the
    /// estimate stays unbiased once the secondaries are dropped.
    pub fn collapse_to_hero(&self) -> SampledSpectrum {
        let mut result = [0.0; NUM_SPECTRUM_SAMPLES];
        result[0] = self.values[0] * NUM_SPECTRUM_SAMPLES as Float;
        SampledSpectrum::new(result)
    }
}

impl Index<usize> for SampledSpectrum {
    type Output = Float;

    fn index(&self, index: usize) -> &Self::Output {
        self.values.index(index)
    }
}

impl IndexMut<usize> for SampledSpectrum {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        self.values.index_mut(index)
    }
}

// Lets callers iterate the channels directly.
impl Deref for SampledSpectrum {
    type Target = [Float; NUM_SPECTRUM_SAMPLES];

    fn deref(&self) -> &Self::Target {
        &self.values
    }
}

impl_op_ex!(+ |s1: &SampledSpectrum, s2: &SampledSpectrum| -> SampledSpectrum {
    let mut result = [0.0; NUM_SPECTRUM_SAMPLES];
    for i in 0..NUM_SPECTRUM_SAMPLES {
        result[i] = s1[i] + s2[i];
    }
    debug_assert!(!result.has_nan());
    SampledSpectrum::new(result)
});

impl_op_ex!(- |s1: &SampledSpectrum, s2: &SampledSpectrum| -> SampledSpectrum {
    let mut result = [0.0; NUM_SPECTRUM_SAMPLES];
    for i in 0..NUM_SPECTRUM_SAMPLES {
        result[i] = s1[i] - s2[i];
    }
    debug_assert!(!result.has_nan());
    SampledSpectrum::new(result)
});

impl_op_ex!(* |s1: &SampledSpectrum, s2: &SampledSpectrum| -> SampledSpectrum {
    let mut result = [0.0; NUM_SPECTRUM_SAMPLES];
    for i in 0..NUM_SPECTRUM_SAMPLES {
        result[i] = s1[i] * s2[i];
    }
    debug_assert!(!result.has_nan());
    SampledSpectrum::new(result)
});

impl_op_ex_commutative!(* |s: &SampledSpectrum, v: &Float| -> SampledSpectrum {
    let mut result = [0.0; NUM_SPECTRUM_SAMPLES];
    for i in 0..NUM_SPECTRUM_SAMPLES {
        result[i] = s[i] * v;
    }
    debug_assert!(!result.has_nan());
    SampledSpectrum::new(result)
});

impl_op_ex!(/ |s: &SampledSpectrum, v: &Float| -> SampledSpectrum {
    debug_assert!(*v != 0.0);
    debug_assert!(!v.is_nan());
    let mut result = [0.0; NUM_SPECTRUM_SAMPLES];
    for i in 0..NUM_SPECTRUM_SAMPLES {
        result[i] = s[i] / v;
    }
    debug_assert!(!result.has_nan());
    SampledSpectrum::new(result)
});

impl_op_ex!(/ |s1: &SampledSpectrum, s2: &SampledSpectrum| -> SampledSpectrum {
    let mut result = [0.0; NUM_SPECTRUM_SAMPLES];
    for i in 0..NUM_SPECTRUM_SAMPLES {
        result[i] = s1[i] / s2[i];
    }
    debug_assert!(!result.has_nan());
    SampledSpectrum::new(result)
});

impl_op_ex!(+= |s1: &mut SampledSpectrum, s2: &SampledSpectrum| {
    for i in 0..NUM_SPECTRUM_SAMPLES {
        s1[i] += s2[i];
    }
});

impl_op_ex!(*= |s1: &mut SampledSpectrum, s2: &SampledSpectrum| {
    for i in 0..NUM_SPECTRUM_SAMPLES {
        s1[i] *= s2[i];
    }
});

impl_op_ex!(*= |s: &mut SampledSpectrum, v: &Float| {
    for i in 0..NUM_SPECTRUM_SAMPLES {
        s[i] *= v;
    }
});

impl_op_ex!(/= |s: &mut SampledSpectrum, v: &Float| {
    for i in 0..NUM_SPECTRUM_SAMPLES {
        s[i] /= v;
    }
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic() {
        let a = SampledSpectrum::new([1.0, 2.0, 3.0, 4.0]);
        let b = SampledSpectrum::from_const(2.0);
        assert_eq!((a * b).values, [2.0, 4.0, 6.0, 8.0]);
        assert_eq!((2.0 * a).values, (a * 2.0).values);
        assert_eq!(a.average(), 2.5);
        assert_eq!(a.max_component_value(), 4.0);
        assert_eq!(a.min_component_value(), 1.0);
        assert_eq!(a.safe_div(&SampledSpectrum::new([1.0, 0.0, 3.0, 0.0])).values, [1.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn hero_collapse_preserves_average() {
        let a = SampledSpectrum::from_const(0.75);
        let collapsed = a.collapse_to_hero();
        assert_eq!(collapsed.values, [3.0, 0.0, 0.0, 0.0]);
        assert_eq!(collapsed.average(), a.average());
    }
}
