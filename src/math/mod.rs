pub mod bounds;
pub mod frame;
pub mod hashing;
pub mod numeric;
pub mod ray;
pub mod sampling;
pub mod scattering;
pub mod sphere;
pub mod transform;
pub mod vect;

pub use bounds::Bounds3f;
pub use frame::Frame;
pub use numeric::{HasNan, Numeric};
pub use ray::Ray;
pub use sphere::*;
pub use transform::{Mat4, Transform};
pub use vect::*;

pub type Float = f32;

pub const PI: Float = std::f32::consts::PI;
pub const TAU: Float = std::f32::consts::TAU;
pub const FRAC_1_PI: Float = std::f32::consts::FRAC_1_PI;
pub const FRAC_1_4PI: Float = 0.079_577_47;
pub const FRAC_PI_2: Float = std::f32::consts::FRAC_PI_2;
pub const FRAC_PI_4: Float = std::f32::consts::FRAC_PI_4;

pub const MACHINE_EPSILON: Float = Float::EPSILON * 0.5;

#[inline]
pub fn lerp(a: Float, b: Float, t: Float) -> Float {
    (1.0 - t) * a + t * b
}

#[inline]
pub fn sqr<T: Numeric>(x: T) -> T {
    x * x
}

/// Conservative bound on the relative error of `n` chained float operations.
#[inline]
pub fn gamma(n: i32) -> Float {
    (n as Float * MACHINE_EPSILON) / (1.0 - n as Float * MACHINE_EPSILON)
}

/// `a * b - c * d` with the rounding error of the products recovered by FMA.
#[inline]
pub fn difference_of_products<T: Numeric>(a: T, b: T, c: T, d: T) -> T {
    let cd = c * d;
    let dop = a.nfma(b, -cd);
    let err = (-c).nfma(d, cd);
    dop + err
}

#[inline]
pub fn next_float_up(v: Float) -> Float {
    if v.is_infinite() && v > 0.0 {
        return v;
    }
    let v = if v == -0.0 { 0.0 } else { v };
    let bits = v.to_bits();
    let bits = if v >= 0.0 { bits + 1 } else { bits - 1 };
    Float::from_bits(bits)
}

#[inline]
pub fn next_float_down(v: Float) -> Float {
    if v.is_infinite() && v < 0.0 {
        return v;
    }
    let v = if v == 0.0 { -0.0 } else { v };
    let bits = v.to_bits();
    let bits = if v > 0.0 { bits - 1 } else { bits + 1 };
    Float::from_bits(bits)
}

/// Largest index `i` in `[0, size - 2]` for which `pred(i)` holds, assuming
/// `pred` is true up to some point and false after it.
pub fn find_interval<P: Fn(usize) -> bool>(size: usize, pred: P) -> usize {
    let mut first = 1;
    let mut len = size as isize - 2;
    while len > 0 {
        let half = len >> 1;
        let middle = first + half as usize;
        if pred(middle) {
            first = middle + 1;
            len -= half + 1;
        } else {
            len = half;
        }
    }
    (first - 1).clamp(0, size.saturating_sub(2))
}

pub mod safe {
    use crate::math::{Float, Numeric};

    #[inline]
    pub fn sqrt<T: Numeric>(x: T) -> T {
        x.nmax(T::ZERO).nsqrt()
    }

    #[inline]
    pub fn asin(x: Float) -> Float {
        x.clamp(-1.0, 1.0).asin()
    }

    #[inline]
    pub fn acos(x: Float) -> Float {
        x.clamp(-1.0, 1.0).acos()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_interval_brackets() {
        let cdf = [0.0, 0.25, 0.5, 0.75, 1.0];
        assert_eq!(find_interval(cdf.len(), |i| cdf[i] <= 0.3), 1);
        assert_eq!(find_interval(cdf.len(), |i| cdf[i] <= 0.0), 0);
        assert_eq!(find_interval(cdf.len(), |i| cdf[i] <= 1.0), 3);
    }

    #[test]
    fn next_float() {
        assert!(next_float_up(1.0) > 1.0);
        assert!(next_float_down(1.0) < 1.0);
        assert!(next_float_up(0.0) > 0.0);
        assert!(next_float_down(0.0) < 0.0);
    }
}
