use std::ops::{Add, Div, Mul, Neg, Sub};

/// The scalar operations the vector types are generic over.
pub trait Numeric:
    Clone
    + Copy
    + PartialOrd
    + PartialEq
    + Add<Self, Output = Self>
    + Sub<Self, Output = Self>
    + Mul<Self, Output = Self>
    + Div<Self, Output = Self>
    + Neg<Output = Self>
    + Sized
{
    const MIN: Self;
    const MAX: Self;

    const ZERO: Self;
    const ONE: Self;
    const TWO: Self;
    const HALF: Self;
    const EPSILON: Self;

    fn nmin(self, rhs: Self) -> Self;
    fn nmax(self, rhs: Self) -> Self;
    fn nabs(self) -> Self;
    fn nsqrt(self) -> Self;
    fn nfma(self, a: Self, b: Self) -> Self;
}

pub trait HasNan {
    fn has_nan(&self) -> bool;
    fn has_finite(&self) -> bool;
}

macro_rules! impl_numeric {
    ($($ty:ident),* $(,)?) => {
        $(
            impl Numeric for $ty {
                const MIN: $ty = $ty::MIN;
                const MAX: $ty = $ty::MAX;

                const ZERO: $ty = 0.0;
                const ONE: $ty = 1.0;
                const TWO: $ty = 2.0;
                const HALF: $ty = 0.5;
                const EPSILON: $ty = $ty::EPSILON;

                #[inline]
                fn nmin(self, rhs: Self) -> Self {
                    self.min(rhs)
                }

                #[inline]
                fn nmax(self, rhs: Self) -> Self {
                    self.max(rhs)
                }

                #[inline]
                fn nabs(self) -> Self {
                    self.abs()
                }

                #[inline]
                fn nsqrt(self) -> Self {
                    self.sqrt()
                }

                #[inline]
                fn nfma(self, a: Self, b: Self) -> Self {
                    self.mul_add(a, b)
                }
            }

            impl HasNan for $ty {
                fn has_nan(&self) -> bool {
                    self.is_nan()
                }

                fn has_finite(&self) -> bool {
                    self.is_finite()
                }
            }

            impl<const N: usize> HasNan for [$ty; N] {
                fn has_nan(&self) -> bool {
                    self.iter().any(|v| v.is_nan())
                }

                fn has_finite(&self) -> bool {
                    self.iter().all(|v| v.is_finite())
                }
            }
        )*
    };
}

impl_numeric!(f32, f64);
