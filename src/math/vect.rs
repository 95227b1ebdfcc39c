use std::ops::{Add, AddAssign, Div, DivAssign, Index, IndexMut, Mul, MulAssign, Neg, Sub, SubAssign};

use approx::AbsDiffEq;

use crate::math::*;

/// Dot product between the vector-like types, which may be mixed freely
/// (a `Vec3f` dotted with a `Normal3f`, for example).
pub trait Dot<Rhs = Self> {
    type Output;

    fn dot(self, rhs: Rhs) -> Self::Output;
}

macro_rules! decl_vect {
    ($name:ident; $($v:ident: $i:literal),+) => {
        #[derive(Debug, Clone, Copy, PartialEq, Default)]
        pub struct $name<T> {$(
            pub $v: T,
        )+}

        impl<T: Copy> $name<T> {
            #[inline]
            pub const fn new($($v: T),+) -> Self {
                Self {$($v,)+}
            }

            #[inline]
            pub const fn splat(v: T) -> Self {
                Self {$($v: v,)+}
            }

            #[inline]
            pub fn map<U, F: Fn(T) -> U>(self, f: F) -> $name<U> {
                $name::<U> {$(
                    $v: f(self.$v),
                )+}
            }
        }

        impl<T: Numeric> $name<T> {
            pub const ZERO: Self = Self::splat(T::ZERO);
            pub const ONE: Self = Self::splat(T::ONE);

            #[inline]
            pub fn min(self, rhs: Self) -> Self {
                Self {$($v: self.$v.nmin(rhs.$v),)+}
            }

            #[inline]
            pub fn max(self, rhs: Self) -> Self {
                Self {$($v: self.$v.nmax(rhs.$v),)+}
            }

            #[inline]
            pub fn min_element(self) -> T {
                let mut m = T::MAX;
                $(m = m.nmin(self.$v);)+
                m
            }

            #[inline]
            pub fn max_element(self) -> T {
                let mut m = T::MIN;
                $(m = m.nmax(self.$v);)+
                m
            }

            #[inline]
            pub fn abs(self) -> Self {
                Self {$($v: self.$v.nabs(),)+}
            }

            #[inline]
            pub fn length_squared(self) -> T {
                T::ZERO $(+ self.$v * self.$v)+
            }

            #[inline]
            pub fn length(self) -> T {
                self.length_squared().nsqrt()
            }

            #[inline]
            pub fn normalize(self) -> Self {
                self / self.length()
            }

            #[inline]
            pub fn is_normalized(self) -> bool {
                (self.length_squared() - T::ONE).nabs() <= T::EPSILON * T::TWO * T::TWO * T::TWO
            }
        }

        impl<T: Numeric + HasNan> $name<T> {
            #[inline]
            pub fn is_nan(self) -> bool {
                false $(|| self.$v.has_nan())+
            }

            #[inline]
            pub fn is_finite(self) -> bool {
                true $(&& self.$v.has_finite())+
            }
        }

        impl<T> Index<usize> for $name<T> {
            type Output = T;

            #[inline]
            fn index(&self, index: usize) -> &T {
                match index {
                    $($i => &self.$v,)+
                    _ => panic!("index {} out of range for {}", index, stringify!($name)),
                }
            }
        }

        impl<T> IndexMut<usize> for $name<T> {
            #[inline]
            fn index_mut(&mut self, index: usize) -> &mut T {
                match index {
                    $($i => &mut self.$v,)+
                    _ => panic!("index {} out of range for {}", index, stringify!($name)),
                }
            }
        }

        impl<T: Numeric> Neg for $name<T> {
            type Output = Self;

            #[inline]
            fn neg(self) -> Self {
                Self {$($v: -self.$v,)+}
            }
        }

        impl<T: Numeric> Mul<T> for $name<T> {
            type Output = Self;

            #[inline]
            fn mul(self, rhs: T) -> Self {
                Self {$($v: self.$v * rhs,)+}
            }
        }

        impl<T: Numeric> Div<T> for $name<T> {
            type Output = Self;

            #[inline]
            fn div(self, rhs: T) -> Self {
                let inv = T::ONE / rhs;
                Self {$($v: self.$v * inv,)+}
            }
        }

        impl<T: Numeric> MulAssign<T> for $name<T> {
            #[inline]
            fn mul_assign(&mut self, rhs: T) {
                $(self.$v = self.$v * rhs;)+
            }
        }

        impl<T: Numeric> DivAssign<T> for $name<T> {
            #[inline]
            fn div_assign(&mut self, rhs: T) {
                let inv = T::ONE / rhs;
                $(self.$v = self.$v * inv;)+
            }
        }

        impl Mul<$name<f32>> for f32 {
            type Output = $name<f32>;

            #[inline]
            fn mul(self, rhs: $name<f32>) -> $name<f32> {
                rhs * self
            }
        }

        impl Mul<$name<f64>> for f64 {
            type Output = $name<f64>;

            #[inline]
            fn mul(self, rhs: $name<f64>) -> $name<f64> {
                rhs * self
            }
        }

        impl<T: AbsDiffEq<Epsilon = T> + Copy> AbsDiffEq for $name<T> {
            type Epsilon = T;

            fn default_epsilon() -> T {
                T::default_epsilon()
            }

            fn abs_diff_eq(&self, other: &Self, epsilon: T) -> bool {
                $(self.$v.abs_diff_eq(&other.$v, epsilon))&&+
            }
        }
    };
}

/// `$lhs op $rhs -> $out`, componentwise.
macro_rules! impl_op {
    ($trait:ident, $func:ident, $op:tt; $lhs:ident, $rhs:ident -> $out:ident; $($v:ident),+) => {
        impl<T: Numeric> $trait<$rhs<T>> for $lhs<T> {
            type Output = $out<T>;

            #[inline]
            fn $func(self, rhs: $rhs<T>) -> $out<T> {
                $out {$($v: self.$v $op rhs.$v,)+}
            }
        }
    };
}

macro_rules! impl_op_assign {
    ($trait:ident, $func:ident, $op:tt; $lhs:ident, $rhs:ident; $($v:ident),+) => {
        impl<T: Numeric> $trait<$rhs<T>> for $lhs<T> {
            #[inline]
            fn $func(&mut self, rhs: $rhs<T>) {
                $(self.$v = self.$v $op rhs.$v;)+
            }
        }
    };
}

macro_rules! impl_dot {
    ($lhs:ident, $rhs:ident; $($v:ident),+) => {
        impl<T: Numeric> Dot<$rhs<T>> for $lhs<T> {
            type Output = T;

            #[inline]
            fn dot(self, rhs: $rhs<T>) -> T {
                T::ZERO $(+ self.$v * rhs.$v)+
            }
        }
    };
}

macro_rules! impl_from {
    ($from:ident -> $to:ident; $($v:ident),+) => {
        impl<T> From<$from<T>> for $to<T> {
            #[inline]
            fn from(value: $from<T>) -> Self {
                Self {$($v: value.$v,)+}
            }
        }
    };
}

decl_vect!(TVec2; x: 0, y: 1);
decl_vect!(TPoint2; x: 0, y: 1);
decl_vect!(TVec3; x: 0, y: 1, z: 2);
decl_vect!(TPoint3; x: 0, y: 1, z: 2);
decl_vect!(TNormal3; x: 0, y: 1, z: 2);

impl_op!(Add, add, +; TVec2, TVec2 -> TVec2; x, y);
impl_op!(Sub, sub, -; TVec2, TVec2 -> TVec2; x, y);
impl_op!(Add, add, +; TPoint2, TVec2 -> TPoint2; x, y);
impl_op!(Add, add, +; TPoint2, TPoint2 -> TPoint2; x, y);
impl_op!(Sub, sub, -; TPoint2, TPoint2 -> TVec2; x, y);
impl_op!(Sub, sub, -; TPoint2, TVec2 -> TPoint2; x, y);

impl_op!(Add, add, +; TVec3, TVec3 -> TVec3; x, y, z);
impl_op!(Sub, sub, -; TVec3, TVec3 -> TVec3; x, y, z);
impl_op!(Add, add, +; TPoint3, TVec3 -> TPoint3; x, y, z);
impl_op!(Add, add, +; TPoint3, TPoint3 -> TPoint3; x, y, z);
impl_op!(Sub, sub, -; TPoint3, TPoint3 -> TVec3; x, y, z);
impl_op!(Sub, sub, -; TPoint3, TVec3 -> TPoint3; x, y, z);
impl_op!(Add, add, +; TNormal3, TNormal3 -> TNormal3; x, y, z);
impl_op!(Sub, sub, -; TNormal3, TNormal3 -> TNormal3; x, y, z);
impl_op!(Add, add, +; TVec3, TNormal3 -> TVec3; x, y, z);

impl_op_assign!(AddAssign, add_assign, +; TVec2, TVec2; x, y);
impl_op_assign!(AddAssign, add_assign, +; TVec3, TVec3; x, y, z);
impl_op_assign!(SubAssign, sub_assign, -; TVec3, TVec3; x, y, z);
impl_op_assign!(AddAssign, add_assign, +; TPoint3, TVec3; x, y, z);
impl_op_assign!(AddAssign, add_assign, +; TNormal3, TNormal3; x, y, z);

impl_dot!(TVec2, TVec2; x, y);
impl_dot!(TVec3, TVec3; x, y, z);
impl_dot!(TVec3, TNormal3; x, y, z);
impl_dot!(TNormal3, TVec3; x, y, z);
impl_dot!(TNormal3, TNormal3; x, y, z);

impl_from!(TVec3 -> TNormal3; x, y, z);
impl_from!(TNormal3 -> TVec3; x, y, z);
impl_from!(TPoint3 -> TVec3; x, y, z);
impl_from!(TVec3 -> TPoint3; x, y, z);
impl_from!(TPoint2 -> TVec2; x, y);
impl_from!(TVec2 -> TPoint2; x, y);

impl<T: Numeric> TVec3<T> {
    #[inline]
    pub fn cross(self, rhs: Self) -> Self {
        Self {
            x: difference_of_products(self.y, rhs.z, self.z, rhs.y),
            y: difference_of_products(self.z, rhs.x, self.x, rhs.z),
            z: difference_of_products(self.x, rhs.y, self.y, rhs.x),
        }
    }

    #[inline]
    pub fn max_element_index(self) -> usize {
        if self.x > self.y {
            if self.x > self.z { 0 } else { 2 }
        } else if self.y > self.z {
            1
        } else {
            2
        }
    }

    #[inline]
    pub fn permute(self, p: [usize; 3]) -> Self {
        Self::new(self[p[0]], self[p[1]], self[p[2]])
    }

    /// Flips `self` into the hemisphere of `v`.
    #[inline]
    pub fn facing(self, v: TVec3<T>) -> Self {
        if self.dot(v) < T::ZERO { -self } else { self }
    }

    /// Two unit vectors completing an orthonormal basis with `self`
    /// (Duff et al. 2017).
    #[inline]
    pub fn local_basis(self) -> (Self, Self) {
        let sign = if self.z >= T::ZERO { T::ONE } else { -T::ONE };
        let a = -T::ONE / (sign + self.z);
        let b = self.x * self.y * a;
        (
            Self::new(T::ONE + sign * self.x * self.x * a, sign * b, -sign * self.x),
            Self::new(b, sign + self.y * self.y * a, -self.y),
        )
    }
}

impl<T: Numeric> TNormal3<T> {
    #[inline]
    pub fn facing(self, v: TVec3<T>) -> Self {
        if self.dot(v) < T::ZERO { -self } else { self }
    }
}

impl<T: Numeric> TPoint3<T> {
    #[inline]
    pub fn permute(self, p: [usize; 3]) -> Self {
        Self::new(self[p[0]], self[p[1]], self[p[2]])
    }

    #[inline]
    pub fn distance(self, rhs: Self) -> T {
        (self - rhs).length()
    }

    #[inline]
    pub fn distance_squared(self, rhs: Self) -> T {
        (self - rhs).length_squared()
    }
}

pub type Vec2f = TVec2<Float>;
pub type Point2f = TPoint2<Float>;
pub type Vec3f = TVec3<Float>;
pub type Point3f = TPoint3<Float>;
pub type Normal3f = TNormal3<Float>;
