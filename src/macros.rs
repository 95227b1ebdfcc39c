/// Expensive geometric sanity checks, compiled in only with the
/// `math-assert` feature.
#[cfg(feature = "math-assert")]
#[macro_export]
macro_rules! math_assert {
    ($($arg:tt)*) => { assert!($($arg)*); };
}

#[cfg(not(feature = "math-assert"))]
#[macro_export]
macro_rules! math_assert {
    ($($arg:tt)*) => {};
}

/// Declares a tagged handle: a `u32` whose top bits select a variant and
/// whose remaining bits index into that variant's dense array.
#[macro_export]
macro_rules! tagged_id {
    ($(#[$meta:meta])* $id:ident, $kind:ident, $bits:expr, { $($variant:ident = $val:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $kind {
            $($variant,)+
        }

        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $id(u32);

        impl $id {
            pub const TAG_BITS: u32 = $bits;
            pub const TAG_SHIFT: u32 = 32 - Self::TAG_BITS;
            pub const IDX_MASK: u32 = (1 << Self::TAG_SHIFT) - 1;

            pub fn new(ty: $kind, idx: usize) -> Self {
                assert!(
                    idx <= Self::IDX_MASK as usize,
                    "cannot exceed {} {:?} entries",
                    Self::IDX_MASK,
                    ty,
                );
                let tag = match ty {
                    $($kind::$variant => $val,)+
                };
                $id(idx as u32 | (tag << Self::TAG_SHIFT))
            }

            #[inline]
            pub fn ty(self) -> $kind {
                match self.0 >> Self::TAG_SHIFT {
                    $($val => $kind::$variant,)+
                    tag => unreachable!("invalid {} tag {}", stringify!($id), tag),
                }
            }

            #[inline]
            pub fn idx(self) -> usize {
                (self.0 & Self::IDX_MASK) as usize
            }

            #[inline]
            pub fn raw(self) -> u32 {
                self.0
            }
        }
    };
}
