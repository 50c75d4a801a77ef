//! Floating point types that log density results can be stored in.

use std::fmt::Debug;

/// The declared numeric type of a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RealKind {
    F32,
    F64,
}

mod private {
    pub trait Sealed {}

    impl Sealed for f32 {}
    impl Sealed for f64 {}
}

/// A floating point type, implemented for `f32` and `f64`.
pub trait Real:
    private::Sealed + Copy + Debug + PartialEq + PartialOrd + Send + Sync + 'static
{
    const NEG_INFINITY: Self;
    const NAN: Self;
    const KIND: RealKind;

    fn is_finite(self) -> bool;
    fn to_f64(self) -> f64;
}

impl Real for f32 {
    const NEG_INFINITY: Self = f32::NEG_INFINITY;
    const NAN: Self = f32::NAN;
    const KIND: RealKind = RealKind::F32;

    #[inline]
    fn is_finite(self) -> bool {
        f32::is_finite(self)
    }

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl Real for f64 {
    const NEG_INFINITY: Self = f64::NEG_INFINITY;
    const NAN: Self = f64::NAN;
    const KIND: RealKind = RealKind::F64;

    #[inline]
    fn is_finite(self) -> bool {
        f64::is_finite(self)
    }

    #[inline]
    fn to_f64(self) -> f64 {
        self
    }
}

/// The common numeric type of `Self` and `Rhs`.
///
/// Integers combined with integers promote to `f64`, integers combined with
/// a float promote to that float and `f32` combined with `f64` promotes to
/// `f64`.
pub trait Promote<Rhs> {
    type Output: Real;

    fn promote_lhs(self) -> Self::Output;
    fn promote_rhs(rhs: Rhs) -> Self::Output;
}

macro_rules! impl_promote {
    ($($lhs:ty, $rhs:ty => $out:ty;)*) => {
        $(
            impl Promote<$rhs> for $lhs {
                type Output = $out;

                #[inline]
                fn promote_lhs(self) -> $out {
                    self as $out
                }

                #[inline]
                fn promote_rhs(rhs: $rhs) -> $out {
                    rhs as $out
                }
            }
        )*
    };
}

impl_promote! {
    f64, f64 => f64;
    f64, f32 => f64;
    f64, i32 => f64;
    f64, i64 => f64;
    f32, f64 => f64;
    f32, f32 => f32;
    f32, i32 => f32;
    f32, i64 => f32;
    i32, f64 => f64;
    i32, f32 => f32;
    i32, i32 => f64;
    i32, i64 => f64;
    i64, f64 => f64;
    i64, f32 => f32;
    i64, i32 => f64;
    i64, i64 => f64;
}
